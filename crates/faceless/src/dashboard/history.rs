//! History list and confirmed deletion.

use serde::Serialize;
use tracing::{error, info, warn};

use super::{lock, Dashboard};
use crate::api::Video;
use crate::error::Result;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this video?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent.
    Declined,
    Deleted {
        /// Whether the deleted job was on display and got cleared.
        cleared_display: bool,
    },
}

impl Dashboard {
    /// Current history list, in backend order.
    pub fn history(&self) -> Vec<Video> {
        lock(&self.view).history.clone()
    }

    /// Replaces the history list with the backend's. On failure the
    /// previous list stays in place.
    pub async fn refresh_history(&self) -> Result<Vec<Video>> {
        match self.api.list_videos().await {
            Ok(mut videos) => {
                let mut view = lock(&self.view);
                videos.retain(|video| !view.deleted.contains(&video.id));
                info!("Loaded {} videos", videos.len());
                view.history = videos.clone();
                Ok(videos)
            }
            Err(e) => {
                error!("Error loading videos: {}", e);
                Err(e.into())
            }
        }
    }

    /// Deletes a job after confirmation.
    ///
    /// On success the job leaves the history list and the library and, if it
    /// was displayed, the display is cleared, all under one lock. The id is
    /// remembered so later completions or list responses cannot restore it.
    /// On failure the list is left unchanged and the error is recorded.
    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT) {
            info!("Deletion of video {} declined", id);
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(e) = self.api.delete_video(id).await {
            error!("Failed to delete video {}: {}", id, e);
            self.set_error(e.to_string());
            return Err(e.into());
        }

        let cleared_display = {
            let mut view = lock(&self.view);
            view.deleted.insert(id.to_string());
            view.history.retain(|video| video.id != id);
            if let Err(e) = self.library.remove(id) {
                warn!("Failed to remove video {} from library: {}", id, e);
            }
            self.poller.clear_if(id)
        };

        Ok(DeleteOutcome::Deleted { cleared_display })
    }
}
