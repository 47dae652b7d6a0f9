//! Dashboard core: submission, the displayed job, and the history list.
//!
//! All state a front end renders is reachable through
//! [`Dashboard::snapshot`]. The history list and the displayed job are
//! always locked in the same order (history first, then the poller), so a
//! delete that touches both is observed as a single update.

pub mod history;
pub mod submission;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{MediaResolver, Video, VideoApi};
use crate::broadcast::{PollEvent, PollEventKind, ProgressBroadcaster};
use crate::config::Settings;
use crate::error::{FacelessError, Result};
use crate::library::{Library, LibraryEntry, LibraryStore};
use crate::poller::{PollController, PollState};

use submission::SubmitGuard;

pub use history::{Confirm, DeleteOutcome};

/// Everything a front end needs to render the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub poll: PollState,
    pub history: Vec<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Default)]
struct ViewState {
    history: Vec<Video>,
    error: Option<String>,
    /// Ids deleted through this dashboard. Late completions and list
    /// responses must not bring them back.
    deleted: HashSet<String>,
}

fn lock(view: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    match view.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Dashboard view lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

pub struct Dashboard {
    api: Arc<dyn VideoApi>,
    poller: PollController,
    broadcaster: ProgressBroadcaster,
    media: MediaResolver,
    library: Library<Arc<dyn LibraryStore>>,
    duration_bounds: (u32, u32),
    view: Mutex<ViewState>,
    submitting: AtomicBool,
}

impl Dashboard {
    pub fn new(api: Arc<dyn VideoApi>, settings: &Settings, store: Arc<dyn LibraryStore>) -> Self {
        Self::with_broadcaster(api, settings, store, ProgressBroadcaster::default())
    }

    pub fn with_broadcaster(
        api: Arc<dyn VideoApi>,
        settings: &Settings,
        store: Arc<dyn LibraryStore>,
        broadcaster: ProgressBroadcaster,
    ) -> Self {
        let poller =
            PollController::from_settings(Arc::clone(&api), broadcaster.clone(), settings);

        Self {
            api,
            poller,
            broadcaster,
            media: MediaResolver::new(&settings.api_base_url),
            library: Library::new(store),
            duration_bounds: settings.duration_bounds(),
            view: Mutex::new(ViewState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn media(&self) -> &MediaResolver {
        &self.media
    }

    pub fn poller(&self) -> &PollController {
        &self.poller
    }

    pub fn library(&self) -> &Library<Arc<dyn LibraryStore>> {
        &self.library
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.broadcaster.subscribe()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let view = lock(&self.view);
        DashboardSnapshot {
            poll: self.poller.state(),
            history: view.history.clone(),
            error: view.error.clone(),
            submitting: self.is_submitting(),
        }
    }

    /// Last error surfaced to the user, if any.
    pub fn error(&self) -> Option<String> {
        lock(&self.view).error.clone()
    }

    fn set_error(&self, message: String) {
        lock(&self.view).error = Some(message);
    }

    /// Validates and submits a new video, then starts polling it.
    ///
    /// Invalid input and concurrent submissions fail without any request.
    /// On creation failure the error is recorded and no job is displayed.
    pub async fn submit(&self, topic: &str, duration: u32) -> Result<Video> {
        let request = match submission::validate(topic, duration, self.duration_bounds) {
            Ok(request) => request,
            Err(e) => {
                self.set_error(e.to_string());
                return Err(e.into());
            }
        };

        let _guard =
            SubmitGuard::acquire(&self.submitting).ok_or(FacelessError::SubmissionInProgress)?;

        self.poller.reset();
        lock(&self.view).error = None;

        match self.api.create_video(&request).await {
            Ok(video) => {
                info!("Submitted video {} for topic '{}'", video.id, video.topic);
                self.poller.start(video.clone());
                Ok(video)
            }
            Err(e) => {
                error!("Failed to create video: {}", e);
                self.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Fetches an existing job and starts polling it if it is still running.
    pub async fn watch(&self, id: &str) -> Result<Video> {
        let video = self.api.get_video(id).await?;
        self.poller.start(video.clone());
        Ok(video)
    }

    /// Single status fetch without touching the display.
    pub async fn status(&self, id: &str) -> Result<Video> {
        Ok(self.api.get_video(id).await?)
    }

    /// Stops polling because the consumer is going away.
    pub fn teardown(&self) {
        if self.poller.cancel() {
            info!("Dashboard torn down while polling");
        }
    }

    /// Remembers a finished video in the local library.
    ///
    /// Returns `false` without touching the library if the video was
    /// deleted through this dashboard.
    pub fn record_in_library(&self, video: &Video) -> Result<bool> {
        let view = lock(&self.view);
        if view.deleted.contains(&video.id) {
            debug!("Not recording deleted video {}", video.id);
            return Ok(false);
        }
        self.library
            .add(LibraryEntry::from_video(video, &self.media))
            .map_err(FacelessError::from)?;
        Ok(true)
    }

    /// Keeps history and library in step with poll results.
    ///
    /// When a watched job completes, the library records it and the history
    /// list is refreshed from the backend. The task holds only a weak
    /// reference and ends once the dashboard is dropped.
    pub fn spawn_history_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let dashboard = Arc::downgrade(self);
        let mut rx = self.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.kind == PollEventKind::Completed => {
                        let Some(dashboard) = dashboard.upgrade() else {
                            break;
                        };
                        if let Some(video) = &event.video {
                            if let Err(e) = dashboard.record_in_library(video) {
                                error!("Failed to record video {} in library: {}", video.id, e);
                            }
                        }
                        if let Err(e) = dashboard.refresh_history().await {
                            warn!("Failed to refresh history after completion: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("History sync lagged, missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Dashboard dropped, stopping history sync");
                        break;
                    }
                }
            }
        })
    }
}
