//! Poll progress broadcaster for real-time job status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::{Video, VideoStatus};

/// What happened to a watched job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PollEventKind {
    /// Polling began for a freshly created or re-watched job.
    Started,
    /// A non-terminal projection was observed.
    Progress,
    Completed,
    Failed,
    /// A single poll tick failed; polling continues.
    PollError,
    /// Polling stopped without a terminal observation.
    Abandoned,
    /// The watch was torn down.
    Cancelled,
}

impl PollEventKind {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PollEventKind::Completed
                | PollEventKind::Failed
                | PollEventKind::Abandoned
                | PollEventKind::Cancelled
        )
    }
}

/// Progress event for a watched job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollEvent {
    /// Job identifier.
    pub job_id: String,
    pub kind: PollEventKind,
    /// Latest projection, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    /// Human-readable message describing the event.
    pub message: String,
    /// Timestamp of this event.
    pub timestamp: DateTime<Utc>,
}

impl PollEvent {
    /// Creates an event from an observed projection.
    pub fn observed(video: &Video) -> Self {
        let kind = match video.status {
            VideoStatus::Completed => PollEventKind::Completed,
            VideoStatus::Failed => PollEventKind::Failed,
            _ => PollEventKind::Progress,
        };
        let message = match (&video.status, &video.error_message) {
            (VideoStatus::Failed, Some(reason)) => format!("Failed: {}", reason),
            (status, _) => format!("{} ({}%)", status.label(), video.progress),
        };

        Self {
            job_id: video.id.clone(),
            kind,
            video: Some(video.clone()),
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn started(video: &Video) -> Self {
        Self {
            job_id: video.id.clone(),
            kind: PollEventKind::Started,
            video: Some(video.clone()),
            message: format!("Watching video '{}'", video.topic),
            timestamp: Utc::now(),
        }
    }

    pub fn poll_error(job_id: &str, consecutive: u32, error: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind: PollEventKind::PollError,
            video: None,
            message: format!("Poll failed ({} in a row): {}", consecutive, error),
            timestamp: Utc::now(),
        }
    }

    pub fn abandoned(job_id: &str, reason: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind: PollEventKind::Abandoned,
            video: None,
            message: reason.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn cancelled(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind: PollEventKind::Cancelled,
            video: None,
            message: "Stopped watching".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts poll events to any number of subscribers.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    sender: Arc<broadcast::Sender<PollEvent>>,
}

impl ProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: PollEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.sender.subscribe()
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
