use serde::Serialize;

use crate::api::Video;

/// Observable state of a [`PollController`](super::PollController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollState {
    /// No job is displayed.
    Idle,
    /// A job is being polled; holds the latest projection.
    Polling(Video),
    /// The backend reported `completed` or `failed`.
    Terminal(Video),
    /// Polling stopped before a terminal status was observed.
    Abandoned {
        job_id: String,
        reason: AbandonReason,
    },
}

impl PollState {
    pub fn name(&self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Polling(_) => "polling",
            PollState::Terminal(_) => "terminal",
            PollState::Abandoned { .. } => "abandoned",
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            PollState::Idle => None,
            PollState::Polling(video) | PollState::Terminal(video) => Some(&video.id),
            PollState::Abandoned { job_id, .. } => Some(job_id),
        }
    }

    /// The projection currently on display, if any.
    pub fn video(&self) -> Option<&Video> {
        match self {
            PollState::Polling(video) | PollState::Terminal(video) => Some(video),
            _ => None,
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, PollState::Polling(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Terminal(_))
    }
}

/// Why a session stopped without a terminal observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbandonReason {
    /// The backend no longer knows the job.
    NotFound,
    /// The failure budget of [`FailurePolicy::SurfaceAfter`] ran out.
    TooManyFailures { failures: u32, last_error: String },
}

impl std::fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbandonReason::NotFound => write!(f, "Video no longer exists on the server"),
            AbandonReason::TooManyFailures {
                failures,
                last_error,
            } => write!(
                f,
                "Gave up after {} consecutive failed polls: {}",
                failures, last_error
            ),
        }
    }
}

/// What to do with consecutive failed poll ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Skip failed ticks forever; only teardown or a terminal status stops polling.
    #[default]
    Unbounded,
    /// Abandon the session once this many ticks in a row have failed.
    SurfaceAfter(u32),
}

impl FailurePolicy {
    pub fn is_exhausted(&self, consecutive_failures: u32) -> bool {
        match self {
            FailurePolicy::Unbounded => false,
            FailurePolicy::SurfaceAfter(limit) => consecutive_failures >= (*limit).max(1),
        }
    }
}
