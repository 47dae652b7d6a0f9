use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poller::FailurePolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Client settings, loaded from an optional JSON file and the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the video API, e.g. `http://localhost:8000/api`.
    pub api_base_url: String,
    /// Seconds between two status polls of an active job.
    pub poll_interval_secs: u64,
    /// Upper bound for a single API request.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Consecutive transient poll failures tolerated before polling is
    /// abandoned. Unset means poll until the job finishes or the watch is
    /// torn down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_consecutive_poll_failures: Option<u32>,
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
    pub default_duration_secs: u32,
    /// Where the local library is kept. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_secs: 3,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_consecutive_poll_failures: None,
            min_duration_secs: 30,
            max_duration_secs: 180,
            default_duration_secs: 60,
            library_path: None,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self.max_consecutive_poll_failures {
            Some(limit) => FailurePolicy::SurfaceAfter(limit),
            None => FailurePolicy::Unbounded,
        }
    }

    /// Inclusive range of accepted video durations in seconds.
    pub fn duration_bounds(&self) -> (u32, u32) {
        (self.min_duration_secs, self.max_duration_secs)
    }

    /// Configured library path, or `<data dir>/faceless/library.json`.
    pub fn resolved_library_path(&self) -> Option<PathBuf> {
        self.library_path.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join("faceless").join("library.json"))
        })
    }
}
