//! Wire types for the video job API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a video job as reported by the backend.
///
/// The named phases between `Pending` and the terminal states are
/// sub-phases of processing. Unknown phase names sent by a newer backend
/// deserialize as [`VideoStatus::Processing`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Pending,
    GeneratingScript,
    GeneratingVoice,
    FetchingClips,
    Rendering,
    Completed,
    Failed,
    #[serde(other)]
    Processing,
}

/// The five-step ladder shown while a video is being produced.
pub const PROGRESS_STEPS: [VideoStatus; 5] = [
    VideoStatus::GeneratingScript,
    VideoStatus::GeneratingVoice,
    VideoStatus::FetchingClips,
    VideoStatus::Rendering,
    VideoStatus::Completed,
];

impl VideoStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }

    /// Position in the forward-only lifecycle. Both terminal states share
    /// the highest rank.
    pub fn rank(&self) -> u8 {
        match self {
            VideoStatus::Pending => 0,
            VideoStatus::Processing => 1,
            VideoStatus::GeneratingScript => 2,
            VideoStatus::GeneratingVoice => 3,
            VideoStatus::FetchingClips => 4,
            VideoStatus::Rendering => 5,
            VideoStatus::Completed | VideoStatus::Failed => 6,
        }
    }

    /// Index into [`PROGRESS_STEPS`], if this status is one of the steps.
    pub fn step_index(&self) -> Option<usize> {
        PROGRESS_STEPS.iter().position(|step| step == self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::GeneratingScript => "generating_script",
            VideoStatus::GeneratingVoice => "generating_voice",
            VideoStatus::FetchingClips => "fetching_clips",
            VideoStatus::Rendering => "rendering",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "Pending",
            VideoStatus::Processing => "Processing...",
            VideoStatus::GeneratingScript => "Generating Script",
            VideoStatus::GeneratingVoice => "Generating Voice",
            VideoStatus::FetchingClips => "Fetching Clips",
            VideoStatus::Rendering => "Rendering Video",
            VideoStatus::Completed => "Completed",
            VideoStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Read-only projection of a backend video job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Video {
    /// Backend-assigned identifier.
    pub id: String,
    /// Topic the video was requested for.
    pub topic: String,
    pub status: VideoStatus,
    /// Percentage in `[0, 100]`.
    #[serde(default, deserialize_with = "progress::deserialize")]
    pub progress: u8,
    /// Generated narration; may arrive before the video completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Backend-provided reason when the job failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Video {
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies the projection invariants: a completed job reports 100%.
    pub fn normalized(mut self) -> Self {
        if self.status == VideoStatus::Completed {
            self.progress = 100;
        }
        self
    }
}

/// Body of `POST /videos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateVideoRequest {
    pub topic: String,
    pub duration: u32,
}

/// Body of `GET /videos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListResponse {
    pub videos: Vec<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

mod progress {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
        Ok(raw.clamp(0, 100) as u8)
    }
}

/// The backend emits naive ISO-8601 timestamps (no offset) which are UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw))),
            None => Ok(None),
        }
    }
}
