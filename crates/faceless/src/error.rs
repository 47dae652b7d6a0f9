use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacelessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("A video submission is already in progress")]
    SubmissionInProgress,

    #[error("Video {id} did not finish: {reason}")]
    Unfinished { id: String, reason: String },

    #[error("I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures talking to the video backend.
///
/// A poll that hits [`ApiError::NotFound`] stops; any other error only
/// skips that tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend refused to create the job.
    #[error("Video creation rejected ({status}): {message}")]
    CreationRejected { status: u16, message: String },

    /// No job with this id exists (any more).
    #[error("Video not found: {0}")]
    NotFound(String),

    /// Any other non-2xx client error.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network failure, timeout or server-side error.
    #[error("Transient API failure: {0}")]
    Transient(String),

    /// The response body did not match the expected shape.
    #[error("Failed to decode API response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Duration {duration}s is outside the allowed range {min}-{max}s")]
    DurationOutOfRange { duration: u32, min: u32, max: u32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Library I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize library: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Library lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, FacelessError>;
