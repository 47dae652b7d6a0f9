pub mod api;
pub mod broadcast;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod library;
pub mod poller;

pub use api::{HttpVideoApi, MediaResolver, Video, VideoApi, VideoStatus};
pub use broadcast::{PollEvent, PollEventKind, ProgressBroadcaster};
pub use config::{load_settings, Settings};
pub use dashboard::{Confirm, Dashboard, DashboardSnapshot, DeleteOutcome};
pub use error::{ApiError, ConfigError, FacelessError, LibraryError, Result, ValidationError};
pub use library::{JsonFileStore, Library, LibraryEntry, LibraryStore, MemoryStore};
pub use poller::{AbandonReason, FailurePolicy, PollController, PollState};
