//! Broadcasting of poll progress for real-time rendering.
//!
//! Any front end (the terminal dashboard, a test) can subscribe and render
//! job progress without holding a reference to the poller.

pub mod progress;

pub use progress::{PollEvent, PollEventKind, ProgressBroadcaster};
