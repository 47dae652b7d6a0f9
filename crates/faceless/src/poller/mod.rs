//! Poll-until-terminal controller for video jobs.
//!
//! One [`PollController`] owns at most one polling session at a time. A
//! session fetches the job projection on a fixed interval until the backend
//! reports a terminal status, the job disappears, or the session is torn
//! down. Teardown is enforced by a generation counter checked under the
//! state lock, so a stale session can never mutate state or publish events.

pub mod controller;
pub mod state;

pub use controller::PollController;
pub use state::{AbandonReason, FailurePolicy, PollState};
