//! Local validation and the single-flight guard for job submission.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::CreateVideoRequest;
use crate::error::ValidationError;

/// Checks a submission before any network call is made.
///
/// The topic is trimmed; the duration must lie within `bounds` (inclusive).
pub fn validate(
    topic: &str,
    duration: u32,
    bounds: (u32, u32),
) -> Result<CreateVideoRequest, ValidationError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ValidationError::EmptyTopic);
    }

    let (min, max) = bounds;
    if !(min..=max).contains(&duration) {
        return Err(ValidationError::DurationOutOfRange { duration, min, max });
    }

    Ok(CreateVideoRequest {
        topic: topic.to_string(),
        duration,
    })
}

/// Holds the "creation in flight" flag for as long as it lives.
pub(crate) struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmitGuard<'a> {
    /// Claims the flag, or returns `None` if a submission is already running.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
