use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::state::{AbandonReason, FailurePolicy, PollState};
use crate::api::http::DEFAULT_REQUEST_TIMEOUT;
use crate::api::{Video, VideoApi};
use crate::broadcast::{PollEvent, ProgressBroadcaster};
use crate::config::Settings;
use crate::error::ApiError;

struct Inner {
    state: PollState,
    /// Bumped on every start and teardown. A session only acts while its
    /// generation is current.
    generation: u64,
    session: Option<JoinHandle<()>>,
}

impl Inner {
    fn stop_session(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.session.take() {
            handle.abort();
        }
    }
}

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Poll state lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Everything a session task needs, detached from the controller itself.
#[derive(Clone)]
struct SessionContext {
    api: Arc<dyn VideoApi>,
    broadcaster: ProgressBroadcaster,
    shared: Arc<Mutex<Inner>>,
    interval: Duration,
    request_timeout: Duration,
    policy: FailurePolicy,
}

/// Drives one job at a time from its initial projection to a terminal state.
///
/// Must be used from within a Tokio runtime; sessions run as spawned tasks.
/// Dropping the controller tears down any active session.
pub struct PollController {
    api: Arc<dyn VideoApi>,
    broadcaster: ProgressBroadcaster,
    shared: Arc<Mutex<Inner>>,
    interval: Duration,
    request_timeout: Duration,
    policy: FailurePolicy,
}

impl PollController {
    /// Creates an idle controller polling every `interval`.
    pub fn new(api: Arc<dyn VideoApi>, broadcaster: ProgressBroadcaster, interval: Duration) -> Self {
        Self {
            api,
            broadcaster,
            shared: Arc::new(Mutex::new(Inner {
                state: PollState::Idle,
                generation: 0,
                session: None,
            })),
            interval,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            policy: FailurePolicy::default(),
        }
    }

    pub fn from_settings(
        api: Arc<dyn VideoApi>,
        broadcaster: ProgressBroadcaster,
        settings: &Settings,
    ) -> Self {
        Self::new(api, broadcaster, settings.poll_interval())
            .with_request_timeout(settings.request_timeout())
            .with_failure_policy(settings.failure_policy())
    }

    /// Bounds each status fetch; expiry counts as a transient failure.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState {
        lock(&self.shared).state.clone()
    }

    /// The projection currently on display, if any.
    pub fn current_video(&self) -> Option<Video> {
        lock(&self.shared).state.video().cloned()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.shared).state.is_polling()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PollEvent> {
        self.broadcaster.subscribe()
    }

    /// Starts watching `video`, replacing whatever was displayed before.
    ///
    /// Any previous session is torn down first. An already-terminal
    /// projection goes straight to [`PollState::Terminal`] without polling.
    pub fn start(&self, video: Video) {
        let video = video.normalized();
        let mut inner = lock(&self.shared);
        inner.stop_session();

        if video.is_finished() {
            info!("Video {} is already {}", video.id, video.status.as_str());
            inner.state = PollState::Terminal(video.clone());
            self.broadcaster.send(PollEvent::observed(&video));
            return;
        }

        info!(
            "Polling video {} every {:?} (status: {})",
            video.id,
            self.interval,
            video.status.as_str()
        );
        inner.state = PollState::Polling(video.clone());
        self.broadcaster.send(PollEvent::started(&video));

        let ctx = SessionContext {
            api: Arc::clone(&self.api),
            broadcaster: self.broadcaster.clone(),
            shared: Arc::clone(&self.shared),
            interval: self.interval,
            request_timeout: self.request_timeout,
            policy: self.policy,
        };
        let generation = inner.generation;
        inner.session = Some(tokio::spawn(run_session(ctx, generation, video.id)));
    }

    /// Tears down the active session, leaving the display idle.
    ///
    /// Idempotent. Returns `true` if a session was actually running.
    /// A terminal or abandoned result stays on display.
    pub fn cancel(&self) -> bool {
        let mut inner = lock(&self.shared);
        inner.stop_session();

        if let PollState::Polling(video) = &inner.state {
            info!("Stopped polling video {}", video.id);
            self.broadcaster.send(PollEvent::cancelled(&video.id));
            inner.state = PollState::Idle;
            true
        } else {
            false
        }
    }

    /// Tears down any session and clears the display if it shows `job_id`.
    ///
    /// Returns `true` if the display was cleared.
    pub fn clear_if(&self, job_id: &str) -> bool {
        let mut inner = lock(&self.shared);
        if inner.state.job_id() != Some(job_id) {
            return false;
        }

        let was_polling = inner.state.is_polling();
        inner.stop_session();
        inner.state = PollState::Idle;
        if was_polling {
            self.broadcaster.send(PollEvent::cancelled(job_id));
        }
        debug!("Cleared display of video {}", job_id);
        true
    }

    /// Tears down any session and clears the display unconditionally.
    pub fn reset(&self) {
        let mut inner = lock(&self.shared);
        inner.stop_session();
        if let PollState::Polling(video) = &inner.state {
            self.broadcaster.send(PollEvent::cancelled(&video.id));
        }
        inner.state = PollState::Idle;
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        lock(&self.shared).stop_session();
    }
}

async fn run_session(ctx: SessionContext, generation: u64, job_id: String) {
    let mut ticker = tokio::time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures: u32 = 0;

    loop {
        ticker.tick().await;

        if lock(&ctx.shared).generation != generation {
            break;
        }

        debug!("Polling status of video {}", job_id);
        let result = match tokio::time::timeout(ctx.request_timeout, ctx.api.get_video(&job_id)).await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Transient(format!(
                "Status request timed out after {:?}",
                ctx.request_timeout
            ))),
        };

        if apply(&ctx, generation, &job_id, result, &mut failures).is_break() {
            break;
        }
    }
}

/// Applies one poll result under the state lock.
fn apply(
    ctx: &SessionContext,
    generation: u64,
    job_id: &str,
    result: Result<Video, ApiError>,
    failures: &mut u32,
) -> ControlFlow<()> {
    let mut inner = lock(&ctx.shared);
    if inner.generation != generation {
        return ControlFlow::Break(());
    }

    match result {
        Ok(fetched) => {
            *failures = 0;
            let next = match &inner.state {
                PollState::Polling(held) => advance(held, fetched),
                _ => return ControlFlow::Break(()),
            };

            ctx.broadcaster.send(PollEvent::observed(&next));

            if next.is_finished() {
                match next.error_message.as_deref() {
                    Some(reason) => info!(
                        "Video {} finished as {}: {}",
                        job_id,
                        next.status.as_str(),
                        reason
                    ),
                    None => info!("Video {} finished as {}", job_id, next.status.as_str()),
                }
                inner.state = PollState::Terminal(next);
                inner.session = None;
                return ControlFlow::Break(());
            }

            inner.state = PollState::Polling(next);
            ControlFlow::Continue(())
        }
        Err(ApiError::NotFound(_)) => {
            warn!("Video {} disappeared while polling", job_id);
            let reason = AbandonReason::NotFound;
            ctx.broadcaster
                .send(PollEvent::abandoned(job_id, &reason.to_string()));
            inner.state = PollState::Abandoned {
                job_id: job_id.to_string(),
                reason,
            };
            inner.session = None;
            ControlFlow::Break(())
        }
        Err(err) => {
            *failures += 1;
            warn!(
                "Poll of video {} failed ({} in a row), retrying next tick: {}",
                job_id, failures, err
            );
            ctx.broadcaster
                .send(PollEvent::poll_error(job_id, *failures, &err.to_string()));

            if ctx.policy.is_exhausted(*failures) {
                let reason = AbandonReason::TooManyFailures {
                    failures: *failures,
                    last_error: err.to_string(),
                };
                error!("Stopped polling video {}: {}", job_id, reason);
                ctx.broadcaster
                    .send(PollEvent::abandoned(job_id, &reason.to_string()));
                inner.state = PollState::Abandoned {
                    job_id: job_id.to_string(),
                    reason,
                };
                inner.session = None;
                return ControlFlow::Break(());
            }

            ControlFlow::Continue(())
        }
    }
}

/// Merges a fetched projection into the held one without moving backwards.
///
/// Polls may skip phases, but an out-of-order response must not make the
/// display regress in status or progress.
fn advance(held: &Video, fetched: Video) -> Video {
    let mut next = fetched.normalized();

    if next.status.rank() < held.status.rank() {
        warn!(
            "Video {} reported {} after {}, keeping {}",
            next.id,
            next.status.as_str(),
            held.status.as_str(),
            held.status.as_str()
        );
        next.status = held.status;
    }

    if !next.status.is_terminal() && next.progress < held.progress {
        next.progress = held.progress;
    }

    if next.script.is_none() {
        next.script = held.script.clone();
    }

    next
}
