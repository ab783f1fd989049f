//! Fixed-interval status polling.
//!
//! [`poll_loop`] owns the timer and cancellation; the caller supplies the
//! per-tick work. Exactly one tick runs at a time: the next tick is not
//! started until the previous one has finished, and ticks missed while a
//! slow request was outstanding are skipped rather than fired in a burst.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};

/// Timer parameters for a polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay before the first poll and between subsequent polls.
    pub interval: Duration,
    /// Maximum number of ticks. `None` polls until a terminal outcome.
    pub max_attempts: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

impl From<&ClientConfig> for PollSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        }
    }
}

/// What a single tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Keep polling.
    Continue,
    /// A terminal status was handled (or the job went away); stop.
    Finished,
}

/// Why [`poll_loop`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// A tick returned [`PollOutcome::Finished`].
    Finished,
    /// The cancellation token fired.
    Cancelled,
    /// `max_attempts` ticks ran without a terminal outcome.
    Exhausted { attempts: u32 },
}

/// Run `tick` every `settings.interval` until it reports
/// [`PollOutcome::Finished`], `cancel` fires, or the attempt budget runs
/// out.
///
/// The first tick fires one interval after the call, not immediately.
/// `tick` receives the 1-based attempt number. Cancellation is checked
/// before each tick and while a tick is in flight; an in-flight tick is
/// dropped when the token fires.
pub async fn poll_loop<F, Fut>(
    settings: PollSettings,
    cancel: &CancellationToken,
    mut tick: F,
) -> PollExit
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PollOutcome>,
{
    let mut ticker =
        tokio::time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollExit::Cancelled,
            _ = ticker.tick() => {}
        }

        attempt += 1;
        tracing::trace!(attempt, "Poll tick");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollExit::Cancelled,
            outcome = tick(attempt) => outcome,
        };

        if outcome == PollOutcome::Finished {
            return PollExit::Finished;
        }

        // The last allowed check gives up straight away, not one interval later.
        if settings.max_attempts.is_some_and(|max| attempt >= max) {
            tracing::warn!(attempts = attempt, "Poll budget exhausted");
            return PollExit::Exhausted { attempts: attempt };
        }
    }
}
