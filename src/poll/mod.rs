//! Deadline-bounded polling shared by every wait in the crate.
//!
//! A [`PollWindow`] describes a single wait: how long it may last, how often
//! the probe runs, and how many consecutive probe failures are tolerated.
//! [`poll_until`] drives a probe against that window and reports a tagged
//! [`PollOutcome`] instead of relying on loop fallthrough.

use std::fmt::Display;
use std::thread::sleep;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// Errors raised when a polling window is constructed with unusable timing.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum WindowError {
    /// Raised when the window would expire before the first poll.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    /// Raised when the poll interval would busy-spin.
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

/// Timing and retry parameters for one polling window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollWindow {
    timeout: Duration,
    interval: Duration,
    retry_budget: u32,
}

impl PollWindow {
    /// Creates a window, rejecting zero timeouts and zero intervals.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::ZeroTimeout`] or [`WindowError::ZeroInterval`]
    /// when the corresponding duration is zero.
    pub const fn new(
        timeout: Duration,
        interval: Duration,
        retry_budget: u32,
    ) -> Result<Self, WindowError> {
        if timeout.is_zero() {
            return Err(WindowError::ZeroTimeout);
        }
        if interval.is_zero() {
            return Err(WindowError::ZeroInterval);
        }
        Ok(Self {
            timeout,
            interval,
            retry_budget,
        })
    }

    /// Maximum wall-clock time spent in this window.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between consecutive polls.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Consecutive failed polls tolerated before the window fails.
    #[must_use]
    pub const fn retry_budget(&self) -> u32 {
        self.retry_budget
    }
}

/// Result of a single successful probe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Probe<T> {
    /// The awaited condition holds; polling stops with this value.
    Done(T),
    /// The condition does not hold yet. Carries what was observed so that a
    /// timeout can report it.
    Pending(String),
    /// The subject reached a state from which the condition can never hold.
    Abort(String),
}

/// Tagged result of [`poll_until`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PollOutcome<T> {
    /// The probe reported [`Probe::Done`].
    Ready {
        /// Value carried by the final probe.
        value: T,
        /// Number of probe calls made, including the final one.
        polls: u32,
        /// Time spent in the window.
        elapsed: Duration,
    },
    /// The window expired without the condition holding.
    TimedOut {
        /// Number of probe calls made.
        polls: u32,
        /// Time spent in the window.
        elapsed: Duration,
        /// The last pending observation, if any probe succeeded.
        last_observed: Option<String>,
    },
    /// More consecutive probes failed than the retry budget allows.
    Failed {
        /// Number of consecutive failures when the window gave up.
        consecutive_failures: u32,
        /// Time spent in the window.
        elapsed: Duration,
        /// Message of the final probe error.
        last_error: String,
    },
    /// The probe reported [`Probe::Abort`].
    Aborted {
        /// Reason reported by the probe.
        reason: String,
        /// Time spent in the window.
        elapsed: Duration,
    },
}

impl<T> PollOutcome<T> {
    /// Time spent in the window regardless of how it ended.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Ready { elapsed, .. }
            | Self::TimedOut { elapsed, .. }
            | Self::Failed { elapsed, .. }
            | Self::Aborted { elapsed, .. } => *elapsed,
        }
    }
}

/// Runs `probe` until it reports [`Probe::Done`] or [`Probe::Abort`], the
/// window's timeout elapses, or the retry budget is exhausted.
///
/// The deadline is fixed when the call starts and checked at the top of every
/// iteration, so the total time is bounded by the window timeout plus the
/// duration of the final probe. Sleeps are clipped to the time remaining, so
/// the probe runs at most `ceil(timeout / interval)` times.
///
/// A probe error counts as a transient failure. Failures are logged at debug
/// level and only surface once more than `retry_budget` of them occur in a
/// row; any successful probe resets the count.
#[must_use]
pub fn poll_until<T, E, F>(window: &PollWindow, mut probe: F) -> PollOutcome<T>
where
    E: Display,
    F: FnMut() -> Result<Probe<T>, E>,
{
    let started = Instant::now();
    let mut polls: u32 = 0;
    let mut consecutive_failures: u32 = 0;
    let mut last_observed = None;

    while started.elapsed() < window.timeout {
        polls = polls.saturating_add(1);
        match probe() {
            Ok(Probe::Done(value)) => {
                return PollOutcome::Ready {
                    value,
                    polls,
                    elapsed: started.elapsed(),
                };
            }
            Ok(Probe::Abort(reason)) => {
                return PollOutcome::Aborted {
                    reason,
                    elapsed: started.elapsed(),
                };
            }
            Ok(Probe::Pending(observed)) => {
                consecutive_failures = 0;
                last_observed = Some(observed);
            }
            Err(err) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                debug!(
                    poll = polls,
                    consecutive_failures,
                    retry_budget = window.retry_budget,
                    error = %err,
                    "poll attempt failed"
                );
                if consecutive_failures > window.retry_budget {
                    return PollOutcome::Failed {
                        consecutive_failures,
                        elapsed: started.elapsed(),
                        last_error: err.to_string(),
                    };
                }
            }
        }

        let remaining = window.timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        sleep(window.interval.min(remaining));
    }

    PollOutcome::TimedOut {
        polls,
        elapsed: started.elapsed(),
        last_observed,
    }
}
