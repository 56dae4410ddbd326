//! Multi-stage status progression verifier.
//!
//! A [`StatusProgressionVerifier`] watches one subject (a volume, a snapshot,
//! a server) and asserts that its polled status passes through an ordered
//! list of stages, each with its own timeout, poll interval and retry budget.
//! Typical use is `creating` (optional, short) followed by `available`
//! (required, size dependent).
//!
//! Polling is coarse: a status that appears and disappears between two polls
//! is never seen. Waiting on transient statuses such as `deleting` is
//! therefore unreliable, and such stages should be marked optional or avoided.

mod error;

use std::fmt::Display;
use std::marker::PhantomData;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::poll::{PollOutcome, PollWindow, Probe, poll_until};

pub use error::{ConfigurationError, ProgressionError, StageFailure, VerificationFailure};

/// One expected status within a progression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stage<S> {
    expected_status: S,
    window: PollWindow,
    optional: bool,
}

impl<S> Stage<S> {
    /// Status this stage waits for.
    #[must_use]
    pub const fn expected_status(&self) -> &S {
        &self.expected_status
    }

    /// Timing and retry parameters of the stage.
    #[must_use]
    pub const fn window(&self) -> &PollWindow {
        &self.window
    }

    /// Whether the progression continues when this stage is not observed.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Verifies that a subject's status moves through an ordered set of stages.
///
/// `status_fn` is called with the subject id on every poll. It may fail; a
/// failure counts against the current stage's retry budget rather than
/// ending the verification outright.
///
/// The verifier is built for one wait: stages are added, then [`start`]
/// consumes it and blocks the calling thread until every stage has been
/// observed, skipped, or a required stage fails.
///
/// [`start`]: StatusProgressionVerifier::start
pub struct StatusProgressionVerifier<S, E, F> {
    subject_type: String,
    subject_id: String,
    status_fn: F,
    stages: Vec<Stage<S>>,
    abort_statuses: Vec<S>,
    error: PhantomData<fn() -> E>,
}

impl<S, E, F> StatusProgressionVerifier<S, E, F> {
    /// Creates a verifier with no stages.
    #[must_use]
    pub fn new(subject_type: impl Into<String>, subject_id: impl Into<String>, status_fn: F) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            status_fn,
            stages: Vec::new(),
            abort_statuses: Vec::new(),
            error: PhantomData,
        }
    }

    /// Kind of resource being watched.
    #[must_use]
    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    /// Identifier of the watched resource.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Stages added so far, in evaluation order.
    #[must_use]
    pub fn stages(&self) -> &[Stage<S>] {
        &self.stages
    }

    /// Registers a status that ends the current stage immediately, such as
    /// `error` during a build. An optional stage that sees it is skipped like
    /// any other unobserved optional stage; the next stage then polls afresh.
    ///
    /// Statuses are compared exactly.
    pub fn abort_on(&mut self, status: S) -> &mut Self {
        self.abort_statuses.push(status);
        self
    }
}

impl<S: Display, E, F> StatusProgressionVerifier<S, E, F> {
    /// Appends a stage to the progression.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidStage`] when `timeout` or
    /// `poll_interval` is zero.
    pub fn add_state(
        &mut self,
        expected_status: S,
        timeout: Duration,
        poll_interval: Duration,
        retry_count: u32,
        optional: bool,
    ) -> Result<&mut Self, ConfigurationError> {
        let window = PollWindow::new(timeout, poll_interval, retry_count).map_err(|source| {
            ConfigurationError::InvalidStage {
                expected_status: expected_status.to_string(),
                source,
            }
        })?;
        self.stages.push(Stage {
            expected_status,
            window,
            optional,
        });
        Ok(self)
    }
}

impl<S, E, F> StatusProgressionVerifier<S, E, F>
where
    S: PartialEq + Display,
    E: Display,
    F: FnMut(&str) -> Result<S, E>,
{
    /// Runs every stage in order on the calling thread.
    ///
    /// Optional stages that are not observed are logged and skipped. The
    /// first required stage that times out, exhausts its retry budget, or
    /// sees a terminal status ends the run.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::Configuration`] when no stages were added
    /// and [`ProgressionError::Verification`] when a required stage fails.
    pub fn start(mut self) -> Result<(), ProgressionError> {
        if self.stages.is_empty() {
            return Err(ConfigurationError::NoStages {
                subject_type: self.subject_type,
                subject_id: self.subject_id,
            }
            .into());
        }

        let stages = std::mem::take(&mut self.stages);
        for (stage_index, stage) in stages.iter().enumerate() {
            debug!(
                subject_type = %self.subject_type,
                subject_id = %self.subject_id,
                expected_status = %stage.expected_status,
                timeout = ?stage.window.timeout(),
                "waiting for status"
            );
            let outcome = self.observe(stage);
            let elapsed = outcome.elapsed();
            let kind = match outcome {
                PollOutcome::Ready { polls, .. } => {
                    info!(
                        subject_type = %self.subject_type,
                        subject_id = %self.subject_id,
                        expected_status = %stage.expected_status,
                        polls,
                        ?elapsed,
                        "expected status observed"
                    );
                    continue;
                }
                PollOutcome::TimedOut {
                    polls,
                    last_observed,
                    ..
                } => StageFailure::TimedOut {
                    polls,
                    last_observed,
                },
                PollOutcome::Failed {
                    consecutive_failures,
                    last_error,
                    ..
                } => StageFailure::RetriesExhausted {
                    failures: consecutive_failures,
                    last_error,
                },
                PollOutcome::Aborted { reason, .. } => StageFailure::Aborted { status: reason },
            };

            if stage.optional {
                warn!(
                    subject_type = %self.subject_type,
                    subject_id = %self.subject_id,
                    expected_status = %stage.expected_status,
                    ?elapsed,
                    reason = %kind,
                    "optional status not observed, continuing"
                );
                continue;
            }

            let failure = VerificationFailure {
                subject_type: self.subject_type,
                subject_id: self.subject_id,
                expected_status: stage.expected_status.to_string(),
                stage_index,
                elapsed,
                kind,
            };
            warn!(error = %failure, "status progression failed");
            return Err(failure.into());
        }
        Ok(())
    }

    fn observe(&mut self, stage: &Stage<S>) -> PollOutcome<()> {
        let subject_id = self.subject_id.as_str();
        let abort_statuses = &self.abort_statuses;
        let status_fn = &mut self.status_fn;
        poll_until(&stage.window, || {
            status_fn(subject_id).map(|status| {
                if status == stage.expected_status {
                    Probe::Done(())
                } else if abort_statuses.contains(&status) {
                    Probe::Abort(status.to_string())
                } else {
                    Probe::Pending(status.to_string())
                }
            })
        })
    }
}
