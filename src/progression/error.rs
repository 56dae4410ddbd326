//! Error types for status progression verification.

use std::time::Duration;

use thiserror::Error;

use crate::poll::WindowError;

/// Raised when a progression is configured with unusable parameters.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigurationError {
    /// Raised by `add_state` when a stage's timing is invalid.
    #[error("invalid stage for status '{expected_status}': {source}")]
    InvalidStage {
        /// Status the rejected stage would have waited for.
        expected_status: String,
        /// Underlying timing problem.
        #[source]
        source: WindowError,
    },
    /// Raised by `start` when no stage was added.
    #[error("no stages configured for {subject_type} {subject_id}")]
    NoStages {
        /// Kind of resource being watched.
        subject_type: String,
        /// Identifier of the watched resource.
        subject_id: String,
    },
}

/// Why a single stage did not observe its expected status.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StageFailure {
    /// The stage deadline passed without a matching status.
    #[error(
        "timed out after {polls} polls (last observed status: {})",
        .last_observed.as_deref().unwrap_or("none")
    )]
    TimedOut {
        /// Number of polls made in the stage.
        polls: u32,
        /// Last status returned before the deadline, if any poll succeeded.
        last_observed: Option<String>,
    },
    /// Too many consecutive polls failed.
    #[error("{failures} consecutive status polls failed, last error: {last_error}")]
    RetriesExhausted {
        /// Consecutive failed polls when the stage gave up.
        failures: u32,
        /// Message of the final poll error.
        last_error: String,
    },
    /// The subject entered a status registered as terminal.
    #[error("entered terminal status '{status}'")]
    Aborted {
        /// Terminal status that was observed.
        status: String,
    },
}

/// Surfaced when a required stage is not observed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error(
    "{subject_type} {subject_id} did not reach status '{expected_status}' \
     within {elapsed:?}: {kind}"
)]
pub struct VerificationFailure {
    /// Kind of resource being watched.
    pub subject_type: String,
    /// Identifier of the watched resource.
    pub subject_id: String,
    /// Status the failing stage waited for.
    pub expected_status: String,
    /// Zero-based position of the failing stage.
    pub stage_index: usize,
    /// Wall-clock time spent in the failing stage.
    pub elapsed: Duration,
    /// Why the stage failed.
    pub kind: StageFailure,
}

/// Errors returned by `StatusProgressionVerifier::start`.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProgressionError {
    /// The progression was configured incorrectly.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A required stage was not observed.
    #[error(transparent)]
    Verification(Box<VerificationFailure>),
}

impl From<VerificationFailure> for ProgressionError {
    fn from(value: VerificationFailure) -> Self {
        Self::Verification(Box::new(value))
    }
}

impl ProgressionError {
    /// Returns the verification failure when this error carries one.
    #[must_use]
    pub fn as_verification(&self) -> Option<&VerificationFailure> {
        match self {
            Self::Verification(failure) => Some(failure.as_ref()),
            Self::Configuration(_) => None,
        }
    }
}
