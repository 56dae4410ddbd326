//! Error types for lifecycle behaviours.

use thiserror::Error;

use crate::config::ConfigError;
use crate::poll::WindowError;
use crate::progression::{ConfigurationError, ProgressionError};

/// Errors raised by [`super::Lifecycle`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LifecycleError {
    /// Raised when the lifecycle configuration fails validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Wrapper for client level failures.
    #[error("{operation} request failed: {message}")]
    Client {
        /// Client operation that failed.
        operation: &'static str,
        /// Message returned by the client.
        message: String,
    },
    /// Raised when a status is requested for a resource that does not exist.
    #[error("{kind} {id} does not exist")]
    Gone {
        /// Resource kind label.
        kind: String,
        /// Provider identifier.
        id: String,
    },
    /// Raised when a wait window is configured with unusable timing.
    #[error("invalid wait window for {kind} {id}: {source}")]
    Window {
        /// Resource kind label.
        kind: String,
        /// Provider identifier.
        id: String,
        /// Underlying timing problem.
        #[source]
        source: WindowError,
    },
    /// Raised when a status progression fails.
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    /// Raised when a deletion could not be confirmed.
    #[error("unable to confirm deletion of {kind} {id}: {reason}")]
    DeleteUnconfirmed {
        /// Resource kind label.
        kind: String,
        /// Provider identifier.
        id: String,
        /// Why the confirmation failed.
        reason: String,
    },
    /// Raised when every build attempt failed.
    #[error("failed to build a {kind} after {attempts} attempts: {}", .failures.join("; "))]
    RequiredResource {
        /// Resource kind label.
        kind: String,
        /// Number of attempts made.
        attempts: u32,
        /// Failure message of each attempt, in order.
        failures: Vec<String>,
    },
    /// Raised when resources remain registered after a sweep.
    #[error("{kind} resources remain after sweep: {}", .remaining.join(", "))]
    NotClean {
        /// Resource kind label.
        kind: String,
        /// Ids whose deletion could not be confirmed.
        remaining: Vec<String>,
    },
}

impl From<ConfigurationError> for LifecycleError {
    fn from(value: ConfigurationError) -> Self {
        Self::Progression(value.into())
    }
}

impl LifecycleError {
    pub(super) fn client(operation: &'static str, err: &impl std::error::Error) -> Self {
        Self::Client {
            operation,
            message: err.to_string(),
        }
    }
}
