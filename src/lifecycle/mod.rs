//! Generic lifecycle behaviours built on the progression verifier.
//!
//! A [`Lifecycle`] pairs a [`ResourceClient`] with a [`ResourceKind`] and a
//! [`LifecycleConfig`] and offers the composite actions tests need:
//! create-and-wait-until-ready, wait-for-status, delete-and-confirm (alone or
//! after a resource's dependents), and a sweep of everything a session
//! registered.

mod client;
mod create;
mod delete;
mod error;

use std::time::Duration;

use crate::config::LifecycleConfig;
use crate::progression::StatusProgressionVerifier;

pub use client::{DeleteAck, ResourceClient, StatusReading};
pub use delete::{CascadeSummary, SweepSummary};
pub use error::LifecycleError;

/// Status vocabulary of one kind of resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceKind {
    label: String,
    transitional_status: String,
    ready_status: String,
    error_status: Option<String>,
}

impl ResourceKind {
    /// Describes a kind that passes through `transitional_status` on its way
    /// to `ready_status` (for example `creating` then `available`).
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        transitional_status: impl Into<String>,
        ready_status: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            transitional_status: transitional_status.into(),
            ready_status: ready_status.into(),
            error_status: None,
        }
    }

    /// Sets the status meaning the resource failed and will never be ready.
    /// Services disagree on its case, so it is matched ignoring ASCII case.
    #[must_use]
    pub fn with_error_status(mut self, status: impl Into<String>) -> Self {
        self.error_status = Some(status.into());
        self
    }

    /// Label used in diagnostics and the registry.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Status reported while the resource is being built.
    #[must_use]
    pub fn transitional_status(&self) -> &str {
        &self.transitional_status
    }

    /// Status reported once the resource is usable.
    #[must_use]
    pub fn ready_status(&self) -> &str {
        &self.ready_status
    }

    /// Terminal failure status, if the kind has one.
    #[must_use]
    pub fn error_status(&self) -> Option<&str> {
        self.error_status.as_deref()
    }

    /// Maps any casing of the error status onto the configured spelling.
    fn normalise(&self, status: String) -> String {
        match self.error_status.as_deref() {
            Some(error) if status.eq_ignore_ascii_case(error) => error.to_owned(),
            _ => status,
        }
    }
}

/// Composite test actions for one kind of resource.
#[derive(Clone, Debug)]
pub struct Lifecycle<C> {
    client: C,
    kind: ResourceKind,
    config: LifecycleConfig,
}

impl<C: ResourceClient> Lifecycle<C> {
    /// Wires a client to a kind and validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Config`] when the configuration fails
    /// validation.
    pub fn new(
        client: C,
        kind: ResourceKind,
        config: LifecycleConfig,
    ) -> Result<Self, LifecycleError> {
        config.validate()?;
        Ok(Self {
            client,
            kind,
            config,
        })
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The kind this lifecycle manages.
    #[must_use]
    pub const fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Fetches the current status of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Gone`] when the resource does not exist and
    /// [`LifecycleError::Client`] when the request fails.
    pub fn status(&self, id: &str) -> Result<String, LifecycleError> {
        match self.client.status(id) {
            Ok(StatusReading::Present(status)) => Ok(status),
            Ok(StatusReading::Gone) => Err(LifecycleError::Gone {
                kind: self.kind.label.clone(),
                id: id.to_owned(),
            }),
            Err(err) => Err(LifecycleError::client("status", &err)),
        }
    }

    /// Waits until `id` reports `expected`, polling every `poll_interval`
    /// (or the configured interval). The kind's error status ends the wait
    /// early.
    ///
    /// Unreliable for transient statuses such as `deleting`, which can come
    /// and go between polls.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Progression`] when the status is not
    /// observed in time or `timeout` is zero.
    pub fn wait_for_status(
        &self,
        id: &str,
        expected: &str,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<(), LifecycleError> {
        let interval = poll_interval.unwrap_or_else(|| self.config.status_poll_interval());
        let mut verifier = self.verifier(id);
        verifier.add_state(
            expected.to_owned(),
            timeout,
            interval,
            self.config.status_poll_retries,
            false,
        )?;
        verifier.start()?;
        Ok(())
    }

    /// Builds a verifier for `id` that treats a vanished resource as a failed
    /// poll and aborts on the kind's error status in any case.
    fn verifier(
        &self,
        id: &str,
    ) -> StatusProgressionVerifier<String, String, impl FnMut(&str) -> Result<String, String> + '_>
    {
        let mut verifier =
            StatusProgressionVerifier::new(self.kind.label(), id, move |subject_id: &str| {
                match self.client.status(subject_id) {
                    Ok(StatusReading::Present(status)) => Ok(self.kind.normalise(status)),
                    Ok(StatusReading::Gone) => Err(String::from("resource no longer exists")),
                    Err(err) => Err(err.to_string()),
                }
            });
        if let Some(status) = self.kind.error_status() {
            verifier.abort_on(status.to_owned());
        }
        verifier
    }
}
