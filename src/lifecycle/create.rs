//! Create-and-wait-until-ready with rebuild attempts.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::progression::ProgressionError;
use crate::registry::ResourceRegistry;

use super::{Lifecycle, LifecycleError, ResourceClient};

impl<C: ResourceClient> Lifecycle<C> {
    /// Creates a resource and waits for it to become ready.
    ///
    /// Each attempt creates a resource, records it in `registry`, then
    /// verifies the transitional status (optional, within the configured
    /// minimum create timeout) followed by the ready status (required, within
    /// `timeout` or the size-based create timeout). A failed attempt deletes
    /// the broken resource and starts over, up to the configured number of
    /// build attempts. Broken resources whose deletion cannot be confirmed
    /// stay registered for a later sweep.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Client`] when a create request fails,
    /// [`LifecycleError::Progression`] when the progression is misconfigured,
    /// and [`LifecycleError::RequiredResource`] when every attempt failed
    /// verification.
    pub fn create_ready(
        &self,
        request: &C::Request,
        size_gb: Option<u64>,
        timeout: Option<Duration>,
        registry: &mut ResourceRegistry,
    ) -> Result<String, LifecycleError> {
        let ready_timeout = timeout.unwrap_or_else(|| self.config.create_policy().padded(size_gb));
        let attempts = self.config.build_attempts;
        let mut failures = Vec::new();

        for attempt in 1..=attempts {
            debug!(kind = %self.kind.label, attempt, attempts, "creating resource");
            let id = self
                .client
                .create(request)
                .map_err(|err| LifecycleError::client("create", &err))?;
            registry.register(&self.kind.label, &id, size_gb);

            match self.verify_ready(&id, ready_timeout) {
                Ok(()) => {
                    info!(kind = %self.kind.label, %id, attempt, "resource ready");
                    return Ok(id);
                }
                Err(ProgressionError::Verification(failure)) => {
                    warn!(kind = %self.kind.label, %id, attempt, error = %failure, "build failed");
                    failures.push(failure.to_string());
                    self.discard(&id, size_gb, registry);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(LifecycleError::RequiredResource {
            kind: self.kind.label.clone(),
            attempts,
            failures,
        })
    }

    fn verify_ready(&self, id: &str, ready_timeout: Duration) -> Result<(), ProgressionError> {
        let interval = self.config.status_poll_interval();
        let retries = self.config.status_poll_retries;
        let mut verifier = self.verifier(id);
        verifier
            .add_state(
                self.kind.transitional_status.clone(),
                self.config.create_min_timeout(),
                interval,
                retries,
                true,
            )?
            .add_state(
                self.kind.ready_status.clone(),
                ready_timeout,
                interval,
                retries,
                false,
            )?;
        verifier.start()
    }

    fn discard(&self, id: &str, size_gb: Option<u64>, registry: &mut ResourceRegistry) {
        match self.delete_confirmed(id, size_gb, None, None) {
            Ok(()) => {
                registry.forget(&self.kind.label, id);
            }
            Err(err) => {
                warn!(kind = %self.kind.label, %id, error = %err, "failed build left in place");
            }
        }
    }
}
