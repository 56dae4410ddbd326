//! Delete-and-confirm and the registry sweep.

use std::time::Duration;

use tracing::{info, warn};

use crate::poll::{PollOutcome, PollWindow, Probe, poll_until};
use crate::registry::ResourceRegistry;

use super::{DeleteAck, Lifecycle, LifecycleError, ResourceClient, StatusReading};

/// Summary of sweep work.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepSummary {
    /// Resource kind that was swept.
    pub kind: String,
    /// Number of resources whose deletion was confirmed.
    pub deleted: usize,
}

/// Outcome of deleting a resource after its dependents.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CascadeSummary {
    /// Kind of the dependents that were deleted first.
    pub dependent_kind: String,
    /// Number of dependents whose deletion was confirmed.
    pub deleted: usize,
    /// Dependents whose deletion could not be confirmed.
    pub left_behind: Vec<String>,
}

impl<C: ResourceClient> Lifecycle<C> {
    /// Deletes `id` and polls until the service reports it gone.
    ///
    /// The delete request and the confirmation polls share one deadline:
    /// `timeout` (or the size-based delete timeout) clamped to the configured
    /// delete bounds. Failed requests count against the configured retry
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Window`] when the resolved timeout or poll
    /// interval is zero and [`LifecycleError::DeleteUnconfirmed`] when the
    /// resource is still present at the deadline or requests keep failing.
    pub fn delete_confirmed(
        &self,
        id: &str,
        size_gb: Option<u64>,
        timeout: Option<Duration>,
        poll_interval: Option<Duration>,
    ) -> Result<(), LifecycleError> {
        let window = PollWindow::new(
            self.config.delete_policy().bounded(size_gb, timeout),
            poll_interval.unwrap_or_else(|| self.config.status_poll_interval()),
            self.config.status_poll_retries,
        )
        .map_err(|source| LifecycleError::Window {
            kind: self.kind.label.clone(),
            id: id.to_owned(),
            source,
        })?;

        let mut requested = false;
        let outcome = poll_until(&window, || {
            if !requested {
                match self.client.delete(id) {
                    Ok(DeleteAck::AlreadyGone) => return Ok(Probe::Done(())),
                    Ok(DeleteAck::Accepted) => requested = true,
                    Err(err) => return Err(format!("delete: {err}")),
                }
            }
            match self.client.status(id) {
                Ok(StatusReading::Gone) => Ok(Probe::Done(())),
                Ok(StatusReading::Present(status)) => Ok(Probe::Pending(status)),
                Err(err) => Err(format!("status: {err}")),
            }
        });

        let reason = match outcome {
            PollOutcome::Ready { elapsed, .. } => {
                info!(kind = %self.kind.label, %id, ?elapsed, "deletion confirmed");
                return Ok(());
            }
            PollOutcome::TimedOut {
                elapsed,
                last_observed,
                ..
            } => format!(
                "still present after {elapsed:?} (last status: {})",
                last_observed.as_deref().unwrap_or("unknown")
            ),
            PollOutcome::Failed {
                consecutive_failures,
                last_error,
                ..
            } => format!("{consecutive_failures} consecutive requests failed, last error: {last_error}"),
            PollOutcome::Aborted { reason, .. } => reason,
        };
        warn!(kind = %self.kind.label, %id, %reason, "deletion not confirmed");
        Err(LifecycleError::DeleteUnconfirmed {
            kind: self.kind.label.clone(),
            id: id.to_owned(),
            reason,
        })
    }

    /// Deletes each of `dependent_ids` through `dependents`, then deletes
    /// `id` itself and waits for confirmation.
    ///
    /// A dependent that cannot be confirmed deleted is logged and listed in
    /// the summary; the parent is deleted regardless.
    ///
    /// # Errors
    ///
    /// Returns the [`Lifecycle::delete_confirmed`] error for the parent.
    pub fn delete_with_dependents_confirmed<D: ResourceClient>(
        &self,
        id: &str,
        size_gb: Option<u64>,
        dependents: &Lifecycle<D>,
        dependent_ids: &[String],
    ) -> Result<CascadeSummary, LifecycleError> {
        let mut deleted = 0;
        let mut left_behind = Vec::new();
        for dependent_id in dependent_ids {
            match dependents.delete_confirmed(dependent_id, None, None, None) {
                Ok(()) => deleted += 1,
                Err(err) => {
                    warn!(
                        kind = %dependents.kind.label,
                        id = %dependent_id,
                        parent = %id,
                        error = %err,
                        "dependent not deleted, deleting parent anyway"
                    );
                    left_behind.push(dependent_id.clone());
                }
            }
        }

        self.delete_confirmed(id, size_gb, None, None)?;
        Ok(CascadeSummary {
            dependent_kind: dependents.kind.label.clone(),
            deleted,
            left_behind,
        })
    }

    /// Deletes every registered resource of this kind, newest first, and
    /// removes the confirmed ones from `registry`.
    ///
    /// Sweeping dependents before their parents (snapshots before volumes)
    /// is the caller's job: sweep each kind in turn, or use
    /// [`Lifecycle::delete_with_dependents_confirmed`] for a single parent.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotClean`] listing the resources whose
    /// deletion could not be confirmed; they remain registered.
    pub fn sweep(&self, registry: &mut ResourceRegistry) -> Result<SweepSummary, LifecycleError> {
        let mut deleted = 0;
        let mut remaining = Vec::new();
        for entry in registry.newest_first(&self.kind.label) {
            match self.delete_confirmed(&entry.id, entry.size_gb, None, None) {
                Ok(()) => {
                    registry.forget(&entry.kind, &entry.id);
                    deleted += 1;
                }
                Err(err) => {
                    warn!(kind = %self.kind.label, id = %entry.id, error = %err, "sweep left resource behind");
                    remaining.push(entry.id);
                }
            }
        }

        if remaining.is_empty() {
            Ok(SweepSummary {
                kind: self.kind.label.clone(),
                deleted,
            })
        } else {
            Err(LifecycleError::NotClean {
                kind: self.kind.label.clone(),
                remaining,
            })
        }
    }
}
