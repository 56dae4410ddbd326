//! Size-aware timeout calculation for create and delete waits.

use std::time::Duration;

/// Bounds used to derive a wait timeout from a resource size.
///
/// All fields are optional except `base`, which is only consulted by
/// [`TimeoutPolicy::padded`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimeoutPolicy {
    base: Duration,
    min: Option<Duration>,
    max: Option<Duration>,
    wait_per_gigabyte: Option<Duration>,
}

impl TimeoutPolicy {
    /// Creates a policy with no bounds and a zero base.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base: Duration::ZERO,
            min: None,
            max: None,
            wait_per_gigabyte: None,
        }
    }

    /// Sets the fixed time added on top of size-based timeouts.
    #[must_use]
    pub const fn base(mut self, value: Duration) -> Self {
        self.base = value;
        self
    }

    /// Sets the lower bound.
    #[must_use]
    pub const fn min(mut self, value: Option<Duration>) -> Self {
        self.min = value;
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub const fn max(mut self, value: Option<Duration>) -> Self {
        self.max = value;
        self
    }

    /// Sets the time allowed per gigabyte of resource size.
    #[must_use]
    pub const fn wait_per_gigabyte(mut self, value: Option<Duration>) -> Self {
        self.wait_per_gigabyte = value;
        self
    }

    /// Resolves a timeout from an explicit value or the resource size.
    ///
    /// An explicit non-zero timeout wins over the size estimate. The result
    /// is then raised to `min` and capped at `max`; the cap is applied last,
    /// so a `max` below `min` wins.
    #[must_use]
    pub fn bounded(&self, size_gb: Option<u64>, explicit: Option<Duration>) -> Duration {
        let mut timeout = explicit.unwrap_or_default();
        if timeout.is_zero() {
            if let (Some(per_gb), Some(size)) = (self.wait_per_gigabyte, size_gb) {
                timeout = per_gb.saturating_mul(u32::try_from(size).unwrap_or(u32::MAX));
            }
        }
        if let Some(min) = self.min {
            timeout = timeout.max(min);
        }
        if let Some(max) = self.max {
            timeout = timeout.min(max);
        }
        timeout
    }

    /// Size-based timeout plus `base`; falls back to `base` alone when the
    /// size-based value is zero.
    #[must_use]
    pub fn padded(&self, size_gb: Option<u64>) -> Duration {
        let sized = self.bounded(size_gb, None);
        if sized.is_zero() {
            self.base
        } else {
            sized.saturating_add(self.base)
        }
    }
}

#[cfg(test)]
mod tests;
