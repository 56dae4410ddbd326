//! Configuration loading via `ortho-config`.
//!
//! Every wait tunable is a required input: poll intervals, retry budgets and
//! timeouts have no built-in defaults and must come from a configuration
//! file, the environment, or the command line.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::timeout::TimeoutPolicy;

/// Wait tunables for one kind of resource, layered from defaults,
/// configuration files, environment variables (`STATUSWAIT_*`) and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "STATUSWAIT",
    discovery(
        app_name = "statuswait",
        env_var = "STATUSWAIT_CONFIG_PATH",
        config_file_name = "statuswait.toml",
        dotfile_name = ".statuswait.toml",
        project_file_name = "statuswait.toml"
    )
)]
pub struct LifecycleConfig {
    /// Milliseconds between status polls.
    pub status_poll_interval_ms: u64,
    /// Consecutive failed status polls tolerated before a wait fails.
    pub status_poll_retries: u32,
    /// Number of times a failed build is retried from scratch.
    pub build_attempts: u32,
    /// Seconds added to every size-based create timeout.
    pub create_base_timeout_secs: u64,
    /// Lower bound on create timeouts; also the window for the transitional
    /// status right after creation.
    pub create_min_timeout_secs: u64,
    /// Upper bound on create timeouts.
    pub create_max_timeout_secs: Option<u64>,
    /// Seconds of create wait granted per gigabyte of resource size.
    pub create_wait_per_gigabyte_secs: Option<u64>,
    /// Lower bound on delete confirmation timeouts. Must be set: it is the
    /// whole window for resources whose size is unknown.
    pub delete_min_timeout_secs: Option<u64>,
    /// Upper bound on delete confirmation timeouts.
    pub delete_max_timeout_secs: Option<u64>,
    /// Seconds of delete wait granted per gigabyte of resource size.
    pub delete_wait_per_gigabyte_secs: Option<u64>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn guidance(&self) -> String {
        format!(
            "set {} or add {} to statuswait.toml",
            self.env_var, self.toml_key
        )
    }
}

const POLL_INTERVAL: FieldMetadata = FieldMetadata::new(
    "status poll interval",
    "STATUSWAIT_STATUS_POLL_INTERVAL_MS",
    "status_poll_interval_ms",
);
const BUILD_ATTEMPTS: FieldMetadata = FieldMetadata::new(
    "build attempts",
    "STATUSWAIT_BUILD_ATTEMPTS",
    "build_attempts",
);
const CREATE_MIN_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "minimum create timeout",
    "STATUSWAIT_CREATE_MIN_TIMEOUT_SECS",
    "create_min_timeout_secs",
);
const CREATE_MAX_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "maximum create timeout",
    "STATUSWAIT_CREATE_MAX_TIMEOUT_SECS",
    "create_max_timeout_secs",
);
const DELETE_MIN_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "minimum delete timeout",
    "STATUSWAIT_DELETE_MIN_TIMEOUT_SECS",
    "delete_min_timeout_secs",
);
const DELETE_MAX_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "maximum delete timeout",
    "STATUSWAIT_DELETE_MAX_TIMEOUT_SECS",
    "delete_max_timeout_secs",
);

impl LifecycleConfig {
    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than zero: {}",
                metadata.description,
                metadata.guidance()
            )));
        }
        Ok(())
    }

    fn require_ordered(
        min: Option<u64>,
        max: Option<u64>,
        metadata: &FieldMetadata,
    ) -> Result<(), ConfigError> {
        match (min, max) {
            (Some(lower), Some(upper)) if upper < lower => Err(ConfigError::Invalid(format!(
                "{} ({upper}s) is below the minimum ({lower}s): {}",
                metadata.description,
                metadata.guidance()
            ))),
            _ => Ok(()),
        }
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("statuswait")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Values are never clamped; a zero poll
    /// interval, an inverted timeout range, or a missing minimum delete
    /// timeout is rejected with guidance on where to set the value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a tunable is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_positive(self.status_poll_interval_ms, &POLL_INTERVAL)?;
        Self::require_positive(u64::from(self.build_attempts), &BUILD_ATTEMPTS)?;
        Self::require_positive(self.create_min_timeout_secs, &CREATE_MIN_TIMEOUT)?;
        Self::require_ordered(
            Some(self.create_min_timeout_secs),
            self.create_max_timeout_secs,
            &CREATE_MAX_TIMEOUT,
        )?;
        // Resources registered without a size rely on the minimum alone.
        Self::require_positive(
            self.delete_min_timeout_secs.unwrap_or(0),
            &DELETE_MIN_TIMEOUT,
        )?;
        Self::require_ordered(
            self.delete_min_timeout_secs,
            self.delete_max_timeout_secs,
            &DELETE_MAX_TIMEOUT,
        )?;
        Ok(())
    }

    /// Delay between status polls.
    #[must_use]
    pub const fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    /// Window for the transitional status observed right after creation.
    #[must_use]
    pub const fn create_min_timeout(&self) -> Duration {
        Duration::from_secs(self.create_min_timeout_secs)
    }

    /// Timeout policy for waiting until a new resource is ready.
    #[must_use]
    pub fn create_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new()
            .base(Duration::from_secs(self.create_base_timeout_secs))
            .min(Some(self.create_min_timeout()))
            .max(self.create_max_timeout_secs.map(Duration::from_secs))
            .wait_per_gigabyte(self.create_wait_per_gigabyte_secs.map(Duration::from_secs))
    }

    /// Timeout policy for confirming a deletion.
    #[must_use]
    pub fn delete_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new()
            .min(self.delete_min_timeout_secs.map(Duration::from_secs))
            .max(self.delete_max_timeout_secs.map(Duration::from_secs))
            .wait_per_gigabyte(self.delete_wait_per_gigabyte_secs.map(Duration::from_secs))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a tunable holds an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests;
