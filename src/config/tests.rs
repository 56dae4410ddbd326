//! Unit tests for lifecycle configuration loading and validation.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

/// Serialises environment mutation across loader tests.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const CONFIG_KEYS: [&str; 11] = [
    "STATUSWAIT_CONFIG_PATH",
    "STATUSWAIT_STATUS_POLL_INTERVAL_MS",
    "STATUSWAIT_STATUS_POLL_RETRIES",
    "STATUSWAIT_BUILD_ATTEMPTS",
    "STATUSWAIT_CREATE_BASE_TIMEOUT_SECS",
    "STATUSWAIT_CREATE_MIN_TIMEOUT_SECS",
    "STATUSWAIT_CREATE_MAX_TIMEOUT_SECS",
    "STATUSWAIT_CREATE_WAIT_PER_GIGABYTE_SECS",
    "STATUSWAIT_DELETE_MIN_TIMEOUT_SECS",
    "STATUSWAIT_DELETE_MAX_TIMEOUT_SECS",
    "STATUSWAIT_DELETE_WAIT_PER_GIGABYTE_SECS",
];

/// Holds the env lock, clears every `STATUSWAIT_*` key, applies `pairs`, and
/// restores the previous values on drop.
struct EnvGuard {
    previous: Vec<(&'static str, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = CONFIG_KEYS
            .iter()
            .map(|key| (*key, env::var_os(key)))
            .collect();
        for key in CONFIG_KEYS {
            // SAFETY: environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::remove_var(key) };
        }
        for (key, value) in pairs {
            // SAFETY: environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
        }
        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

const REQUIRED_ENV: [(&str, &str); 6] = [
    ("STATUSWAIT_STATUS_POLL_INTERVAL_MS", "250"),
    ("STATUSWAIT_STATUS_POLL_RETRIES", "3"),
    ("STATUSWAIT_BUILD_ATTEMPTS", "2"),
    ("STATUSWAIT_CREATE_BASE_TIMEOUT_SECS", "10"),
    ("STATUSWAIT_CREATE_MIN_TIMEOUT_SECS", "30"),
    ("STATUSWAIT_DELETE_MIN_TIMEOUT_SECS", "15"),
];

fn base_config() -> LifecycleConfig {
    LifecycleConfig {
        status_poll_interval_ms: 500,
        status_poll_retries: 2,
        build_attempts: 3,
        create_base_timeout_secs: 10,
        create_min_timeout_secs: 30,
        create_max_timeout_secs: Some(600),
        create_wait_per_gigabyte_secs: Some(6),
        delete_min_timeout_secs: Some(15),
        delete_max_timeout_secs: Some(300),
        delete_wait_per_gigabyte_secs: Some(2),
    }
}

#[fixture]
fn config() -> LifecycleConfig {
    base_config()
}

#[rstest]
fn complete_config_validates(config: LifecycleConfig) {
    config.validate().expect("config should be valid");
}

#[rstest]
#[case::poll_interval(
    LifecycleConfig { status_poll_interval_ms: 0, ..base_config() },
    "STATUSWAIT_STATUS_POLL_INTERVAL_MS"
)]
#[case::build_attempts(
    LifecycleConfig { build_attempts: 0, ..base_config() },
    "STATUSWAIT_BUILD_ATTEMPTS"
)]
#[case::create_min(
    LifecycleConfig { create_min_timeout_secs: 0, ..base_config() },
    "STATUSWAIT_CREATE_MIN_TIMEOUT_SECS"
)]
#[case::create_range(
    LifecycleConfig { create_max_timeout_secs: Some(5), ..base_config() },
    "STATUSWAIT_CREATE_MAX_TIMEOUT_SECS"
)]
#[case::delete_min_missing(
    LifecycleConfig { delete_min_timeout_secs: None, ..base_config() },
    "STATUSWAIT_DELETE_MIN_TIMEOUT_SECS"
)]
#[case::delete_min_zero(
    LifecycleConfig { delete_min_timeout_secs: Some(0), ..base_config() },
    "STATUSWAIT_DELETE_MIN_TIMEOUT_SECS"
)]
#[case::delete_range(
    LifecycleConfig { delete_max_timeout_secs: Some(1), ..base_config() },
    "STATUSWAIT_DELETE_MAX_TIMEOUT_SECS"
)]
fn invalid_values_name_the_variable_to_set(
    #[case] invalid: LifecycleConfig,
    #[case] env_var: &str,
) {
    let message = match invalid.validate() {
        Err(ConfigError::Invalid(message)) => message,
        other => panic!("expected invalid config, got {other:?}"),
    };
    assert!(message.contains(env_var), "message: {message}");
}

#[rstest]
fn optional_delete_bounds_may_be_left_open(config: LifecycleConfig) {
    let open = LifecycleConfig {
        delete_max_timeout_secs: None,
        delete_wait_per_gigabyte_secs: None,
        ..config
    };
    open.validate().expect("open delete range should be valid");
    assert_eq!(
        open.delete_policy().bounded(None, None),
        Duration::from_secs(15)
    );
}

#[rstest]
fn policies_reflect_configured_bounds(config: LifecycleConfig) {
    assert_eq!(config.status_poll_interval(), Duration::from_millis(500));
    assert_eq!(config.create_min_timeout(), Duration::from_secs(30));
    assert_eq!(
        config.create_policy().padded(Some(20)),
        Duration::from_secs(130)
    );
    assert_eq!(
        config.delete_policy().bounded(Some(20), None),
        Duration::from_secs(40)
    );
}

#[rstest]
fn loads_required_values_from_environment() {
    let _guard = EnvGuard::set_vars(&REQUIRED_ENV);

    let loaded = LifecycleConfig::load_without_cli_args().expect("config should load from env");

    assert_eq!(
        loaded,
        LifecycleConfig {
            status_poll_interval_ms: 250,
            status_poll_retries: 3,
            build_attempts: 2,
            create_base_timeout_secs: 10,
            create_min_timeout_secs: 30,
            create_max_timeout_secs: None,
            create_wait_per_gigabyte_secs: None,
            delete_min_timeout_secs: Some(15),
            delete_max_timeout_secs: None,
            delete_wait_per_gigabyte_secs: None,
        }
    );
    loaded.validate().expect("loaded config should be valid");
}

#[rstest]
fn environment_overrides_configuration_file() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("statuswait.toml");
    fs::write(
        &path,
        "status_poll_interval_ms = 1000\n\
         status_poll_retries = 1\n\
         build_attempts = 4\n\
         create_base_timeout_secs = 20\n\
         create_min_timeout_secs = 60\n\
         create_max_timeout_secs = 900\n\
         delete_min_timeout_secs = 30\n",
    )
    .expect("config file should be written");
    let path_value = path.to_string_lossy().into_owned();
    let _guard = EnvGuard::set_vars(&[
        ("STATUSWAIT_CONFIG_PATH", path_value.as_str()),
        ("STATUSWAIT_BUILD_ATTEMPTS", "1"),
    ]);

    let loaded = LifecycleConfig::load_without_cli_args().expect("config should load from file");

    assert_eq!(loaded.status_poll_interval_ms, 1000);
    assert_eq!(loaded.create_max_timeout_secs, Some(900));
    assert_eq!(loaded.delete_min_timeout_secs, Some(30));
    assert_eq!(loaded.build_attempts, 1);
}

#[rstest]
fn missing_required_field_is_a_parse_error() {
    let partial: Vec<_> = REQUIRED_ENV
        .iter()
        .copied()
        .filter(|(key, _)| *key != "STATUSWAIT_BUILD_ATTEMPTS")
        .collect();
    let _guard = EnvGuard::set_vars(&partial);

    let err = LifecycleConfig::load_without_cli_args().expect_err("build attempts are required");

    assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
}
