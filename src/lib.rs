//! Status waiting helpers for cloud API test suites.
//!
//! The core is [`StatusProgressionVerifier`], which asserts that a polled
//! resource status moves through an ordered set of stages (for example
//! `creating` → `available`), each within its own timeout. Around it sit the
//! shared poll loop, size-aware timeout calculation, layered configuration,
//! generic create/delete behaviours over a [`ResourceClient`], and a
//! per-session [`ResourceRegistry`] for teardown.
//!
//! Everything is synchronous: waits block the calling thread.

pub mod config;
pub mod lifecycle;
pub mod poll;
pub mod progression;
pub mod registry;
pub mod test_support;
pub mod timeout;

pub use config::{ConfigError, LifecycleConfig};
pub use lifecycle::{
    CascadeSummary, DeleteAck, Lifecycle, LifecycleError, ResourceClient, ResourceKind,
    StatusReading, SweepSummary,
};
pub use poll::{PollOutcome, PollWindow, Probe, WindowError, poll_until};
pub use progression::{
    ConfigurationError, ProgressionError, Stage, StageFailure, StatusProgressionVerifier,
    VerificationFailure,
};
pub use registry::{RegisteredResource, ResourceRegistry, SESSION_TAG_PREFIX};
pub use timeout::TimeoutPolicy;
