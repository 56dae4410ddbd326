//! Unit tests for timeout calculation.

use std::time::Duration;

use rstest::rstest;

use super::TimeoutPolicy;

const fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

fn sized_policy() -> TimeoutPolicy {
    TimeoutPolicy::new()
        .base(secs(10))
        .min(Some(secs(30)))
        .max(Some(secs(600)))
        .wait_per_gigabyte(Some(secs(6)))
}

#[rstest]
#[case(Some(10), None, secs(60))]
#[case(Some(1), None, secs(30))]
#[case(Some(500), None, secs(600))]
#[case(None, None, secs(30))]
#[case(Some(10), Some(secs(45)), secs(45))]
#[case(Some(10), Some(secs(5)), secs(30))]
#[case(Some(10), Some(secs(900)), secs(600))]
fn bounded_clamps_size_estimate(
    #[case] size_gb: Option<u64>,
    #[case] explicit: Option<Duration>,
    #[case] expected: Duration,
) {
    assert_eq!(sized_policy().bounded(size_gb, explicit), expected);
}

#[rstest]
fn bounded_without_bounds_or_size_is_zero() {
    assert_eq!(TimeoutPolicy::new().bounded(Some(10), None), Duration::ZERO);
}

#[rstest]
fn max_below_min_wins() {
    let policy = TimeoutPolicy::new().min(Some(secs(30))).max(Some(secs(20)));
    assert_eq!(policy.bounded(None, None), secs(20));
}

#[rstest]
fn padded_adds_base_to_sized_timeout() {
    assert_eq!(sized_policy().padded(Some(10)), secs(70));
}

#[rstest]
fn padded_falls_back_to_base_when_nothing_else_applies() {
    let policy = TimeoutPolicy::new().base(secs(120));
    assert_eq!(policy.padded(None), secs(120));
}

#[rstest]
fn huge_sizes_saturate_instead_of_overflowing() {
    let policy = TimeoutPolicy::new().wait_per_gigabyte(Some(Duration::MAX));
    assert_eq!(policy.bounded(Some(u64::MAX), None), Duration::MAX);
}
