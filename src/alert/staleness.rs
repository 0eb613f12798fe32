/// Snapshot staleness detection.
///
/// Plant sensors upload every few minutes under normal conditions. During an
/// active violation episode, stale data is dangerous — a sensor outage or
/// uplink failure may not be obvious from the dashboard. This module
/// provides staleness checking so the alerting path can flag gaps.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This makes staleness purely deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, Utc};

use crate::model::ParameterSnapshot;

// ---------------------------------------------------------------------------
// Staleness check
// ---------------------------------------------------------------------------

/// Returns `true` if the snapshot is older than `max_age_minutes` relative
/// to `now`.
///
/// Staleness is defined as strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
///
/// A snapshot stamped in the future (clock skew between gateway and
/// service) is never stale.
///
/// # Typical thresholds
/// - Normal monitoring: 5 minutes (the dashboard's offline cutoff)
/// - Relaxed / backfill review: 60 minutes
pub fn is_stale_at(snapshot: &ParameterSnapshot, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(snapshot.timestamp);
    age.num_minutes() > max_age_minutes as i64
}

/// Convenience wrapper that uses the real current time.
/// Use `is_stale_at` in tests to keep them deterministic.
pub fn is_stale(snapshot: &ParameterSnapshot, max_age_minutes: u64) -> bool {
    is_stale_at(snapshot, max_age_minutes, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot_at(timestamp: DateTime<Utc>) -> ParameterSnapshot {
        let mut s = ParameterSnapshot::empty("RPi001", timestamp);
        s.ph = Some(7.2);
        s
    }

    /// A fixed "now" used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn minutes_before_now(minutes: i64) -> DateTime<Utc> {
        fixed_now() - chrono::Duration::minutes(minutes)
    }

    // --- Not stale ----------------------------------------------------------

    #[test]
    fn test_recent_snapshot_is_not_stale() {
        let snapshot = snapshot_at(minutes_before_now(2));
        assert!(!is_stale_at(&snapshot, 5, fixed_now()));
    }

    #[test]
    fn test_snapshot_exactly_at_threshold_is_not_stale() {
        // Age == threshold should NOT be considered stale (strictly greater than).
        let snapshot = snapshot_at(minutes_before_now(5));
        assert!(
            !is_stale_at(&snapshot, 5, fixed_now()),
            "snapshot exactly at threshold should not be stale — \
             staleness is strictly greater than, not >="
        );
    }

    #[test]
    fn test_future_snapshot_is_not_stale() {
        // Gateway clock running ahead of the service clock.
        let snapshot = snapshot_at(fixed_now() + chrono::Duration::minutes(3));
        assert!(!is_stale_at(&snapshot, 5, fixed_now()));
    }

    // --- Stale --------------------------------------------------------------

    #[test]
    fn test_snapshot_one_minute_past_threshold_is_stale() {
        let snapshot = snapshot_at(minutes_before_now(6));
        assert!(is_stale_at(&snapshot, 5, fixed_now()));
    }

    #[test]
    fn test_snapshot_from_hours_ago_is_stale() {
        let snapshot = snapshot_at(minutes_before_now(240));
        assert!(is_stale_at(&snapshot, 60, fixed_now()));
    }

    // --- Threshold variation ------------------------------------------------

    #[test]
    fn test_same_snapshot_stale_under_tight_threshold_not_under_loose() {
        let snapshot = snapshot_at(minutes_before_now(30));
        assert!(is_stale_at(&snapshot, 20, fixed_now()));
        assert!(!is_stale_at(&snapshot, 60, fixed_now()));
    }
}
