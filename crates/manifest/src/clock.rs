use std::{sync::LazyLock, time::Instant};

use chrono::{DateTime, TimeDelta, Utc};

static ORIGIN: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Milliseconds elapsed on a process-wide monotonic clock.
///
/// All `MaximumTimeData::time` values are expressed on this clock, so the difference between two
/// readings is the real time elapsed between them regardless of wall clock adjustments.
pub fn now_ms() -> f64 {
    ORIGIN.elapsed().as_secs_f64() * 1000.
}

/// Seconds elapsed since `captured_at`, a previous [`now_ms`] reading.
pub(crate) fn seconds_since(captured_at: f64) -> f64 {
    (now_ms() - captured_at) / 1000.
}

/// Convert a unix timestamp in seconds to a wall clock date.
pub fn unix_seconds_to_date(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let delta = TimeDelta::try_milliseconds((seconds * 1000.).round() as i64)?;
    DateTime::UNIX_EPOCH.checked_add_signed(delta)
}
