// crates/run-gate-core/src/core/time.rs
// ============================================================================
// Module: Run Gate Time Model
// Description: Canonical timestamps and UTC budget-window arithmetic.
// Purpose: Provide deterministic time values for records and window sums.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Run Gate records carry explicit unix-millisecond timestamps. The core
//! never reads wall-clock time directly; hosts supply the current instant
//! through the [`crate::interfaces::Clock`] interface, which keeps budget
//! window computation replayable under test.
//!
//! Budget windows are calendar-aligned in UTC: the daily window starts at
//! 00:00:00 UTC of the current day, the monthly window at 00:00:00 UTC of
//! the first of the current month.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::Time;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Error for timestamps outside the representable calendar range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timestamp out of calendar range: {unix_millis} ms")]
pub struct TimestampRangeError {
    /// Offending unix-millisecond value.
    pub unix_millis: i64,
}

/// Canonical timestamp used in run records and cost entries.
///
/// # Invariants
/// - Unix epoch milliseconds, UTC.
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the start of the UTC day containing this timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampRangeError`] when the value falls outside the
    /// representable calendar range.
    pub fn start_of_utc_day(self) -> Result<Self, TimestampRangeError> {
        let moment = self.to_offset_date_time()?;
        Ok(Self::from_offset_date_time(moment.replace_time(Time::MIDNIGHT)))
    }

    /// Returns the start of the UTC month containing this timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampRangeError`] when the value falls outside the
    /// representable calendar range.
    pub fn start_of_utc_month(self) -> Result<Self, TimestampRangeError> {
        let moment = self.to_offset_date_time()?;
        let first = moment
            .replace_day(1)
            .map_err(|_| TimestampRangeError { unix_millis: self.0 })?;
        Ok(Self::from_offset_date_time(first.replace_time(Time::MIDNIGHT)))
    }

    /// Converts into a calendar value for window arithmetic.
    fn to_offset_date_time(self) -> Result<OffsetDateTime, TimestampRangeError> {
        let nanos = i128::from(self.0)
            .checked_mul(1_000_000)
            .ok_or(TimestampRangeError { unix_millis: self.0 })?;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|_| TimestampRangeError { unix_millis: self.0 })
    }

    /// Converts a calendar value back to unix milliseconds.
    fn from_offset_date_time(moment: OffsetDateTime) -> Self {
        // Division truncates toward zero; millisecond precision is exact here
        // because window starts land on whole seconds.
        let millis = moment.unix_timestamp_nanos() / 1_000_000;
        Self(clamp_to_i64(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Clamps an i128 millisecond value into the i64 timestamp domain.
fn clamp_to_i64(millis: i128) -> i64 {
    if millis > i128::from(i64::MAX) {
        i64::MAX
    } else if millis < i128::from(i64::MIN) {
        i64::MIN
    } else {
        // Bounds checked above.
        #[allow(clippy::cast_possible_truncation, reason = "Range checked above.")]
        {
            millis as i64
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test-only assertions are permitted.")]
mod tests {
    use super::*;

    // 2026-03-17T15:42:11.500Z
    const MID_MARCH: i64 = 1_773_762_131_500;

    #[test]
    fn day_window_starts_at_utc_midnight() {
        let ts = Timestamp::from_unix_millis(MID_MARCH);
        let start = ts.start_of_utc_day().expect("in range");
        // 2026-03-17T00:00:00Z
        assert_eq!(start.as_unix_millis(), 1_773_705_600_000);
    }

    #[test]
    fn month_window_starts_on_the_first() {
        let ts = Timestamp::from_unix_millis(MID_MARCH);
        let start = ts.start_of_utc_month().expect("in range");
        // 2026-03-01T00:00:00Z
        assert_eq!(start.as_unix_millis(), 1_772_323_200_000);
    }

    #[test]
    fn window_start_is_idempotent() {
        let ts = Timestamp::from_unix_millis(MID_MARCH);
        let start = ts.start_of_utc_day().expect("in range");
        assert_eq!(start.start_of_utc_day().expect("in range"), start);
    }
}
