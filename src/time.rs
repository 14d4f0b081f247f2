//! Millisecond/duration conversion helpers.
//!
//! The player's public clock is a signed millisecond count, so conversions
//! to and from [`Duration`] saturate explicitly instead of truncating.

use std::time::Duration;

/// Extension trait for safe [`Duration`] conversions.
pub trait DurationExt {
    /// Convert the duration to milliseconds as i64, saturating at `i64::MAX`.
    ///
    /// Always safe in practice; `i64::MAX` milliseconds is roughly 292
    /// million years.
    fn as_millis_i64(&self) -> i64;
}

impl DurationExt for Duration {
    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Convert a millisecond count to a [`Duration`], treating negatives as zero.
pub(crate) fn millis_to_duration(millis: i64) -> Duration {
    Duration::from_millis(u64::try_from(millis).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_i64() {
        assert_eq!(Duration::from_millis(1234).as_millis_i64(), 1234);
    }

    #[test]
    fn test_as_millis_i64_zero() {
        assert_eq!(Duration::ZERO.as_millis_i64(), 0);
    }

    #[test]
    fn test_as_millis_i64_saturates() {
        let duration = Duration::from_secs(u64::MAX);
        assert_eq!(duration.as_millis_i64(), i64::MAX);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(250), Duration::from_millis(250));
    }

    #[test]
    fn test_millis_to_duration_negative_is_zero() {
        assert_eq!(millis_to_duration(-50), Duration::ZERO);
    }
}
