//! Time display utilities.
//!
//! Wrappers that render timestamps in the system timezone and schedule
//! offsets as `mm:ss`.

use std::fmt;

use jiff::{tz::TimeZone, SignedDuration, Timestamp};

/// A `Timestamp` rendered in the system timezone as `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl<'a> fmt::Display for LocalDateTime<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

/// Offset from the start of a schedule, rendered as `mm:ss`.
///
/// Minutes are not wrapped at the hour, so a two hour offset prints as
/// `120:00`.
///
/// ```rust
/// use brigade_core::display::ClockOffset;
/// use jiff::SignedDuration;
///
/// assert_eq!(ClockOffset(SignedDuration::from_secs(90)).to_string(), "01:30");
/// assert_eq!(ClockOffset(SignedDuration::from_mins(125)).to_string(), "125:00");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClockOffset(pub SignedDuration);

impl fmt::Display for ClockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs();
        let sign = if total < 0 { "-" } else { "" };
        let total = total.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", total / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_offset_formatting() {
        assert_eq!(ClockOffset(SignedDuration::ZERO).to_string(), "00:00");
        assert_eq!(ClockOffset(SignedDuration::from_secs(59)).to_string(), "00:59");
        assert_eq!(ClockOffset(SignedDuration::from_secs(-30)).to_string(), "-00:30");
    }

    #[test]
    fn test_local_datetime_includes_date() {
        let ts = Timestamp::from_second(1_640_995_200).expect("valid timestamp");
        let rendered = LocalDateTime(&ts).to_string();
        // The date may shift by a day depending on the local zone.
        assert!(rendered.starts_with("2022-01-01") || rendered.starts_with("2021-12-31"));
    }
}
