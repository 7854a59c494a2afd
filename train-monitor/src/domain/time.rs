//! Board time handling.
//!
//! Upstream APIs report times as "HH:MM" strings with no date attached.
//! This module parses them and computes delay in minutes between a
//! scheduled and an estimated time, handling services that roll over
//! midnight (a 23:55 departure estimated at 00:05 is 10 minutes late,
//! not 23 hours early).

use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// If an estimated time appears earlier than the schedule by more than
/// this many minutes, assume it belongs to the next day.
const ROLLOVER_THRESHOLD_MINUTES: i32 = 600;

/// Minutes in a day.
const DAY_MINUTES: i32 = 1440;

/// A clock time from a station board, stored as minutes past midnight.
///
/// # Examples
///
/// ```
/// use train_monitor::domain::BoardTime;
///
/// let t = BoardTime::parse("14:30").unwrap();
/// assert_eq!(t.minutes_of_day(), 14 * 60 + 30);
/// assert_eq!(t.to_string(), "14:30");
///
/// assert!(BoardTime::parse("1430").is_err());
/// assert!(BoardTime::parse("25:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardTime {
    minutes: u16,
}

impl BoardTime {
    /// Parse a time from "HH:MM" format.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self {
            minutes: hour * 60 + minute,
        })
    }

    /// Minutes past midnight (0-1439).
    pub fn minutes_of_day(&self) -> u16 {
        self.minutes
    }
}

impl fmt::Display for BoardTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl fmt::Debug for BoardTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardTime({self})")
    }
}

/// Parse exactly two ASCII digits.
fn parse_two_digits(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 2 || !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
        return None;
    }
    Some(u16::from(bytes[0] - b'0') * 10 + u16::from(bytes[1] - b'0'))
}

/// Compute the delay in minutes between a scheduled and an estimated time.
///
/// Both inputs are "HH:MM" strings. If the estimated time appears to be
/// earlier by more than 10 hours, a midnight rollover is assumed and 24
/// hours are added before taking the difference. The result is clamped to
/// zero: an early-running service is not a delay. Unparseable input yields
/// zero, because board strings mix times with status words and a bad string
/// must never fail a whole board.
///
/// # Examples
///
/// ```
/// use train_monitor::domain::delay_between;
///
/// assert_eq!(delay_between("10:00", "10:07"), 7);
/// assert_eq!(delay_between("10:00", "09:55"), 0);
/// assert_eq!(delay_between("23:55", "00:05"), 10);
/// assert_eq!(delay_between("10:00", "Delayed"), 0);
/// ```
pub fn delay_between(scheduled: &str, estimated: &str) -> u32 {
    let (Ok(sched), Ok(est)) = (BoardTime::parse(scheduled), BoardTime::parse(estimated)) else {
        return 0;
    };

    let mut delta = i32::from(est.minutes_of_day()) - i32::from(sched.minutes_of_day());

    if delta < -ROLLOVER_THRESHOLD_MINUTES {
        delta += DAY_MINUTES;
    }

    delta.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(BoardTime::parse("00:00").unwrap().minutes_of_day(), 0);
        assert_eq!(BoardTime::parse("23:59").unwrap().minutes_of_day(), 1439);
        assert_eq!(BoardTime::parse("09:05").unwrap().minutes_of_day(), 545);
    }

    #[test]
    fn parse_rejects_bad_format() {
        assert!(BoardTime::parse("").is_err());
        assert!(BoardTime::parse("9:05").is_err());
        assert!(BoardTime::parse("0905").is_err());
        assert!(BoardTime::parse("09:5").is_err());
        assert!(BoardTime::parse("09-05").is_err());
        assert!(BoardTime::parse("ab:cd").is_err());
        assert!(BoardTime::parse("On time").is_err());
        assert!(BoardTime::parse("24:00").is_err());
        assert!(BoardTime::parse("12:60").is_err());
    }

    #[test]
    fn display_roundtrip() {
        for s in ["00:00", "09:05", "14:30", "23:59"] {
            assert_eq!(BoardTime::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn simple_delay() {
        assert_eq!(delay_between("10:00", "10:00"), 0);
        assert_eq!(delay_between("10:00", "10:01"), 1);
        assert_eq!(delay_between("10:00", "10:45"), 45);
        assert_eq!(delay_between("10:00", "12:00"), 120);
    }

    #[test]
    fn early_running_clamps_to_zero() {
        assert_eq!(delay_between("10:00", "09:58"), 0);
        assert_eq!(delay_between("10:00", "08:00"), 0);
    }

    #[test]
    fn midnight_rollover() {
        assert_eq!(delay_between("23:55", "00:05"), 10);
        assert_eq!(delay_between("23:30", "01:00"), 90);
    }

    #[test]
    fn rollover_threshold_boundary() {
        // 10 hours early exactly: treated as early-running, clamped
        assert_eq!(delay_between("20:00", "10:00"), 0);
        // Just past 10 hours early: treated as next-day
        assert_eq!(delay_between("20:00", "09:59"), 839);
    }

    #[test]
    fn unparseable_input_is_zero() {
        assert_eq!(delay_between("On time", "10:05"), 0);
        assert_eq!(delay_between("10:00", "Delayed"), 0);
        assert_eq!(delay_between("", ""), 0);
        assert_eq!(delay_between("10:00", "Cancelled"), 0);
    }
}
