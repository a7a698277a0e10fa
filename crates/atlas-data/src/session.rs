//! Trading session gate.

use atlas_core::error::DataError;
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Exchange timezone used when none is configured.
pub const DEFAULT_SESSION_TZ: &str = "America/New_York";

/// Daily window in which bars are accepted, in local exchange time.
///
/// `start` is inclusive and `end` exclusive. A window whose end is before
/// its start wraps past midnight. Bar times are converted into `tz` before
/// the comparison, so the window follows daylight saving shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    start: NaiveTime,
    end: NaiveTime,
    tz: Tz,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, tz: Tz) -> Result<Self, DataError> {
        if start == end {
            return Err(DataError::ParseError(format!(
                "session window {} to {} is empty",
                start, end
            )));
        }
        Ok(Self { start, end, tz })
    }

    /// Parse `HH:MM` (or `HH:MM:SS`) bounds and an IANA timezone name.
    pub fn parse(start: &str, end: &str, timezone: &str) -> Result<Self, DataError> {
        let tz = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| DataError::ParseError(format!("unknown timezone '{}'", timezone)))?;
        Self::new(parse_time(start)?, parse_time(end)?, tz)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let t = at.with_timezone(&self.tz).time();
        if self.start < self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

impl fmt::Display for SessionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.tz.name()
        )
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, DataError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| DataError::ParseError(format!("invalid session time '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap()
    }

    fn summer(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_utc_window() {
        let rth = SessionWindow::parse("14:30", "21:00", "UTC").unwrap();
        assert!(!rth.contains(at(14, 29)));
        assert!(rth.contains(at(14, 30)));
        assert!(rth.contains(at(20, 59)));
        assert!(!rth.contains(at(21, 0)));
        assert_eq!(rth.to_string(), "14:30-21:00 UTC");
    }

    #[test]
    fn test_new_york_hours_follow_dst() {
        let rth = SessionWindow::parse("09:30", "16:00", DEFAULT_SESSION_TZ).unwrap();

        // EST, UTC-5
        assert!(!rth.contains(at(14, 15)));
        assert!(rth.contains(at(14, 45)));
        assert!(!rth.contains(at(21, 15)));

        // EDT, UTC-4
        assert!(rth.contains(summer(13, 45)));
        assert!(rth.contains(summer(19, 59)));
        assert!(!rth.contains(summer(20, 30)));
        assert!(!rth.contains(summer(13, 15)));

        assert_eq!(rth.to_string(), "09:30-16:00 America/New_York");
    }

    #[test]
    fn test_overnight_wrap() {
        let night = SessionWindow::parse("22:00", "02:00", "UTC").unwrap();
        assert!(night.contains(at(23, 0)));
        assert!(night.contains(at(1, 59)));
        assert!(!night.contains(at(2, 0)));
        assert!(!night.contains(at(12, 0)));
    }

    #[test]
    fn test_invalid() {
        assert!(SessionWindow::parse("25:00", "10:00", "UTC").is_err());
        assert!(SessionWindow::parse("9am", "10:00", "UTC").is_err());
        assert!(SessionWindow::parse("10:00", "10:00", "UTC").is_err());
        assert!(SessionWindow::parse("09:30", "16:00", "Mars/Olympus").is_err());
        assert!(SessionWindow::parse("09:30:00", "16:00", "UTC").is_ok());
    }
}
