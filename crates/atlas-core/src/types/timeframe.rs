//! Timeframe definitions for market data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-width bar timeframe, stored as a whole number of seconds.
///
/// Parses strings like `1min`, `30m`, `3h`, `1d`. Display uses the canonical
/// `<n>min` / `<n>h` / `<n>d` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    secs: u64,
}

impl Timeframe {
    pub const MINUTE_1: Timeframe = Timeframe { secs: 60 };
    pub const MINUTE_5: Timeframe = Timeframe { secs: 300 };
    pub const MINUTE_15: Timeframe = Timeframe { secs: 900 };
    pub const MINUTE_30: Timeframe = Timeframe { secs: 1800 };
    pub const HOUR_1: Timeframe = Timeframe { secs: 3600 };
    pub const HOUR_3: Timeframe = Timeframe { secs: 10800 };
    pub const DAILY: Timeframe = Timeframe { secs: 86400 };

    /// Create a timeframe from a number of seconds. Returns `None` for zero.
    pub fn from_secs(secs: u64) -> Option<Self> {
        (secs > 0).then_some(Self { secs })
    }

    /// Create a timeframe spanning `n` minutes.
    pub fn minutes(n: u64) -> Option<Self> {
        Self::from_secs(n.checked_mul(60)?)
    }

    /// Get the duration of the timeframe in seconds.
    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    /// Get the duration of the timeframe in milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.secs as i64 * 1000
    }

    /// Get the timeframe as a chrono duration.
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.secs as i64)
    }

    /// Whether `self` can be built by aggregating whole bars of `base`.
    pub fn is_multiple_of(&self, base: Timeframe) -> bool {
        self.secs >= base.secs && self.secs % base.secs == 0
    }

    /// Canonical bucket start containing `time`: `floor(time, duration)` measured
    /// from the Unix epoch.
    pub fn bucket_start(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        let width = self.as_millis();
        let millis = time.timestamp_millis();
        let floored = millis - millis.rem_euclid(width);
        DateTime::from_timestamp_millis(floored).unwrap_or(time)
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::MINUTE_1
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secs % 86400 == 0 {
            write!(f, "{}d", self.secs / 86400)
        } else if self.secs % 3600 == 0 {
            write!(f, "{}h", self.secs / 3600)
        } else if self.secs % 60 == 0 {
            write!(f, "{}min", self.secs / 60)
        } else {
            write!(f, "{}s", self.secs)
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(split);

        let count: u64 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| format!("Invalid timeframe: {}", s))?
        };

        let unit_secs = match unit {
            "s" | "sec" | "secs" | "second" | "seconds" => 1,
            "m" | "min" | "mins" | "minute" | "minutes" => 60,
            "h" | "hr" | "hour" | "hours" => 3600,
            "d" | "day" | "days" | "daily" => 86400,
            _ => return Err(format!("Invalid timeframe: {}", s)),
        };

        count
            .checked_mul(unit_secs)
            .and_then(Timeframe::from_secs)
            .ok_or_else(|| format!("Invalid timeframe: {}", s))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::MINUTE_1.as_secs(), 60);
        assert_eq!(Timeframe::HOUR_3.as_secs(), 10800);
        assert_eq!(Timeframe::DAILY.as_millis(), 86_400_000);
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!(Timeframe::from_str("1min").unwrap(), Timeframe::MINUTE_1);
        assert_eq!(Timeframe::from_str("30min").unwrap(), Timeframe::MINUTE_30);
        assert_eq!(Timeframe::from_str("30m").unwrap(), Timeframe::MINUTE_30);
        assert_eq!(Timeframe::from_str("3h").unwrap(), Timeframe::HOUR_3);
        assert_eq!(Timeframe::from_str("1d").unwrap(), Timeframe::DAILY);
        assert!(Timeframe::from_str("0min").is_err());
        assert!(Timeframe::from_str("3 weeks").is_err());
    }

    #[test]
    fn test_timeframe_display() {
        assert_eq!(Timeframe::MINUTE_1.to_string(), "1min");
        assert_eq!(Timeframe::HOUR_3.to_string(), "3h");
        assert_eq!(Timeframe::DAILY.to_string(), "1d");
    }

    #[test]
    fn test_is_multiple_of() {
        assert!(Timeframe::MINUTE_30.is_multiple_of(Timeframe::MINUTE_1));
        assert!(Timeframe::HOUR_3.is_multiple_of(Timeframe::MINUTE_30));
        assert!(!Timeframe::MINUTE_1.is_multiple_of(Timeframe::MINUTE_5));
        assert!(!Timeframe::minutes(45).unwrap().is_multiple_of(Timeframe::MINUTE_30));
    }

    #[test]
    fn test_bucket_start() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 14, 47, 0).unwrap();
        assert_eq!(
            Timeframe::MINUTE_30.bucket_start(t),
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap()
        );
        assert_eq!(
            Timeframe::HOUR_3.bucket_start(t),
            Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Timeframe::MINUTE_30).unwrap();
        assert_eq!(json, "\"30min\"");
        let parsed: Timeframe = serde_json::from_str("\"3h\"").unwrap();
        assert_eq!(parsed, Timeframe::HOUR_3);
    }
}
