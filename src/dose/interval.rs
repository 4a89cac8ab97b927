//! Repeat intervals and alarm windows as validated minute durations.
//!
//! Accepts human-friendly strings like `8h`, `90m`, `1h30m`, `1d`. Everything
//! is minute-granular: dose triggers carry hour/minute only, so sub-minute
//! precision has nothing to attach to.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// A strictly positive, whole-minute duration.
///
/// Used both as the spacing between consecutive doses and as the length of
/// the intrusive-reminder window after each dose. A zero or negative value is
/// unconstructible — the dose-time loop advances by this amount and must
/// always make progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Interval(i64);

impl Interval {
    /// 30 minutes — the default alarm-window length.
    pub const DEFAULT_WINDOW: Interval = Interval(30);

    /// Build from a whole number of minutes.
    pub fn from_minutes(minutes: i64) -> Result<Self, String> {
        if minutes <= 0 {
            return Err(format!("interval must be positive, got {minutes}m"));
        }
        Ok(Self(minutes))
    }

    /// Build from a (possibly fractional) number of hours, truncated to
    /// minute granularity: `0.5` → 30 minutes, `8.0` → 480 minutes.
    pub fn from_hours(hours: f64) -> Result<Self, String> {
        if !hours.is_finite() {
            return Err(format!("interval must be a finite number of hours, got {hours}"));
        }
        Self::from_minutes((hours * 60.0) as i64)
    }

    /// Parse a human-friendly duration string.
    ///
    /// Supported unit suffixes: `m` (minutes), `h` (hours), `d` (days).
    /// Units can be combined: `1h30m`, `1d12h`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty interval string".into());
        }

        let mut total_mins: i64 = 0;
        let mut digits = String::new();
        let mut found_any = false;

        for ch in s.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
            } else {
                if digits.is_empty() {
                    return Err(format!("unexpected '{ch}' without a preceding number"));
                }
                let n: i64 = digits
                    .parse()
                    .map_err(|_| format!("number too large: {digits}"))?;
                digits.clear();

                let multiplier = match ch {
                    'm' => 1,
                    'h' => 60,
                    'd' => 1440,
                    _ => return Err(format!("unknown unit '{ch}', expected m/h/d")),
                };
                total_mins += n * multiplier;
                found_any = true;
            }
        }

        if !digits.is_empty() {
            return Err(format!("trailing digits without unit: {digits}"));
        }

        if !found_any {
            return Err("no interval units found".into());
        }

        Self::from_minutes(total_mins)
    }

    /// Total minutes.
    pub fn minutes(&self) -> i64 {
        self.0
    }

    /// As a `chrono::Duration` for timestamp arithmetic.
    pub fn as_duration(&self) -> Duration {
        Duration::minutes(self.0)
    }
}

impl TryFrom<i64> for Interval {
    type Error = String;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<Interval> for i64 {
    fn from(interval: Interval) -> i64 {
        interval.0
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = self.0 / 60;
        let mins = self.0 % 60;
        match (hours, mins) {
            (0, m) => write!(f, "{m}m"),
            (h, 0) => write!(f, "{h}h"),
            (h, m) => write!(f, "{h}h{m}m"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(Interval::parse("30m").unwrap().minutes(), 30);
    }

    #[test]
    fn test_parse_hours() {
        assert_eq!(Interval::parse("8h").unwrap().minutes(), 480);
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(Interval::parse("1d").unwrap().minutes(), 1440);
    }

    #[test]
    fn test_parse_compound_hm() {
        assert_eq!(Interval::parse("1h30m").unwrap().minutes(), 90);
    }

    #[test]
    fn test_parse_compound_dh() {
        assert_eq!(Interval::parse("1d12h").unwrap().minutes(), 2160);
    }

    #[test]
    fn test_parse_with_whitespace_trimmed() {
        assert_eq!(Interval::parse("  6h  ").unwrap().minutes(), 360);
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(Interval::parse("").is_err());
    }

    #[test]
    fn test_parse_no_suffix_fails() {
        let err = Interval::parse("30").unwrap_err();
        assert!(err.contains("trailing digits"), "got: {err}");
    }

    #[test]
    fn test_parse_bad_suffix_fails() {
        let err = Interval::parse("30x").unwrap_err();
        assert!(err.contains("unknown unit"), "got: {err}");
    }

    #[test]
    fn test_parse_seconds_rejected() {
        // Sub-minute units are meaningless for hour/minute triggers.
        assert!(Interval::parse("90s").is_err());
    }

    #[test]
    fn test_parse_zero_fails() {
        let err = Interval::parse("0m").unwrap_err();
        assert!(err.contains("positive"), "got: {err}");
    }

    #[test]
    fn test_parse_leading_suffix_fails() {
        assert!(Interval::parse("m30").is_err());
    }

    #[test]
    fn test_from_hours_fractional() {
        assert_eq!(Interval::from_hours(0.5).unwrap().minutes(), 30);
        assert_eq!(Interval::from_hours(1.0).unwrap().minutes(), 60);
    }

    #[test]
    fn test_from_hours_truncates_to_minutes() {
        // 0.505h = 30.3 minutes — truncated, not rounded.
        assert_eq!(Interval::from_hours(0.505).unwrap().minutes(), 30);
    }

    #[test]
    fn test_from_hours_zero_fails() {
        assert!(Interval::from_hours(0.0).is_err());
    }

    #[test]
    fn test_from_hours_negative_fails() {
        assert!(Interval::from_hours(-4.0).is_err());
    }

    #[test]
    fn test_from_hours_nan_fails() {
        assert!(Interval::from_hours(f64::NAN).is_err());
    }

    #[test]
    fn test_from_minutes_negative_fails() {
        assert!(Interval::from_minutes(-5).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::from_minutes(30).unwrap().to_string(), "30m");
        assert_eq!(Interval::from_minutes(480).unwrap().to_string(), "8h");
        assert_eq!(Interval::from_minutes(90).unwrap().to_string(), "1h30m");
    }

    #[test]
    fn test_serde_roundtrip() {
        let interval = Interval::parse("6h").unwrap();
        let json = serde_json::to_string(&interval).unwrap();
        assert_eq!(json, "360");
        let parsed: Interval = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, interval);
    }

    #[test]
    fn test_serde_rejects_zero() {
        assert!(serde_json::from_str::<Interval>("0").is_err());
    }

    #[test]
    fn test_serde_rejects_negative() {
        assert!(serde_json::from_str::<Interval>("-60").is_err());
    }
}
