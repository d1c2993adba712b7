//! Human-readable validity windows.
//!
//! Token lifetimes are configured as short phrases like `"5 days"` or
//! `"1 milliseconds"`. A [`Within`] keeps the phrase exactly as written, so it
//! can be shown back to the user in an "expired" message, alongside the
//! [`Duration`] used for the actual age check.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::WardenError;

/// A validity window such as `"5 days"`.
///
/// The accepted form is `<amount> <unit>`, where the unit is one of
/// `microsecond`, `millisecond`, `second`, `minute`, `hour`, `day`, `week`,
/// singular or plural, case-insensitive.
///
/// # Examples
///
/// ```
/// use warden_core::utils::within::Within;
///
/// let within: Within = "1 milliseconds".parse().unwrap();
/// assert_eq!(within.to_string(), "1 milliseconds");
/// assert_eq!(within.duration(), chrono::Duration::milliseconds(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Within {
    text: String,
    duration: Duration,
}

impl Within {
    /// Parses a window phrase.
    pub fn parse(text: &str) -> Result<Self, WardenError> {
        let invalid = || {
            WardenError::ConfigurationError(format!(
                "Invalid validity window '{text}': expected '<amount> <unit>', e.g. '5 days'"
            ))
        };

        let mut parts = text.split_whitespace();
        let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        if amount < 0 {
            return Err(invalid());
        }

        let unit = unit.to_ascii_lowercase();
        let duration = match unit.strip_suffix('s').unwrap_or(&unit) {
            "microsecond" => Some(Duration::microseconds(amount)),
            "millisecond" => Duration::try_milliseconds(amount),
            "second" => Duration::try_seconds(amount),
            "minute" => Duration::try_minutes(amount),
            "hour" => Duration::try_hours(amount),
            "day" => Duration::try_days(amount),
            "week" => Duration::try_weeks(amount),
            _ => return Err(invalid()),
        }
        .ok_or_else(invalid)?;

        Ok(Self {
            text: text.trim().to_string(),
            duration,
        })
    }

    /// A window of whole days, displayed as `"<n> days"`.
    pub fn days(n: u16) -> Self {
        Self {
            text: format!("{n} days"),
            duration: Duration::days(i64::from(n)),
        }
    }

    /// The window as a duration.
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// The window exactly as configured, for display.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for Within {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Within {
    type Error = WardenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Within> for String {
    fn from(value: Within) -> Self {
        value.text
    }
}

impl fmt::Display for Within {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plural_units() {
        assert_eq!(Within::parse("5 days").unwrap().duration(), Duration::days(5));
        assert_eq!(Within::parse("2 hours").unwrap().duration(), Duration::hours(2));
        assert_eq!(Within::parse("30 minutes").unwrap().duration(), Duration::minutes(30));
        assert_eq!(Within::parse("10 seconds").unwrap().duration(), Duration::seconds(10));
        assert_eq!(Within::parse("1 weeks").unwrap().duration(), Duration::weeks(1));
        assert_eq!(
            Within::parse("250 microseconds").unwrap().duration(),
            Duration::microseconds(250)
        );
    }

    #[test]
    fn test_parse_singular_units() {
        assert_eq!(
            Within::parse("1 millisecond").unwrap().duration(),
            Duration::milliseconds(1)
        );
        assert_eq!(Within::parse("1 day").unwrap().duration(), Duration::days(1));
    }

    #[test]
    fn test_days_constructor() {
        let within = Within::days(5);
        assert_eq!(within, Within::parse("5 days").unwrap());
    }

    #[test]
    fn test_display_keeps_original_text() {
        let within = Within::parse("1 milliseconds").unwrap();
        assert_eq!(within.to_string(), "1 milliseconds");
        assert_eq!(within.as_str(), "1 milliseconds");
    }

    #[test]
    fn test_case_insensitive_unit() {
        assert_eq!(Within::parse("3 Days").unwrap().duration(), Duration::days(3));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Within::parse("").is_err());
        assert!(Within::parse("days").is_err());
        assert!(Within::parse("5").is_err());
        assert!(Within::parse("five days").is_err());
        assert!(Within::parse("5 fortnights").is_err());
        assert!(Within::parse("5 days ago").is_err());
        assert!(Within::parse("-1 days").is_err());
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(Within::parse("9223372036854775807 weeks").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let within = Within::parse("5 days").unwrap();
        let json = serde_json::to_string(&within).unwrap();
        assert_eq!(json, "\"5 days\"");
        let back: Within = serde_json::from_str(&json).unwrap();
        assert_eq!(back, within);

        let bad: Result<Within, _> = serde_json::from_str("\"soon\"");
        assert!(bad.is_err());
    }
}
