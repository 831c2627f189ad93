//! GeneralizedTime and UTCTime calendar strings
//!
//! Both types are transferred as restricted character strings:
//!
//! ```text
//! GeneralizedTime  YYYYMMDDHH[MM[SS]][(.|,)fff...][Z|(+|-)HHMM]
//! UTCTime          YYMMDDHHMM[SS](Z|(+|-)HHMM)
//! ```

use crate::error::{BerError, BerResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static GENERALIZED_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([0-9]{4})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})?([0-9]{2})?(?:[.,]([0-9]{1,9}))?(Z|[+-][0-9]{4})?$",
    )
    .expect("static pattern")
});

static UTC_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})?(Z|[+-][0-9]{4})$")
        .expect("static pattern")
});

/// Time zone designation of a calendar string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOffset {
    /// No designator: local time
    Local,
    /// `Z` designator
    Utc,
    /// Explicit offset from UTC in minutes
    Minutes(i16),
}

impl TimeOffset {
    fn parse(designator: Option<&str>) -> BerResult<Self> {
        match designator {
            None => Ok(TimeOffset::Local),
            Some("Z") => Ok(TimeOffset::Utc),
            Some(text) => {
                let sign: i16 = if text.starts_with('-') { -1 } else { 1 };
                let hours = two_digits(&text[1..3]);
                let minutes = two_digits(&text[3..5]);
                if hours > 23 || minutes > 59 {
                    return Err(BerError::InvalidData(format!(
                        "Invalid time zone offset {}",
                        text
                    )));
                }
                Ok(TimeOffset::Minutes(sign * (hours as i16 * 60 + minutes as i16)))
            }
        }
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOffset::Local => Ok(()),
            TimeOffset::Utc => f.write_str(" UTC"),
            TimeOffset::Minutes(m) => {
                let sign = if *m < 0 { '-' } else { '+' };
                write!(f, " UTC{}{:02}{:02}", sign, m.abs() / 60, m.abs() % 60)
            }
        }
    }
}

/// Decoded GeneralizedTime value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralizedTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    /// Fraction digits of the least significant unit present
    pub fraction: Option<String>,
    pub offset: TimeOffset,
}

impl GeneralizedTime {
    /// Parse the character content of a GeneralizedTime
    pub fn parse(text: &str) -> BerResult<Self> {
        let caps = GENERALIZED_TIME.captures(text).ok_or_else(|| {
            BerError::InvalidData(format!("GeneralizedTime invalid format: {}", text))
        })?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str());

        let year = field(1).map(four_digits).unwrap_or_default();
        let month = field(2).map(two_digits).unwrap_or_default();
        let day = field(3).map(two_digits).unwrap_or_default();
        let hour = field(4).map(two_digits).unwrap_or_default();
        let minute = field(5).map(two_digits);
        let second = field(6).map(two_digits);
        if second.is_some() && minute.is_none() {
            return Err(BerError::InvalidData(format!(
                "GeneralizedTime invalid format: {}",
                text
            )));
        }

        check_calendar(month, day, hour, minute, second)?;

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            fraction: field(7).map(str::to_string),
            offset: TimeOffset::parse(field(8))?,
        })
    }
}

impl fmt::Display for GeneralizedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}",
            self.year, self.month, self.day, self.hour
        )?;
        if let Some(minute) = self.minute {
            write!(f, ":{:02}", minute)?;
        }
        if let Some(second) = self.second {
            write!(f, ":{:02}", second)?;
        }
        if let Some(fraction) = &self.fraction {
            write!(f, ".{}", fraction)?;
        }
        write!(f, "{}", self.offset)
    }
}

/// Decoded UTCTime value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTime {
    /// Four-digit year (two-digit years 50-99 map to 19xx, 00-49 to 20xx)
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: Option<u8>,
    pub offset: TimeOffset,
}

impl UtcTime {
    /// Parse the character content of a UTCTime
    pub fn parse(text: &str) -> BerResult<Self> {
        let caps = UTC_TIME.captures(text).ok_or_else(|| {
            BerError::InvalidData(format!("UTCTime invalid format: {}", text))
        })?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str());

        let yy = field(1).map(two_digits).unwrap_or_default() as u16;
        let year = if yy >= 50 { 1900 + yy } else { 2000 + yy };
        let month = field(2).map(two_digits).unwrap_or_default();
        let day = field(3).map(two_digits).unwrap_or_default();
        let hour = field(4).map(two_digits).unwrap_or_default();
        let minute = field(5).map(two_digits).unwrap_or_default();
        let second = field(6).map(two_digits);

        check_calendar(month, day, hour, Some(minute), second)?;

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            offset: TimeOffset::parse(field(7))?,
        })
    }
}

impl fmt::Display for UtcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )?;
        if let Some(second) = self.second {
            write!(f, ":{:02}", second)?;
        }
        write!(f, "{}", self.offset)
    }
}

fn check_calendar(
    month: u8,
    day: u8,
    hour: u8,
    minute: Option<u8>,
    second: Option<u8>,
) -> BerResult<()> {
    let valid = (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && hour <= 23
        && minute.is_none_or(|m| m <= 59)
        // 60 allows for a leap second
        && second.is_none_or(|s| s <= 60);
    if valid {
        Ok(())
    } else {
        Err(BerError::InvalidData(format!(
            "Calendar field out of range: month {} day {} hour {}",
            month, day, hour
        )))
    }
}

// Inputs are regex-validated ASCII digits.
fn two_digits(text: &str) -> u8 {
    text.bytes().fold(0u8, |acc, b| acc * 10 + (b - b'0'))
}

fn four_digits(text: &str) -> u16 {
    text.bytes().fold(0u16, |acc, b| acc * 10 + (b - b'0') as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generalized_time_full() {
        let t = GeneralizedTime::parse("20240115123045.123Z").unwrap();
        assert_eq!(t.year, 2024);
        assert_eq!(t.month, 1);
        assert_eq!(t.day, 15);
        assert_eq!(t.minute, Some(30));
        assert_eq!(t.second, Some(45));
        assert_eq!(t.fraction.as_deref(), Some("123"));
        assert_eq!(t.offset, TimeOffset::Utc);
        assert_eq!(t.to_string(), "2024-01-15 12:30:45.123 UTC");
    }

    #[test]
    fn test_generalized_time_local_hour_only() {
        let t = GeneralizedTime::parse("1999123123").unwrap();
        assert_eq!(t.minute, None);
        assert_eq!(t.offset, TimeOffset::Local);
        assert_eq!(t.to_string(), "1999-12-31 23");
    }

    #[test]
    fn test_generalized_time_offset() {
        let t = GeneralizedTime::parse("20240115123045-0130").unwrap();
        assert_eq!(t.offset, TimeOffset::Minutes(-90));
        assert_eq!(t.to_string(), "2024-01-15 12:30:45 UTC-0130");
    }

    #[test]
    fn test_generalized_time_invalid() {
        assert!(GeneralizedTime::parse("2024011").is_err());
        assert!(GeneralizedTime::parse("20241315123045Z").is_err());
        assert!(GeneralizedTime::parse("20240115253045Z").is_err());
        assert!(GeneralizedTime::parse("20240115123045+2500").is_err());
        assert!(GeneralizedTime::parse("2024011512304xZ").is_err());
    }

    #[test]
    fn test_utc_time() {
        let t = UtcTime::parse("991231235959Z").unwrap();
        assert_eq!(t.year, 1999);
        assert_eq!(t.second, Some(59));
        let t = UtcTime::parse("2401151230+0200").unwrap();
        assert_eq!(t.year, 2024);
        assert_eq!(t.second, None);
        assert_eq!(t.offset, TimeOffset::Minutes(120));
        assert_eq!(t.to_string(), "2024-01-15 12:30 UTC+0200");
    }

    #[test]
    fn test_utc_time_requires_zone() {
        assert!(UtcTime::parse("991231235959").is_err());
        assert!(UtcTime::parse("990231235960Z").is_ok());
        assert!(UtcTime::parse("990000235959Z").is_err());
    }
}
