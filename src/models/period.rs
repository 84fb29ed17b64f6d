//! Time bucket keys for aggregation
//!
//! Supports calendar months ("2025-01") and ISO-8601 weeks ("2025-W03").

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Granularity used when bucketing dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Month,
    IsoWeek,
}

/// Identifies the time bucket a dated record falls into
///
/// Serializes as its display label, e.g. `"2025-01"` or `"2025-W03"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BucketKey {
    /// Calendar month (month + year identity)
    Month { year: i32, month: u32 },

    /// ISO week, keyed by ISO week-year rather than calendar year
    IsoWeek { year: i32, week: u32 },
}

impl BucketKey {
    /// Create a monthly key
    pub fn month(year: i32, month: u32) -> Self {
        Self::Month { year, month }
    }

    /// Create an ISO week key
    pub fn iso_week(year: i32, week: u32) -> Self {
        Self::IsoWeek { year, week }
    }

    /// Key of the bucket containing `date`
    ///
    /// For ISO weeks the year is the ISO week-year, so 2024-12-30 maps to
    /// 2025-W01.
    pub fn for_date(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Month => Self::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::IsoWeek => {
                let iso = date.iso_week();
                Self::IsoWeek {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
        }
    }

    /// Get the current month according to local time
    pub fn current_month() -> Self {
        Self::for_date(chrono::Local::now().date_naive(), Granularity::Month)
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Month { .. } => Granularity::Month,
            Self::IsoWeek { .. } => Granularity::IsoWeek,
        }
    }

    /// Get the first date covered by this bucket
    pub fn start_date(&self) -> NaiveDate {
        let start = match self {
            Self::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
            Self::IsoWeek { year, week } => NaiveDate::from_isoywd_opt(*year, *week, Weekday::Mon),
        };
        start.unwrap_or(NaiveDate::MIN)
    }

    /// Get the last date covered by this bucket (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        self.next().start_date() - Duration::days(1)
    }

    /// Check if a date falls within this bucket
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Get the following bucket
    pub fn next(&self) -> Self {
        match *self {
            Self::Month { year, month: 12 } => Self::Month {
                year: year + 1,
                month: 1,
            },
            Self::Month { year, month } => Self::Month {
                year,
                month: month + 1,
            },
            Self::IsoWeek { year, week } if week >= weeks_in_iso_year(year) => Self::IsoWeek {
                year: year + 1,
                week: 1,
            },
            Self::IsoWeek { year, week } => Self::IsoWeek {
                year,
                week: week + 1,
            },
        }
    }

    /// Get the preceding bucket
    pub fn prev(&self) -> Self {
        match *self {
            Self::Month { year, month: 1 } => Self::Month {
                year: year - 1,
                month: 12,
            },
            Self::Month { year, month } => Self::Month {
                year,
                month: month - 1,
            },
            Self::IsoWeek { year, week: 1 } => Self::IsoWeek {
                year: year - 1,
                week: weeks_in_iso_year(year - 1),
            },
            Self::IsoWeek { year, week } => Self::IsoWeek {
                year,
                week: week - 1,
            },
        }
    }

    /// Parse a bucket key
    ///
    /// Formats:
    /// - Monthly: "2025-01"
    /// - Weekly: "2025-W03"
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let s = s.trim();
        let invalid = || PeriodParseError::InvalidFormat(s.to_string());

        if let Some((year, week)) = s.split_once("-W") {
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let week: u32 = week.parse().map_err(|_| invalid())?;
            if week == 0 || week > weeks_in_iso_year(year) {
                return Err(PeriodParseError::InvalidWeek(week));
            }
            return Ok(Self::IsoWeek { year, week });
        }

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(PeriodParseError::InvalidMonth(month));
        }

        Ok(Self::Month { year, month })
    }
}

/// Number of ISO weeks (52 or 53) in an ISO week-year
fn weeks_in_iso_year(year: i32) -> u32 {
    // December 28th always falls in the last ISO week of its year
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::IsoWeek { year, week } => write!(f, "{:04}-W{:02}", year, week),
        }
    }
}

impl From<BucketKey> for String {
    fn from(key: BucketKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for BucketKey {
    type Error = PeriodParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_date()
            .cmp(&other.start_date())
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Error type for bucket key parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodParseError {
    #[error("Invalid period format: {0}")]
    InvalidFormat(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
    #[error("Invalid ISO week: {0}")]
    InvalidWeek(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&BucketKey::iso_week(2025, 3)).unwrap();
        assert_eq!(json, "\"2025-W03\"");
        let key: BucketKey = serde_json::from_str("\"2024-11\"").unwrap();
        assert_eq!(key, BucketKey::month(2024, 11));
        assert!(serde_json::from_str::<BucketKey>("\"2024-13\"").is_err());
    }

    #[test]
    fn test_monthly_bounds() {
        let key = BucketKey::month(2024, 2);
        assert_eq!(key.start_date(), date(2024, 2, 1));
        assert_eq!(key.end_date(), date(2024, 2, 29));
        assert!(key.contains(date(2024, 2, 15)));
        assert!(!key.contains(date(2024, 3, 1)));
    }

    #[test]
    fn test_month_navigation_wraps_year() {
        assert_eq!(BucketKey::month(2024, 12).next(), BucketKey::month(2025, 1));
        assert_eq!(BucketKey::month(2025, 1).prev(), BucketKey::month(2024, 12));
    }

    #[test]
    fn test_iso_week_at_year_boundary() {
        // 2024-12-31 is a Tuesday in ISO week 1 of 2025
        assert_eq!(
            BucketKey::for_date(date(2024, 12, 31), Granularity::IsoWeek),
            BucketKey::iso_week(2025, 1)
        );
        // 2021-01-03 is a Sunday still in ISO week 53 of 2020
        assert_eq!(
            BucketKey::for_date(date(2021, 1, 3), Granularity::IsoWeek),
            BucketKey::iso_week(2020, 53)
        );
        assert_eq!(BucketKey::iso_week(2025, 1).start_date(), date(2024, 12, 30));
        assert_eq!(BucketKey::iso_week(2025, 1).end_date(), date(2025, 1, 5));
    }

    #[test]
    fn test_week_navigation() {
        assert_eq!(BucketKey::iso_week(2020, 53).next(), BucketKey::iso_week(2021, 1));
        assert_eq!(BucketKey::iso_week(2021, 1).prev(), BucketKey::iso_week(2020, 53));
        assert_eq!(BucketKey::iso_week(2024, 52).next(), BucketKey::iso_week(2025, 1));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(BucketKey::parse("2025-01").unwrap(), BucketKey::month(2025, 1));
        assert_eq!(BucketKey::parse("2025-W03").unwrap(), BucketKey::iso_week(2025, 3));
        assert_eq!(BucketKey::month(2025, 1).to_string(), "2025-01");
        assert_eq!(BucketKey::iso_week(2025, 3).to_string(), "2025-W03");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            BucketKey::parse("2025-13"),
            Err(PeriodParseError::InvalidMonth(13))
        );
        assert_eq!(
            BucketKey::parse("2025-W53"),
            Err(PeriodParseError::InvalidWeek(53))
        );
        assert!(BucketKey::parse("January").is_err());
    }

    #[test]
    fn test_chronological_ordering() {
        let mut keys = vec![
            BucketKey::month(2025, 1),
            BucketKey::month(2024, 11),
            BucketKey::month(2024, 12),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                BucketKey::month(2024, 11),
                BucketKey::month(2024, 12),
                BucketKey::month(2025, 1)
            ]
        );
    }
}
