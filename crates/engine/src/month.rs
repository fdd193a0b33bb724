//! Calendar month value type.
//!
//! A `Month` is the key of a budget and the window of a statement. Its
//! [`Month::range`] is the only place where a month is turned into a date
//! window, so listing, statements and stats cannot disagree on the edges.
//! Store queries use the equivalent closed form [`Month::start`] ..=
//! [`Month::last_instant`], whose bounds always carry a four-digit year.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{EngineError, ResultEngine};

/// A calendar month, formatted as `YYYY-MM`.
///
/// Ordering is chronological.
///
/// ```rust
/// use engine::Month;
///
/// let march: Month = "2024-03".parse().unwrap();
/// assert_eq!(march.to_string(), "2024-03");
/// assert_eq!(march.next().to_string(), "2024-04");
/// assert!("2024-13".parse::<Month>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Builds a month from its parts. `year` must have four digits.
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        if !(0..=9999).contains(&year) {
            return Err(EngineError::InvalidMonth(format!(
                "year {year} must have four digits"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidMonth(format!(
                "month {month} must be between 01 and 12"
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing the current UTC instant.
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    /// The month containing `at`, in UTC.
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    #[must_use]
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Midnight UTC of the first day of the month.
    pub fn start(self) -> DateTime<Utc> {
        let day = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Utc.from_utc_datetime(&day)
    }

    /// Half-open window `[first of month, first of next month)`, in UTC.
    pub fn range(self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start(), self.next().start())
    }

    /// Last representable instant of the month, one nanosecond before the
    /// next month starts.
    ///
    /// Timestamps are stored as RFC 3339 text, and the first instant after
    /// `9999-12` encodes as `+10000-01-01...`, which sorts before every
    /// `9999-...` value. An inclusive bound inside the month has no such edge.
    pub fn last_instant(self) -> DateTime<Utc> {
        self.next().start() - TimeDelta::nanoseconds(1)
    }

    /// `true` when `at` falls inside [`Month::range`].
    pub fn contains(self, at: DateTime<Utc>) -> bool {
        let (from, to) = self.range();
        from <= at && at < to
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = EngineError;

    /// Accepts exactly four digits, a hyphen and a month between `01` and `12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidMonth(format!("'{s}' is not in YYYY-MM format"));

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let (year, month) = (&s[..4], &s[5..]);
        if !year.bytes().all(|b| b.is_ascii_digit()) || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<&str> for Month {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn parse_accepts_valid_months() {
        let month: Month = "2024-03".parse().unwrap();
        assert_eq!((month.year(), month.month()), (2024, 3));
        assert_eq!("0001-12".parse::<Month>().unwrap().to_string(), "0001-12");
    }

    #[test]
    fn parse_rejects_malformed_months() {
        for raw in [
            "2024-13", "2024-00", "2024-3", "24-03", "2024/03", "2024-03-01", "", " 2024-03",
            "20a4-03", "2024-+3",
        ] {
            assert!(
                matches!(raw.parse::<Month>(), Err(EngineError::InvalidMonth(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn next_and_previous_wrap_years() {
        let december: Month = "2023-12".parse().unwrap();
        assert_eq!(december.next().to_string(), "2024-01");
        assert_eq!(december.next().previous(), december);
    }

    #[test]
    fn range_is_half_open() {
        let march: Month = "2024-03".parse().unwrap();
        let (from, to) = march.range();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());

        assert!(march.contains(from));
        assert!(march.contains(to - Duration::milliseconds(1)));
        assert!(!march.contains(to));
        assert!(!march.contains(from - Duration::milliseconds(1)));
    }

    #[test]
    fn last_instant_closes_the_range() {
        let march: Month = "2024-03".parse().unwrap();
        let last = march.last_instant();
        assert!(march.contains(last));
        assert!(!march.contains(last + Duration::nanoseconds(1)));
        assert_eq!(last + Duration::nanoseconds(1), march.range().1);
    }

    #[test]
    fn last_month_of_year_9999_keeps_four_digit_bounds() {
        let last: Month = "9999-12".parse().unwrap();
        let end = last.last_instant();
        assert_eq!(end.year(), 9999);
        assert!(end.to_rfc3339().starts_with("9999-12-31T23:59:59.999999999"));
        assert!(last.contains(Utc.with_ymd_and_hms(9999, 12, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn leap_february_ends_on_the_29th() {
        let february: Month = "2024-02".parse().unwrap();
        let last_day = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        assert!(february.contains(last_day));
        assert_eq!(Month::containing(last_day), february);
    }

    #[test]
    fn ordering_matches_text_ordering() {
        let mut months: Vec<Month> = ["2024-01", "2023-12", "2024-11"]
            .iter()
            .map(|m| m.parse().unwrap())
            .collect();
        months.sort();
        let text: Vec<String> = months.iter().map(ToString::to_string).collect();
        let mut sorted_text = text.clone();
        sorted_text.sort();
        assert_eq!(text, sorted_text);
    }
}
