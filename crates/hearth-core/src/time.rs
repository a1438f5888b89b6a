//! Calendar identifiers for an instant in the household's time zone.
//!
//! Three keys drive every due-date and aggregation decision:
//!
//! | Key | Format | Example |
//! |---|---|---|
//! | date key | `YYYY-MM-DD` | `2024-03-06` |
//! | weekday key | `mon`..`sun` | `wed` |
//! | week key | `YYYY-Www` | `2024-W10` |
//!
//! All arithmetic happens on local calendar dates after the instant has been
//! projected into the zone, so DST transitions can never shift a date.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};

/// Day of week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// Zero-based offset from Monday.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Mon => 0,
            Self::Tue => 1,
            Self::Wed => 2,
            Self::Thu => 3,
            Self::Fri => 4,
            Self::Sat => 5,
            Self::Sun => 6,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }

    #[must_use]
    pub const fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Mon,
            chrono::Weekday::Tue => Self::Tue,
            chrono::Weekday::Wed => Self::Wed,
            chrono::Weekday::Thu => Self::Thu,
            chrono::Weekday::Fri => Self::Fri,
            chrono::Weekday::Sat => Self::Sat,
            chrono::Weekday::Sun => Self::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a weekday key cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWeekdayError(pub String);

impl fmt::Display for ParseWeekdayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid weekday: '{}'", self.0)
    }
}

impl std::error::Error for ParseWeekdayError {}

impl FromStr for Weekday {
    type Err = ParseWeekdayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| normalized.starts_with(day.as_str()))
            .ok_or_else(|| ParseWeekdayError(s.to_string()))
    }
}

/// Parse an IANA zone name such as `America/Mexico_City`.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| HearthError::InvalidTimeZone(name.to_string()))
}

/// Calendar date of `instant` as observed in `tz`.
#[must_use]
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// `YYYY-MM-DD` for `instant` in `tz`.
#[must_use]
pub fn date_key(instant: DateTime<Utc>, tz: Tz) -> String {
    format_date_key(local_date(instant, tz))
}

/// Weekday of `instant` in `tz`.
#[must_use]
pub fn dow_key(instant: DateTime<Utc>, tz: Tz) -> Weekday {
    Weekday::from_chrono(local_date(instant, tz).weekday())
}

/// `YYYY-Www` for `instant` in `tz`. See [`week_key_for_date`].
#[must_use]
pub fn week_key(instant: DateTime<Utc>, tz: Tz) -> String {
    week_key_for_date(local_date(instant, tz))
}

/// Week key of a calendar date, weeks starting Monday.
///
/// The key's year is the year of the week's Monday. The week number counts
/// from that year's first Monday, found by moving January 1 back to the
/// same-or-preceding Monday, so week 1 may begin in December.
#[must_use]
pub fn week_key_for_date(date: NaiveDate) -> String {
    let monday = monday_of(date);
    let year = monday.year();
    let first_monday = NaiveDate::from_ymd_opt(year, 1, 1).map_or(monday, monday_of);
    let week = (monday - first_monday).num_days().div_euclid(7) + 1;
    format!("{year}-W{week:02}")
}

/// Monday of the week containing `date`.
#[must_use]
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let offset = Weekday::from_chrono(date.weekday()).index();
    date - Duration::days(i64::from(offset))
}

#[must_use]
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[must_use]
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Shift a date key by `days`. Returns `None` for malformed keys.
#[must_use]
pub fn add_days(key: &str, days: i64) -> Option<String> {
    parse_date_key(key)
        .and_then(|date| date.checked_add_signed(Duration::days(days)))
        .map(format_date_key)
}

/// Per-request calendar snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeContext {
    pub tz: Tz,
    pub now: DateTime<Utc>,
    pub date_key: String,
    pub week_key: String,
    pub dow: Weekday,
}

impl TimeContext {
    #[must_use]
    pub fn resolve(now: DateTime<Utc>, tz: Tz) -> Self {
        let date = local_date(now, tz);
        Self {
            tz,
            now,
            date_key: format_date_key(date),
            week_key: week_key_for_date(date),
            dow: Weekday::from_chrono(date.weekday()),
        }
    }

    /// Context for local noon of `date`.
    #[must_use]
    pub fn at_local_noon(date: NaiveDate, tz: Tz) -> Self {
        let naive = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
        let now = tz
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc));
        Self::resolve(now, tz)
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        local_date(self.now, self.tz)
    }

    /// Days of the current week up to and including today (1..=7).
    #[must_use]
    pub const fn days_elapsed(&self) -> u32 {
        self.dow.index() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn date_key_uses_local_calendar() {
        let tz = parse_time_zone("America/Mexico_City").expect("zone");
        // 03:00 UTC is still the previous evening in Mexico City.
        let instant = utc("2024-03-07T03:00:00Z");
        assert_eq!(date_key(instant, tz), "2024-03-06");
        assert_eq!(dow_key(instant, tz), Weekday::Wed);
    }

    #[test]
    fn week_one_starts_on_january_first_monday() {
        // 2024-01-01 is a Monday.
        assert_eq!(week_key_for_date(date(2024, 1, 1)), "2024-W01");
        assert_eq!(week_key_for_date(date(2024, 1, 7)), "2024-W01");
        assert_eq!(week_key_for_date(date(2024, 1, 8)), "2024-W02");
    }

    #[test]
    fn sunday_before_new_year_keeps_previous_year() {
        // 2023-12-31 is a Sunday, the last day of the week starting Dec 25.
        // 2023's first Monday is 2022-12-26, so that week is number 53.
        assert_eq!(week_key_for_date(date(2023, 12, 31)), "2023-W53");
        assert_eq!(week_key_for_date(date(2023, 12, 25)), "2023-W53");
        assert_ne!(week_key_for_date(date(2023, 12, 31)), week_key_for_date(date(2024, 1, 1)));
    }

    #[test]
    fn week_straddling_new_year_shares_one_key() {
        // 2026-01-01 is a Thursday; its week starts Monday 2025-12-29.
        let key = week_key_for_date(date(2026, 1, 1));
        assert_eq!(key, "2025-W53");
        assert_eq!(week_key_for_date(date(2025, 12, 29)), key);
        assert_eq!(week_key_for_date(date(2026, 1, 4)), key);
        assert_eq!(week_key_for_date(date(2026, 1, 5)), "2026-W02");
    }

    #[test]
    fn week_key_is_stable_across_dst_change() {
        let tz = parse_time_zone("America/New_York").expect("zone");
        // DST starts 2024-03-10 02:00 local.
        let before = utc("2024-03-10T06:30:00Z");
        let after = utc("2024-03-10T08:30:00Z");
        assert_eq!(date_key(before, tz), "2024-03-10");
        assert_eq!(date_key(after, tz), "2024-03-10");
        assert_eq!(week_key(before, tz), week_key(after, tz));
    }

    #[test]
    fn weekday_parses_short_and_long_forms() {
        assert_eq!("mon".parse::<Weekday>(), Ok(Weekday::Mon));
        assert_eq!(" Friday ".parse::<Weekday>(), Ok(Weekday::Fri));
        assert!("xyz".parse::<Weekday>().is_err());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let err = parse_time_zone("Mars/Olympus").expect_err("must fail");
        assert!(matches!(err, HearthError::InvalidTimeZone(_)));
    }

    #[test]
    fn add_days_crosses_month_boundary() {
        assert_eq!(add_days("2024-02-28", 2).as_deref(), Some("2024-03-01"));
        assert_eq!(add_days("not-a-date", 1), None);
    }

    #[test]
    fn context_counts_elapsed_days() {
        let tz = parse_time_zone("UTC").expect("zone");
        let ctx = TimeContext::at_local_noon(date(2024, 3, 6), tz);
        assert_eq!(ctx.dow, Weekday::Wed);
        assert_eq!(ctx.days_elapsed(), 3);
        assert_eq!(ctx.date_key, "2024-03-06");
        assert_eq!(ctx.week_key, "2024-W10");
    }
}
