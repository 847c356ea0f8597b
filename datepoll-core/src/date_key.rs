//! Canonical calendar-day identity.
//!
//! Every date that enters the system (clicked in a month grid, typed on the command
//! line, or read from a share link) is reduced to a `DateKey` before it is stored or
//! compared. Time of day and offset never take part in identity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DateParseError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time layouts without an offset. These are read as wall-clock time.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Anything that names a calendar day in its own calendar.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

/// Uses the calendar of the zone the value carries, not UTC.
impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// `YYYY-MM-DD` identity of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn canonicalize<D: CalendarDay>(date: &D) -> DateKey {
        DateKey(date.calendar_day())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<DateKey> {
        NaiveDate::from_ymd_opt(year, month, day).map(DateKey)
    }

    /// The calendar day an instant falls on in the machine's local zone.
    pub fn from_local(instant: &DateTime<Utc>) -> DateKey {
        Self::from_instant_in(instant, &Local)
    }

    pub fn from_instant_in<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> DateKey {
        DateKey(instant.with_timezone(tz).date_naive())
    }

    pub fn today() -> DateKey {
        Self::from_local(&Utc::now())
    }

    /// Parse a date-like string.
    ///
    /// Accepts `YYYY-MM-DD`, RFC 3339 date-times (converted into `tz` before the day is
    /// taken) and naive ISO-8601 date-times (taken as wall-clock time).
    pub fn parse_in<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<DateKey, DateParseError> {
        let s = s.trim();

        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(DateKey(date));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(DateKey(dt.with_timezone(tz).date_naive()));
        }

        NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|dt| DateKey(dt.date()))
            .ok_or_else(|| DateParseError::Invalid(s.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(date)
    }
}

impl From<NaiveDateTime> for DateKey {
    fn from(dt: NaiveDateTime) -> Self {
        DateKey::canonicalize(&dt)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateKey {
    fn from(dt: DateTime<Tz>) -> Self {
        DateKey::canonicalize(&dt)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// Parses using the local zone for date-times that carry an offset.
impl FromStr for DateKey {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateKey::parse_in(s, &Local)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map(DateKey)
            .map_err(|_| serde::de::Error::custom(DateParseError::Invalid(s)))
    }
}

/// A calendar month, as shown by one page of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<YearMonth> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| YearMonth { first })
    }

    pub fn containing(key: DateKey) -> YearMonth {
        YearMonth {
            first: key.date().with_day(1).unwrap_or(key.date()),
        }
    }

    pub fn current() -> YearMonth {
        Self::containing(DateKey::today())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// All days of the month in order.
    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        let month = self.first.month();
        self.first
            .iter_days()
            .take_while(move |d| d.month() == month)
            .map(DateKey)
    }

    pub fn days_in_month(&self) -> u32 {
        self.dates().count() as u32
    }

    /// Number of empty cells before day 1 in a Sunday-first week grid.
    pub fn first_weekday(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn previous(&self) -> Option<YearMonth> {
        self.first
            .checked_sub_months(chrono::Months::new(1))
            .map(|first| YearMonth { first })
    }

    pub fn next(&self) -> Option<YearMonth> {
        self.first
            .checked_add_months(chrono::Months::new(1))
            .map(|first| YearMonth { first })
    }

    /// Month name and year, e.g. "March 2024".
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

impl FromStr for YearMonth {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDate::parse_from_str(&format!("{s}-01"), DATE_FORMAT)
            .map(|first| YearMonth { first })
            .map_err(|_| DateParseError::Invalid(s.to_string()))
    }
}
