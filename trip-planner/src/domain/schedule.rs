//! Scheduled departures of route edges.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::{Money, RouteId, StopId};

/// Error returned when parsing an invalid days-of-week mask.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid days-of-week mask {0:?}: expected ISO weekday digits 1-7")]
pub struct InvalidDaysOfWeek(String);

/// Days on which a leg operates.
///
/// Serialized as a string of ISO weekday digits, e.g. `"135"` for
/// Monday, Wednesday and Friday.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    /// Operates every day.
    pub const EVERY_DAY: DaysOfWeek = DaysOfWeek(0b111_1111);

    /// Build a mask from weekdays.
    pub fn from_weekdays(days: &[Weekday]) -> Self {
        DaysOfWeek(
            days.iter()
                .fold(0, |acc, d| acc | (1 << d.num_days_from_monday())),
        )
    }

    /// Parse ISO weekday digits (`1` = Monday ... `7` = Sunday).
    pub fn parse(s: &str) -> Result<Self, InvalidDaysOfWeek> {
        let mut mask = 0u8;
        for c in s.chars() {
            match c.to_digit(10) {
                Some(d @ 1..=7) => mask |= 1 << (d - 1),
                _ => return Err(InvalidDaysOfWeek(s.to_string())),
            }
        }
        if mask == 0 {
            return Err(InvalidDaysOfWeek(s.to_string()));
        }
        Ok(DaysOfWeek(mask))
    }

    /// Whether the mask includes `day`.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }
}

impl TryFrom<String> for DaysOfWeek {
    type Error = InvalidDaysOfWeek;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DaysOfWeek::parse(&s)
    }
}

impl From<DaysOfWeek> for String {
    fn from(days: DaysOfWeek) -> Self {
        (0..7u8)
            .filter(|i| days.0 & (1 << i) != 0)
            .map(|i| char::from(b'1' + i))
            .collect()
    }
}

impl fmt::Debug for DaysOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DaysOfWeek({})", String::from(*self))
    }
}

/// A concrete departure instance of a route edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledLeg {
    pub route_id: RouteId,
    pub from: StopId,
    pub to: StopId,
    /// Local departure time.
    pub departure: NaiveTime,
    /// Local arrival time, on the departure day plus `arrival_day_offset`.
    pub arrival: NaiveTime,
    #[serde(default)]
    pub arrival_day_offset: u8,
    pub days: DaysOfWeek,
    /// Carrier's declared fare, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fare: Option<Money>,
    #[serde(default)]
    pub capacity: u32,
}

impl ScheduledLeg {
    /// Whether this leg operates on `date`.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.days.contains(date.weekday())
    }

    /// Departure instant when boarding on `date`.
    pub fn departure_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.departure)
    }

    /// Arrival instant when boarding on `date`.
    pub fn arrival_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.arrival) + Duration::days(i64::from(self.arrival_day_offset))
    }

    /// Scheduled in-vehicle time.
    pub fn duration(&self) -> Duration {
        let base = NaiveDate::MIN;
        self.arrival_on(base) - self.departure_on(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(dep: &str, arr: &str, offset: u8, days: &str) -> ScheduledLeg {
        ScheduledLeg {
            route_id: RouteId::parse("R7").unwrap(),
            from: StopId::parse("a").unwrap(),
            to: StopId::parse("b").unwrap(),
            departure: NaiveTime::parse_from_str(dep, "%H:%M").unwrap(),
            arrival: NaiveTime::parse_from_str(arr, "%H:%M").unwrap(),
            arrival_day_offset: offset,
            days: DaysOfWeek::parse(days).unwrap(),
            fare: None,
            capacity: 100,
        }
    }

    #[test]
    fn parse_days() {
        let days = DaysOfWeek::parse("135").unwrap();
        assert!(days.contains(Weekday::Mon));
        assert!(!days.contains(Weekday::Tue));
        assert!(days.contains(Weekday::Wed));
        assert!(days.contains(Weekday::Fri));
        assert_eq!(String::from(days), "135");

        assert!(DaysOfWeek::parse("").is_err());
        assert!(DaysOfWeek::parse("08").is_err());
    }

    #[test]
    fn from_weekdays_matches_parse() {
        let a = DaysOfWeek::from_weekdays(&[Weekday::Sat, Weekday::Sun]);
        assert_eq!(a, DaysOfWeek::parse("67").unwrap());
    }

    #[test]
    fn runs_on_checks_weekday() {
        // 2025-03-03 is a Monday
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let l = leg("10:00", "12:00", 0, "1");
        assert!(l.runs_on(monday));
        assert!(!l.runs_on(monday.succ_opt().unwrap()));
    }

    #[test]
    fn overnight_duration() {
        let l = leg("22:30", "03:15", 1, "1234567");
        assert_eq!(l.duration(), Duration::minutes(285));

        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(l.arrival_on(date).date(), date.succ_opt().unwrap());
    }
}
