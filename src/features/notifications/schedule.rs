//! Wall-clock triggers evaluated in the user's time zone
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: DST-aware next-fire computation (gaps skipped, ambiguous hours handled)
//! - 1.0.0: Daily, weekly and hourly triggers

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("invalid weekday {0}, expected 0 (Monday) to 6 (Sunday)")]
    InvalidWeekday(u8),
}

/// A time of day such as `08:00`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub hour: u32,
    pub minute: u32,
}

impl LocalTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `HH:MM` (a single-digit hour is accepted)
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let invalid = || ScheduleError::InvalidTime(raw.to_string());
        let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }

    fn on(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        date.and_hms_opt(self.hour, self.minute, 0)
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Settings store weekdays as 0 = Monday .. 6 = Sunday
pub fn weekday_from_index(index: u8) -> Result<Weekday, ScheduleError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(ScheduleError::InvalidWeekday(other)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Daily(LocalTime),
    Weekly { weekday: Weekday, at: LocalTime },
    /// Every hour at this minute past the (local) hour
    Hourly { minute: u32 },
}

impl Trigger {
    /// First instant strictly after `after` matching this trigger in `tz`.
    ///
    /// Daily and weekly triggers skip days where the local time falls in a DST
    /// gap and use the earlier instant when it is ambiguous. Hourly triggers
    /// fire once per real hour, so a repeated local hour fires twice.
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        match *self {
            Trigger::Daily(at) => next_on_days(after, tz, at, |_| true),
            Trigger::Weekly { weekday, at } => {
                next_on_days(after, tz, at, |date| date.weekday() == weekday)
            }
            Trigger::Hourly { minute } => next_hourly(after, tz, minute),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Daily(at) => write!(f, "daily at {at}"),
            Trigger::Weekly { weekday, at } => write!(f, "every {weekday} at {at}"),
            Trigger::Hourly { minute } => write!(f, "hourly at :{minute:02}"),
        }
    }
}

fn next_on_days<F>(after: DateTime<Utc>, tz: Tz, at: LocalTime, matches: F) -> Option<DateTime<Utc>>
where
    F: Fn(NaiveDate) -> bool,
{
    let start = after.with_timezone(&tz).date_naive();
    // Two weeks covers a weekly trigger whose first candidate lands in a DST gap
    (0..=14)
        .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
        .filter(|date| matches(*date))
        .filter_map(|date| at.on(date))
        .filter_map(|naive| match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => Some(t),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => None,
        })
        .map(|t| t.with_timezone(&Utc))
        .find(|t| *t > after)
}

fn next_hourly(after: DateTime<Utc>, tz: Tz, minute: u32) -> Option<DateTime<Utc>> {
    let local = after.with_timezone(&tz).naive_local();
    let hour_start = local.date().and_hms_opt(local.hour(), minute, 0)?;

    for offset in 0..=48 {
        let naive = hour_start + Duration::hours(offset);
        let candidates = match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => vec![t],
            LocalResult::Ambiguous(first, second) => vec![first, second],
            LocalResult::None => vec![],
        };
        if let Some(found) = candidates
            .into_iter()
            .map(|t| t.with_timezone(&Utc))
            .find(|t| *t > after)
        {
            return Some(found);
        }
    }
    None
}

/// UTC instant at which the local calendar day `date` begins in `tz`
pub fn local_day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    // Some zones skip midnight on DST days; take the first hour that exists
    for hour in 0..24 {
        if let Some(naive) = date.and_hms_opt(hour, 0, 0) {
            if let Some(t) = tz.from_local_datetime(&naive).earliest() {
                return t.with_timezone(&Utc);
            }
        }
    }
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Warsaw;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_parse_local_time() {
        assert_eq!(LocalTime::parse("08:00").unwrap(), LocalTime { hour: 8, minute: 0 });
        assert_eq!(LocalTime::parse("7:05").unwrap(), LocalTime { hour: 7, minute: 5 });
        assert_eq!(LocalTime::parse(" 21:30 ").unwrap().to_string(), "21:30");
        for bad in ["24:00", "12:60", "noon", "12", "12:5", ":30", "123:00", "-1:00"] {
            assert!(LocalTime::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_weekday_index() {
        assert_eq!(weekday_from_index(0).unwrap(), Weekday::Mon);
        assert_eq!(weekday_from_index(6).unwrap(), Weekday::Sun);
        assert_eq!(weekday_from_index(7), Err(ScheduleError::InvalidWeekday(7)));
    }

    #[test]
    fn test_daily_later_today_and_tomorrow() {
        // Warsaw is UTC+1 in January
        let trigger = Trigger::Daily(LocalTime::new(8, 0).unwrap());
        let before = utc(2026, 1, 10, 6, 0); // 07:00 local
        assert_eq!(trigger.next_after(before, Warsaw), Some(utc(2026, 1, 10, 7, 0)));

        let exactly = utc(2026, 1, 10, 7, 0);
        assert_eq!(trigger.next_after(exactly, Warsaw), Some(utc(2026, 1, 11, 7, 0)));
    }

    #[test]
    fn test_daily_across_local_midnight() {
        // 23:00 UTC on the 10th is already the 11th in Warsaw
        let trigger = Trigger::Daily(LocalTime::new(0, 15).unwrap());
        let after = utc(2026, 1, 10, 23, 0); // 00:00 local on the 11th
        assert_eq!(trigger.next_after(after, Warsaw), Some(utc(2026, 1, 10, 23, 15)));
    }

    #[test]
    fn test_weekly_picks_configured_weekday() {
        // 2026-01-10 is a Saturday
        let trigger = Trigger::Weekly {
            weekday: Weekday::Sun,
            at: LocalTime::new(18, 0).unwrap(),
        };
        let after = utc(2026, 1, 10, 12, 0);
        assert_eq!(trigger.next_after(after, Warsaw), Some(utc(2026, 1, 11, 17, 0)));

        let after_firing = utc(2026, 1, 11, 17, 0);
        assert_eq!(trigger.next_after(after_firing, Warsaw), Some(utc(2026, 1, 18, 17, 0)));
    }

    #[test]
    fn test_hourly_at_top_of_hour() {
        let trigger = Trigger::Hourly { minute: 0 };
        assert_eq!(
            trigger.next_after(utc(2026, 1, 10, 6, 20), Warsaw),
            Some(utc(2026, 1, 10, 7, 0))
        );
        assert_eq!(
            trigger.next_after(utc(2026, 1, 10, 7, 0), Warsaw),
            Some(utc(2026, 1, 10, 8, 0))
        );
    }

    #[test]
    fn test_hourly_in_half_hour_zone() {
        // Kolkata is UTC+5:30, so local :00 is UTC :30
        let trigger = Trigger::Hourly { minute: 0 };
        assert_eq!(
            trigger.next_after(utc(2026, 1, 10, 6, 0), chrono_tz::Asia::Kolkata),
            Some(utc(2026, 1, 10, 6, 30))
        );
    }

    #[test]
    fn test_daily_in_spring_forward_gap_skips_day() {
        // Warsaw jumps 02:00 -> 03:00 on 2026-03-29
        let trigger = Trigger::Daily(LocalTime::new(2, 30).unwrap());
        let after = utc(2026, 3, 28, 12, 0);
        // 02:30 on the 30th is CEST (UTC+2)
        assert_eq!(trigger.next_after(after, Warsaw), Some(utc(2026, 3, 30, 0, 30)));
    }

    #[test]
    fn test_daily_in_fall_back_uses_earliest() {
        // Warsaw repeats 02:00-03:00 on 2026-10-25
        let trigger = Trigger::Daily(LocalTime::new(2, 30).unwrap());
        let after = utc(2026, 10, 24, 12, 0);
        assert_eq!(trigger.next_after(after, Warsaw), Some(utc(2026, 10, 25, 0, 30)));
        // After the first occurrence it moves to the next day, not the repeat
        assert_eq!(
            trigger.next_after(utc(2026, 10, 25, 0, 30), Warsaw),
            Some(utc(2026, 10, 26, 1, 30))
        );
    }

    #[test]
    fn test_hourly_fires_through_repeated_hour() {
        let trigger = Trigger::Hourly { minute: 0 };
        // 00:00 UTC on 2026-10-25 is 02:00 CEST, the first 02:00
        let first = trigger.next_after(utc(2026, 10, 24, 23, 30), Warsaw).unwrap();
        assert_eq!(first, utc(2026, 10, 25, 0, 0));
        // The second 02:00 (CET) is one real hour later
        let second = trigger.next_after(first, Warsaw).unwrap();
        assert_eq!(second, utc(2026, 10, 25, 1, 0));
    }

    #[test]
    fn test_local_day_start() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        // Summer: UTC+2
        assert_eq!(local_day_start(date, Warsaw), utc(2026, 6, 30, 22, 0));
    }
}
