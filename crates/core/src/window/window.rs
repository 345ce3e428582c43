use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

use crate::show::TimeOfDay;

/// Stop times whose hour is at or below this are taken to fall after
/// midnight, on the next calendar day.
///
/// This cannot tell "12:30 today" from "00:30 tomorrow": a show that should
/// stop at 12:30 the same day runs until 12:30 the next day instead. Windows
/// that cross midnight also stop being recognised once the clock has passed
/// midnight, because both instants are recomputed from the current date.
pub const AFTER_MIDNIGHT_MAX_HOUR: u32 = 12;

/// Concrete start/stop instants of a show for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowWindow {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

fn time_of_day(time: TimeOfDay) -> NaiveTime {
    NaiveTime::MIN + TimeDelta::hours(time.hour as i64) + TimeDelta::minutes(time.minute as i64)
}

impl ShowWindow {
    /// Resolve the window for the calendar day of `now`. The start is taken at
    /// second zero, the stop at the last microsecond of its minute.
    pub fn for_today(start: TimeOfDay, stop: TimeOfDay, now: NaiveDateTime) -> Self {
        let today = now.date();
        let start = today.and_time(time_of_day(start));

        let mut stop_at = today.and_time(time_of_day(stop))
            + TimeDelta::seconds(59)
            + TimeDelta::microseconds(999_999);
        if stop.hour <= AFTER_MIDNIGHT_MAX_HOUR {
            stop_at += TimeDelta::days(1);
        }

        Self {
            start,
            stop: stop_at,
        }
    }

    /// Start inclusive, stop exclusive.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now < self.stop
    }
}

impl fmt::Display for ShowWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.stop.format("%Y-%m-%d %H:%M:%S%.6f")
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn tod(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn test_stop_after_midnight_is_next_day() {
        let window = ShowWindow::for_today(tod(22, 0), tod(0, 30), at(20, 21, 0));
        assert_eq!(window.start, at(20, 22, 0));
        assert_eq!(
            window.stop,
            NaiveDate::from_ymd_opt(2024, 12, 21)
                .unwrap()
                .and_hms_micro_opt(0, 30, 59, 999_999)
                .unwrap()
        );
    }

    #[test]
    fn test_stop_same_day() {
        let window = ShowWindow::for_today(tod(18, 0), tod(22, 0), at(20, 12, 0));
        assert_eq!(window.start, at(20, 18, 0));
        assert_eq!(
            window.stop,
            NaiveDate::from_ymd_opt(2024, 12, 20)
                .unwrap()
                .and_hms_micro_opt(22, 0, 59, 999_999)
                .unwrap()
        );
    }

    #[test]
    fn test_noon_stop_counts_as_after_midnight() {
        let window = ShowWindow::for_today(tod(9, 0), tod(12, 30), at(20, 8, 0));
        assert_eq!(window.stop.date(), NaiveDate::from_ymd_opt(2024, 12, 21).unwrap());
    }

    #[test]
    fn test_contains() {
        let window = ShowWindow::for_today(tod(18, 0), tod(0, 30), at(20, 12, 0));
        assert!(!window.contains(at(20, 17, 59)));
        assert!(window.contains(at(20, 18, 0)));
        assert!(window.contains(at(20, 23, 59)));
        assert!(window.contains(at(21, 0, 30)));
        assert!(!window.contains(at(21, 0, 31)));
    }

    #[test]
    fn test_year_end_rollover() {
        let now = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        let window = ShowWindow::for_today(tod(18, 0), tod(1, 0), now);
        assert_eq!(window.stop.date(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
