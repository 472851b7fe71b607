use std::fmt;

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Weekday};

use crate::{Error, Result};

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// When a job fires, in local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Daily { at: NaiveTime },
    Weekly { weekday: Weekday, at: NaiveTime },
}

fn parse_time(at: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(at.trim(), "%H:%M")
        .map_err(|e| Error::Config(format!("invalid time '{}' (expected HH:MM): {}", at, e)))
}

impl Schedule {
    /// Every day at `at` ("HH:MM")
    pub fn daily(at: &str) -> Result<Self> {
        Ok(Schedule::Daily { at: parse_time(at)? })
    }

    /// Every `weekday` ("Mon".."Sun" or full name) at `at` ("HH:MM")
    pub fn weekly(weekday: &str, at: &str) -> Result<Self> {
        let weekday = weekday
            .trim()
            .parse::<Weekday>()
            .map_err(|_| Error::Config(format!("invalid weekday '{}'", weekday)))?;
        Ok(Schedule::Weekly {
            weekday,
            at: parse_time(at)?,
        })
    }

    /// First firing time strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Schedule::Daily { at } => {
                let candidate = now.date().and_time(at);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            Schedule::Weekly { weekday, at } => {
                let days_ahead = (7 + weekday.num_days_from_monday() as i64
                    - now.weekday().num_days_from_monday() as i64)
                    % 7;
                let candidate = (now.date() + Duration::days(days_ahead)).and_time(at);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
        }
    }

    /// Next firing time after `now` in the local time zone
    pub fn next_after_local(&self, now: DateTime<Local>) -> DateTime<Local> {
        self.next_after_in(&now)
    }

    /// Next firing time strictly after `now`, in `now`'s time zone.
    ///
    /// A firing time that falls into a DST gap moves forward by an hour. An
    /// ambiguous one only fires at its earlier instant, so a repeated hour
    /// never triggers the same slot twice.
    pub fn next_after_in<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut naive = now.naive_local();

        loop {
            let next = self.next_after(naive);
            let resolved = match tz.from_local_datetime(&next) {
                LocalResult::Single(t) => Some(t),
                LocalResult::Ambiguous(earliest, _) => Some(earliest),
                LocalResult::None => tz.from_local_datetime(&(next + Duration::hours(1))).earliest(),
            };

            if let Some(t) = resolved.filter(|t| t > now) {
                return t;
            }
            naive = next;
        }
    }

    /// How long to sleep from `now` until the next firing
    pub fn delay_from(&self, now: DateTime<Local>) -> std::time::Duration {
        (self.next_after_local(now) - now)
            .to_std()
            .unwrap_or_default()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Daily { at } => write!(f, "daily at {}", at.format("%H:%M")),
            Schedule::Weekly { weekday, at } => {
                write!(f, "every {} at {}", weekday, at.format("%H:%M"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_daily_later_today() {
        let schedule = Schedule::daily("03:00").unwrap();
        assert_eq!(
            schedule.next_after(at(2024, 3, 4, 1, 30, 0)),
            at(2024, 3, 4, 3, 0, 0)
        );
    }

    #[test]
    fn test_daily_rolls_to_tomorrow() {
        let schedule = Schedule::daily("03:00").unwrap();
        assert_eq!(
            schedule.next_after(at(2024, 3, 4, 3, 0, 0)),
            at(2024, 3, 5, 3, 0, 0)
        );
        assert_eq!(
            schedule.next_after(at(2024, 12, 31, 23, 59, 59)),
            at(2025, 1, 1, 3, 0, 0)
        );
    }

    #[test]
    fn test_weekly() {
        // 2024-03-04 is a Monday
        let schedule = Schedule::weekly("Sun", "04:00").unwrap();
        assert_eq!(
            schedule.next_after(at(2024, 3, 4, 12, 0, 0)),
            at(2024, 3, 10, 4, 0, 0)
        );
        // Sunday before the firing time fires the same day
        assert_eq!(
            schedule.next_after(at(2024, 3, 10, 3, 59, 0)),
            at(2024, 3, 10, 4, 0, 0)
        );
        // Sunday after the firing time waits a full week
        assert_eq!(
            schedule.next_after(at(2024, 3, 10, 4, 0, 0)),
            at(2024, 3, 17, 4, 0, 0)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Schedule::daily("25:00").is_err());
        assert!(Schedule::daily("noon").is_err());
        assert!(Schedule::weekly("Someday", "04:00").is_err());
        assert_eq!(
            Schedule::weekly("monday", "7:05").unwrap(),
            Schedule::Weekly {
                weekday: Weekday::Mon,
                at: NaiveTime::from_hms_opt(7, 5, 0).unwrap()
            }
        );
    }

    #[test]
    fn test_delay_is_positive_and_bounded() {
        let schedule = Schedule::daily("03:00").unwrap();
        let delay = schedule.delay_from(Local::now());
        assert!(delay > std::time::Duration::ZERO);
        assert!(delay <= std::time::Duration::from_secs(25 * 3600));
    }

    /// UTC+1 in winter, UTC+2 between the last Sundays of March and October 2024
    #[derive(Debug, Clone, Copy)]
    struct CentralEurope;

    fn hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    impl TimeZone for CentralEurope {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            CentralEurope
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid: Vec<FixedOffset> = [hours(2), hours(1)]
                .into_iter()
                .filter(|offset| {
                    let utc = *local - Duration::seconds(offset.local_minus_utc() as i64);
                    self.offset_from_utc_datetime(&utc) == *offset
                })
                .collect();
            match valid.as_slice() {
                [] => LocalResult::None,
                [only] => LocalResult::Single(*only),
                [summer, winter, ..] => LocalResult::Ambiguous(*summer, *winter),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc >= at(2024, 3, 31, 1, 0, 0) && *utc < at(2024, 10, 27, 1, 0, 0) {
                hours(2)
            } else {
                hours(1)
            }
        }
    }

    fn local(naive: NaiveDateTime) -> DateTime<CentralEurope> {
        CentralEurope.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_spring_gap_moves_forward_an_hour() {
        let schedule = Schedule::daily("02:30").unwrap();
        let next = schedule.next_after_in(&local(at(2024, 3, 31, 0, 0, 0)));

        assert_eq!(next.naive_local(), at(2024, 3, 31, 3, 30, 0));
        assert_eq!(*next.offset(), hours(2));
        assert_eq!(next.naive_utc(), at(2024, 3, 31, 1, 30, 0));
    }

    #[test]
    fn test_autumn_overlap_takes_earlier_instant() {
        let schedule = Schedule::daily("02:30").unwrap();
        let next = schedule.next_after_in(&local(at(2024, 10, 27, 0, 0, 0)));

        assert_eq!(next.naive_local(), at(2024, 10, 27, 2, 30, 0));
        assert_eq!(*next.offset(), hours(2));
    }

    #[test]
    fn test_autumn_overlap_fires_once() {
        let schedule = Schedule::daily("02:30").unwrap();

        // First pass through the repeated hour, after the firing time
        let after_first = local(at(2024, 10, 27, 2, 40, 0));
        assert_eq!(*after_first.offset(), hours(2));
        assert_eq!(
            schedule.next_after_in(&after_first).naive_local(),
            at(2024, 10, 28, 2, 30, 0)
        );

        // Second pass, before the wall-clock firing time: the slot already
        // fired during the first pass
        let second_pass = CentralEurope
            .from_local_datetime(&at(2024, 10, 27, 2, 10, 0))
            .latest()
            .unwrap();
        assert_eq!(*second_pass.offset(), hours(1));
        let next = schedule.next_after_in(&second_pass);
        assert_eq!(next.naive_local(), at(2024, 10, 28, 2, 30, 0));
        assert_eq!(*next.offset(), hours(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Schedule::daily("03:00").unwrap().to_string(), "daily at 03:00");
        assert_eq!(
            Schedule::weekly("Sun", "04:00").unwrap().to_string(),
            "every Sun at 04:00"
        );
    }
}
