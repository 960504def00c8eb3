//! Recurring report windows.
//!
//! Two independent schedules bound what a report counts:
//!
//! - the **summary week** starts at the weekly trader rollover (by default
//!   Tuesday 19:00 UTC);
//! - the **raffle week** ends at the ticket deadline, a weekday and wall-clock
//!   time in a named time zone (by default Friday 20:00 `US/Eastern`). The
//!   deadline follows that zone's daylight saving rules; use `UTC` for a
//!   deadline that never moves.
//!
//! Both calculations are pure functions of `now` and the schedule.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::EngineError;

/// Inclusive span between two instants. `start <= end` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Builds a window, swapping the bounds if they are given in reverse.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Which summary week to report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryWeek {
    /// From the latest rollover until now.
    #[default]
    This,
    /// The full week that ended at the latest rollover.
    Last,
    /// Everything up to now.
    All,
}

impl FromStr for SummaryWeek {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "this" => Ok(Self::This),
            "last" => Ok(Self::Last),
            "all" => Ok(Self::All),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown week {other:?} (expected this, last or all)"
            ))),
        }
    }
}

/// Which raffle round to report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaffleRound {
    /// From the latest deadline until now.
    #[default]
    Current,
    /// The round that closed at the latest deadline.
    Final,
}

/// Weekly rollover of the summary week, in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SummarySchedule {
    pub weekday: Weekday,
    pub rollover: NaiveTime,
}

impl Default for SummarySchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Tue,
            rollover: NaiveTime::MIN + TimeDelta::hours(19),
        }
    }
}

impl SummarySchedule {
    /// The latest rollover that is not after `now`.
    pub fn last_rollover(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut reference = now;
        let mut offset = days_since(reference.weekday(), self.weekday);
        // Before today's rollover the current week began on the previous
        // anchor day.
        if offset == 0 && reference.time() < self.rollover {
            reference -= TimeDelta::days(1);
            offset = days_since(reference.weekday(), self.weekday);
        }
        let day = reference.date_naive() - TimeDelta::days(offset);
        day.and_time(self.rollover).and_utc()
    }

    pub fn window(&self, now: DateTime<Utc>, week: SummaryWeek) -> TimeWindow {
        let boundary = self.last_rollover(now);
        match week {
            SummaryWeek::This => TimeWindow::new(boundary, now),
            SummaryWeek::Last => TimeWindow::new(boundary - TimeDelta::days(7), boundary),
            SummaryWeek::All => TimeWindow::new(DateTime::<Utc>::UNIX_EPOCH, now),
        }
    }
}

/// Weekly raffle ticket deadline, as wall-clock time in `timezone`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleSchedule {
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub timezone: Tz,
}

impl Default for RaffleSchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Fri,
            time: NaiveTime::MIN + TimeDelta::hours(20),
            timezone: chrono_tz::US::Eastern,
        }
    }
}

impl RaffleSchedule {
    /// The latest deadline that is not after `now`.
    pub fn last_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_now = now.with_timezone(&self.timezone);
        let today = local_now.date_naive();
        let offset = days_since(local_now.weekday(), self.weekday);

        let deadline = self.deadline_on(today - TimeDelta::days(offset));
        if offset == 0 && deadline > now {
            return self.deadline_on(today - TimeDelta::days(7));
        }
        deadline
    }

    pub fn window(&self, now: DateTime<Utc>, round: RaffleRound) -> TimeWindow {
        let deadline = self.last_deadline(now);
        match round {
            RaffleRound::Current => TimeWindow::new(deadline, now),
            RaffleRound::Final => {
                let local_day = deadline.with_timezone(&self.timezone).date_naive();
                TimeWindow::new(self.deadline_on(local_day - TimeDelta::days(7)), deadline)
            }
        }
    }

    /// The deadline instant on a local calendar day.
    ///
    /// A wall-clock time repeated by a DST fall-back resolves to its first
    /// occurrence; one skipped by a spring-forward uses the offset in force
    /// before the jump.
    fn deadline_on(&self, day: NaiveDate) -> DateTime<Utc> {
        let local = day.and_time(self.time);
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(instant) => instant.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let before = local - TimeDelta::days(1);
                let offset = self
                    .timezone
                    .offset_from_local_datetime(&before)
                    .earliest()
                    .map(|offset| offset.fix())
                    .unwrap_or_else(|| self.timezone.offset_from_utc_datetime(&local).fix());
                (local - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
            }
        }
    }
}

/// Whole days from the latest `anchor` weekday back to `day` (0..=6).
fn days_since(day: Weekday, anchor: Weekday) -> i64 {
    let day = i64::from(day.num_days_from_monday());
    let anchor = i64::from(anchor.num_days_from_monday());
    (day - anchor).rem_euclid(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn raffle(weekday: Weekday, hour: u32, minute: u32, timezone: Tz) -> RaffleSchedule {
        RaffleSchedule {
            weekday,
            time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            timezone,
        }
    }

    #[test]
    fn summary_after_rollover_starts_today() {
        let schedule = SummarySchedule::default();
        // Tuesday 20:00
        let now = utc(2024, 3, 5, 20, 0);
        let window = schedule.window(now, SummaryWeek::This);
        assert_eq!(window.start(), utc(2024, 3, 5, 19, 0));
        assert_eq!(window.end(), now);
    }

    #[test]
    fn summary_before_rollover_on_anchor_day_uses_previous_week() {
        let schedule = SummarySchedule::default();
        let now = utc(2024, 3, 5, 10, 0);
        assert_eq!(
            schedule.window(now, SummaryWeek::This).start(),
            utc(2024, 2, 27, 19, 0)
        );

        let last = schedule.window(now, SummaryWeek::Last);
        assert_eq!(last.start(), utc(2024, 2, 20, 19, 0));
        assert_eq!(last.end(), utc(2024, 2, 27, 19, 0));
    }

    #[test]
    fn summary_on_other_days() {
        let schedule = SummarySchedule::default();
        assert_eq!(
            schedule.last_rollover(utc(2024, 3, 6, 1, 0)),
            utc(2024, 3, 5, 19, 0)
        );
        assert_eq!(
            schedule.last_rollover(utc(2024, 3, 4, 23, 0)),
            utc(2024, 2, 27, 19, 0)
        );
    }

    #[test]
    fn summary_exactly_at_rollover() {
        let schedule = SummarySchedule::default();
        let now = utc(2024, 3, 5, 19, 0);
        let window = schedule.window(now, SummaryWeek::This);
        assert_eq!(window.start(), now);
        assert_eq!(window.end(), now);
    }

    #[test]
    fn summary_all_reaches_back_to_epoch() {
        let now = utc(2024, 3, 5, 19, 0);
        let window = SummarySchedule::default().window(now, SummaryWeek::All);
        assert_eq!(window.start(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(window.end(), now);
    }

    #[test]
    fn raffle_before_deadline_on_deadline_day_uses_previous_week() {
        let schedule = RaffleSchedule::default();
        // Friday 10:00 EST
        let now = utc(2024, 3, 8, 15, 0);
        let window = schedule.window(now, RaffleRound::Current);
        assert_eq!(window.start(), utc(2024, 3, 2, 1, 0));
        assert_eq!(window.end(), now);
    }

    #[test]
    fn raffle_uses_local_weekday() {
        // Saturday 00:30 UTC is still Friday 19:30 in New York.
        let schedule = RaffleSchedule::default();
        assert_eq!(
            schedule.last_deadline(utc(2024, 3, 9, 0, 30)),
            utc(2024, 3, 2, 1, 0)
        );
        // Friday 21:00 EST
        assert_eq!(
            schedule.last_deadline(utc(2024, 3, 9, 2, 0)),
            utc(2024, 3, 9, 1, 0)
        );
    }

    #[test]
    fn raffle_exactly_at_deadline() {
        let schedule = RaffleSchedule::default();
        let now = utc(2024, 3, 9, 1, 0);
        let window = schedule.window(now, RaffleRound::Current);
        assert_eq!(window.start(), now);
        assert_eq!(window.end(), now);
    }

    #[test]
    fn raffle_final_round_spans_daylight_saving_change() {
        // DST starts Sunday 2024-03-10; the deadline moves from 01:00 to 00:00 UTC.
        let schedule = RaffleSchedule::default();
        let window = schedule.window(utc(2024, 3, 16, 12, 0), RaffleRound::Final);
        assert_eq!(window.start(), utc(2024, 3, 9, 1, 0));
        assert_eq!(window.end(), utc(2024, 3, 16, 0, 0));
    }

    #[test]
    fn raffle_in_utc_does_not_shift() {
        let schedule = raffle(Weekday::Sat, 0, 0, chrono_tz::UTC);
        assert_eq!(
            schedule.last_deadline(utc(2024, 3, 16, 12, 0)),
            utc(2024, 3, 16, 0, 0)
        );
        assert_eq!(
            schedule.last_deadline(utc(2024, 3, 9, 12, 0)),
            utc(2024, 3, 9, 0, 0)
        );
    }

    #[test]
    fn repeated_local_time_takes_first_occurrence() {
        // 01:30 happens twice on 2024-11-03 in New York.
        let schedule = raffle(Weekday::Sun, 1, 30, chrono_tz::US::Eastern);
        assert_eq!(
            schedule.last_deadline(utc(2024, 11, 3, 12, 0)),
            utc(2024, 11, 3, 5, 30)
        );
    }

    #[test]
    fn skipped_local_time_uses_offset_before_the_gap() {
        // 02:30 does not exist on 2024-03-10 in New York.
        let schedule = raffle(Weekday::Sun, 2, 30, chrono_tz::US::Eastern);
        assert_eq!(
            schedule.last_deadline(utc(2024, 3, 10, 12, 0)),
            utc(2024, 3, 10, 7, 30)
        );
    }

    #[test]
    fn windows_are_ordered_and_repeatable() {
        let summary = SummarySchedule::default();
        let raffle = RaffleSchedule::default();
        let mut now = utc(2024, 3, 1, 0, 0);
        while now < utc(2024, 3, 22, 0, 0) {
            for week in [SummaryWeek::This, SummaryWeek::Last, SummaryWeek::All] {
                let window = summary.window(now, week);
                assert!(window.start() <= window.end());
                assert_eq!(window, summary.window(now, week));
            }
            for round in [RaffleRound::Current, RaffleRound::Final] {
                let window = raffle.window(now, round);
                assert!(window.start() <= window.end());
                assert!(window.end() <= now);
                assert_eq!(window, raffle.window(now, round));
            }
            now += TimeDelta::minutes(30);
        }
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let window = TimeWindow::new(utc(2024, 1, 2, 0, 0), utc(2024, 1, 1, 0, 0));
        assert_eq!(window.start(), utc(2024, 1, 1, 0, 0));
        assert!(window.contains(utc(2024, 1, 1, 12, 0)));
        assert!(window.contains(utc(2024, 1, 2, 0, 0)));
        assert!(!window.contains(utc(2024, 1, 2, 0, 1)));
    }

    #[test]
    fn week_names_parse() {
        assert_eq!("This".parse::<SummaryWeek>().unwrap(), SummaryWeek::This);
        assert_eq!("last".parse::<SummaryWeek>().unwrap(), SummaryWeek::Last);
        assert!("next".parse::<SummaryWeek>().is_err());
    }
}
