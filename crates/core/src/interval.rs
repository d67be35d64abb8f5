// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run intervals derived from the job folder layout.
//!
//! An interval is "every N units", optionally anchored inside the unit:
//! `1hour/at0030` runs every hour at half past, `1day/at1345` runs daily at
//! 13:45. The next run is found by first trying to hit the anchor inside the
//! current unit, and only stepping a whole interval forward once the anchor
//! has already passed.

use crate::clock::Clock;
use crate::time_fmt::truncate_to_minute;
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Time unit of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Week,
}

impl Granularity {
    /// Folder suffix selecting this granularity (`15min`, `2hour`, ...).
    pub fn unit(self) -> &'static str {
        match self {
            Granularity::Minute => "min",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
        }
    }

    pub fn from_unit(unit: &str) -> Option<Self> {
        match unit {
            "min" => Some(Granularity::Minute),
            "hour" => Some(Granularity::Hour),
            "day" => Some(Granularity::Day),
            "week" => Some(Granularity::Week),
            _ => None,
        }
    }

    /// Length of `every` units, or `None` if it does not fit a `TimeDelta`.
    fn span(self, every: NonZeroU32) -> Option<TimeDelta> {
        let every = i64::from(every.get());
        match self {
            Granularity::Minute => TimeDelta::try_minutes(every),
            Granularity::Hour => TimeDelta::try_hours(every),
            Granularity::Day => TimeDelta::try_days(every),
            Granularity::Week => TimeDelta::try_weeks(every),
        }
    }
}

crate::simple_display! {
    Granularity {
        Minute => "minute",
        Hour => "hour",
        Day => "day",
        Week => "week",
    }
}

/// A validated `HHMM` value from an `atHHMM` folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtTime {
    hour: u32,
    minute: u32,
}

impl AtTime {
    /// Returns `None` unless `hour` is in `0..=23` and `minute` in `0..=59`.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }
}

/// Anchor point inside one unit of an interval's granularity.
///
/// Only the fields meaningful for the granularity exist: hourly intervals pin
/// the minute, daily and weekly intervals pin hour and minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    MinuteOfHour { minute: u32 },
    TimeOfDay { hour: u32, minute: u32 },
}

impl Anchor {
    /// Overwrite the anchored fields of `time`, leaving everything else.
    fn apply(self, time: NaiveDateTime) -> NaiveDateTime {
        let anchored = match self {
            Anchor::MinuteOfHour { minute } => time.with_minute(minute),
            Anchor::TimeOfDay { hour, minute } => {
                time.with_hour(hour).and_then(|t| t.with_minute(minute))
            }
        };
        anchored.unwrap_or(time)
    }
}

/// How often a job runs. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    granularity: Granularity,
    every: NonZeroU32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor: Option<Anchor>,
}

impl Interval {
    /// Every `every` units of `granularity`, with no anchor.
    pub fn new(granularity: Granularity, every: NonZeroU32) -> Self {
        Self { granularity, every, anchor: None }
    }

    /// Anchor the interval at `at`.
    ///
    /// Minute intervals have nothing to anchor and ignore it; hourly
    /// intervals only keep the minute.
    pub fn at(mut self, at: AtTime) -> Self {
        self.anchor = match self.granularity {
            Granularity::Minute => None,
            Granularity::Hour => Some(Anchor::MinuteOfHour { minute: at.minute }),
            Granularity::Day | Granularity::Week => {
                Some(Anchor::TimeOfDay { hour: at.hour, minute: at.minute })
            }
        };
        self
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn every(&self) -> u32 {
        self.every.get()
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    fn anchored(&self, time: NaiveDateTime) -> NaiveDateTime {
        match self.anchor {
            Some(anchor) => anchor.apply(time),
            None => time,
        }
    }

    /// Next scheduled time strictly after `last_run` (at minute resolution).
    ///
    /// If the anchor still lies ahead within the current unit it is returned
    /// directly; otherwise one full interval is added and the anchor
    /// re-applied. An anchor equal to the baseline counts as passed.
    pub fn next_after(&self, last_run: NaiveDateTime) -> NaiveDateTime {
        let baseline = truncate_to_minute(last_run);

        let candidate = self.anchored(baseline);
        if candidate > baseline {
            return candidate;
        }

        let advanced = self
            .granularity
            .span(self.every)
            .and_then(|span| baseline.checked_add_signed(span))
            .unwrap_or(NaiveDateTime::MAX);
        self.anchored(advanced)
    }

    /// Next scheduled time after `last_run`, or after now if it never ran.
    pub fn next_time<C: Clock>(&self, last_run: Option<NaiveDateTime>, clock: &C) -> NaiveDateTime {
        self.next_after(last_run.unwrap_or_else(|| clock.now()))
    }

    /// Preview of the next `n` scheduled times, starting from now.
    pub fn planned_schedule<C: Clock>(
        &self,
        n: usize,
        clock: &C,
    ) -> impl Iterator<Item = NaiveDateTime> + '_ {
        let first = self.next_time(None, clock);
        std::iter::successors(Some(first), move |prev| Some(self.next_after(*prev))).take(n)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let every = self.every.get();
        if every == 1 {
            write!(f, "every {}", self.granularity)?;
        } else {
            write!(f, "every {} {}s", every, self.granularity)?;
        }
        match self.anchor {
            Some(Anchor::MinuteOfHour { minute }) => write!(f, " at :{minute:02}"),
            Some(Anchor::TimeOfDay { hour, minute }) => write!(f, " at {hour:02}:{minute:02}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;
