// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::interval::{Granularity, Interval};
use chrono::{NaiveDate, NaiveDateTime};
use std::num::NonZeroU32;

/// Local timestamp at minute precision.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    at_hms(year, month, day, hour, minute, 0)
}

/// Local timestamp at second precision.
pub fn at_hms(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .unwrap_or_default()
}

/// Non-zero multiplier; zero is bumped to one.
pub fn every(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

pub fn minutely() -> Interval {
    Interval::new(Granularity::Minute, NonZeroU32::MIN)
}

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for schedule types.
pub mod strategies {
    use super::every;
    use crate::interval::{AtTime, Granularity, Interval};
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    pub fn arb_granularity() -> impl Strategy<Value = Granularity> {
        prop_oneof![
            Just(Granularity::Minute),
            Just(Granularity::Hour),
            Just(Granularity::Day),
            Just(Granularity::Week),
        ]
    }

    pub fn arb_at_time() -> impl Strategy<Value = AtTime> {
        (0u32..24, 0u32..60).prop_filter_map("valid at time", |(h, m)| AtTime::new(h, m))
    }

    pub fn arb_unanchored_interval() -> impl Strategy<Value = Interval> {
        (arb_granularity(), 1u32..500).prop_map(|(g, n)| Interval::new(g, every(n)))
    }

    pub fn arb_interval() -> impl Strategy<Value = Interval> {
        (arb_unanchored_interval(), proptest::option::of(arb_at_time())).prop_map(
            |(interval, at)| match at {
                Some(at) => interval.at(at),
                None => interval,
            },
        )
    }

    /// Timestamps between 2000 and 2099 with second precision.
    pub fn arb_datetime() -> impl Strategy<Value = NaiveDateTime> {
        (2000i32..2100, 1u32..13, 1u32..29, 0u32..24, 0u32..60, 0u32..60).prop_filter_map(
            "valid datetime",
            |(y, mo, d, h, mi, s)| {
                NaiveDate::from_ymd_opt(y, mo, d).and_then(|date| date.and_hms_opt(h, mi, s))
            },
        )
    }
}
