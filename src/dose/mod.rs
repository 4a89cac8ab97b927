//! Dose-time computation.
//!
//! Given a medication's first-dose anchor and its repeat interval, derive the
//! time-of-day of every dose in one rolling 24-hour cycle. This is the pure
//! half of the scheduling engine — no clocks, no I/O, identical inputs always
//! produce identical output.

pub mod interval;

pub use interval::Interval;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A time-of-day at which a dose is due, minute-granular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoseTime {
    pub hour: u32,
    pub minute: u32,
}

impl DoseTime {
    /// Minutes since midnight, for circular distance math.
    fn minute_of_day(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

impl std::fmt::Display for DoseTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Compute the dose times for one 24-hour cycle.
///
/// Starts at `first_dose_at` and advances by `interval` until the cursor
/// reaches or passes the same moment one day later. The occurrence landing
/// exactly on the 24-hour horizon is excluded — it is the anchor's own
/// time-of-day again. Seconds on the anchor are ignored.
///
/// The result is sorted ascending by time-of-day (the anchor is not
/// necessarily first in the day) and is never empty.
pub fn compute_dose_times(first_dose_at: NaiveDateTime, interval: Interval) -> Vec<DoseTime> {
    let horizon = first_dose_at + chrono::Duration::hours(24);
    let mut cursor = first_dose_at;
    let mut times = Vec::new();

    loop {
        times.push(DoseTime {
            hour: cursor.hour(),
            minute: cursor.minute(),
        });
        cursor += interval.as_duration();
        if cursor >= horizon {
            break;
        }
    }

    times.sort_unstable();
    times.dedup();
    times
}

/// Pick the dose time closest to `now` by circular time-of-day distance.
///
/// 23:50 is ten minutes from a 00:00 dose, not twenty-three hours. Returns
/// `None` only for an empty slice.
pub fn nearest(times: &[DoseTime], now: NaiveTime) -> Option<DoseTime> {
    let now_min = i64::from(now.hour()) * 60 + i64::from(now.minute());

    times
        .iter()
        .copied()
        .min_by_key(|t| {
            let d = (t.minute_of_day() - now_min).rem_euclid(1440);
            d.min(1440 - d)
        })
}
