//! Time arithmetic for countdowns and reminder thresholds.
//!
//! Everything here is pure: callers pass in `now` so the same functions
//! drive both the live loop and virtual-time tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

/// How often the countdown is advanced, in milliseconds.
pub const POLL_INTERVAL_MS: i64 = 60_000;

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Whole hours and minutes of a duration. Seconds are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursMinutes {
    pub hours: i64,
    pub minutes: i64,
}

impl HoursMinutes {
    /// True when less than a full minute remains.
    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }
}

/// Split a millisecond count into floored hours and minutes.
///
/// Negative input never reaches here from the countdown (it only holds
/// positive values) and is treated as zero.
pub fn split_duration(ms: i64) -> HoursMinutes {
    let ms = ms.max(0);
    HoursMinutes {
        hours: ms / MS_PER_HOUR,
        minutes: (ms % MS_PER_HOUR) / MS_PER_MINUTE,
    }
}

/// The instant `offset_minutes` before `hour:minute:00.000` on `day`, in
/// the zone `tz`.
///
/// Returns `None` when that wall-clock time does not exist in `tz`
/// (a daylight-saving gap). Ambiguous times resolve to the earlier instant.
pub fn reminder_threshold<Tz: TimeZone>(
    tz: &Tz,
    day: NaiveDate,
    hour: u32,
    minute: u32,
    offset_minutes: u32,
) -> Option<DateTime<Tz>> {
    let at = day.and_hms_opt(hour, minute, 0)?;
    let event = tz.from_local_datetime(&at).earliest()?;
    Some(event - Duration::minutes(i64::from(offset_minutes)))
}

/// `a - b` in milliseconds. Positive when `a` is later than `b`.
pub fn signed_delta<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> i64 {
    a.clone().signed_duration_since(b.clone()).num_milliseconds()
}

/// Upper-case the first character of an event name.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Status text for the next event, e.g. `Asr in 1h 5m` or `Asr in 42m`.
pub fn format_countdown(name: &str, remaining_ms: i64) -> String {
    let HoursMinutes { hours, minutes } = split_duration(remaining_ms);
    if hours == 0 {
        format!("{} in {minutes}m", capitalize(name))
    } else {
        format!("{} in {hours}h {minutes}m", capitalize(name))
    }
}
