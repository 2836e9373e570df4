//! Provider response shapes and their translation into a [`Schedule`].
//!
//! Two shapes are accepted. The monthly shape is canonical:
//!
//! ```json
//! { "zone": "JHR04", "year": 2026, "month": "OCT",
//!   "prayers": [ { "day": 18, "hijri": "1448-04-27",
//!                  "fajr": 1760735100, "syuruk": 1760739420, "dhuhr": 1760761560,
//!                  "asr": 1760774520, "maghrib": 1760783160, "isha": 1760787540 } ] }
//! ```
//!
//! The legacy shape lists today's times as `HH:MM` strings with Malay names:
//!
//! ```json
//! { "data": { "zon": [ { "waktu_solat": [ { "name": "subuh", "time": "05:50" } ] } ] } }
//! ```

use chrono::{Datelike, Local, NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;

use super::{Event, Schedule, anchor};
use crate::error::FetchError;

/// Any response shape the provider has been seen to return.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProviderResponse {
    Monthly(MonthlyResponse),
    Legacy(LegacyResponse),
}

/// One month of epoch-second timestamps per day.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyResponse {
    #[serde(default)]
    pub zone: Option<String>,
    pub prayers: Vec<DayEntry>,
}

/// A single day of the monthly shape. Non-event fields (`syuruk`, `hijri`)
/// are deserialized but never become events.
#[derive(Debug, Clone, Deserialize)]
pub struct DayEntry {
    pub day: u32,
    #[serde(default)]
    pub hijri: Option<String>,
    #[serde(default)]
    pub fajr: Option<i64>,
    #[serde(default)]
    pub syuruk: Option<i64>,
    #[serde(default)]
    pub dhuhr: Option<i64>,
    #[serde(default)]
    pub asr: Option<i64>,
    #[serde(default)]
    pub maghrib: Option<i64>,
    #[serde(default)]
    pub isha: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyResponse {
    pub data: LegacyData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyData {
    #[serde(default)]
    pub zon: Vec<LegacyZone>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyZone {
    #[serde(default)]
    pub waktu_solat: Vec<LegacyTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTime {
    pub name: String,
    pub time: String,
}

impl ProviderResponse {
    /// Translate into today's schedule.
    pub fn into_schedule(self, today: NaiveDate) -> Result<Schedule, FetchError> {
        let schedule = match self {
            Self::Monthly(monthly) => monthly.into_schedule(today)?,
            Self::Legacy(legacy) => legacy.into_schedule(today)?,
        };
        if schedule.is_empty() {
            return Err(FetchError::EmptySchedule);
        }
        Ok(schedule)
    }
}

impl MonthlyResponse {
    fn into_schedule(self, today: NaiveDate) -> Result<Schedule, FetchError> {
        let entry = self
            .prayers
            .into_iter()
            .find(|p| p.day == today.day())
            .ok_or(FetchError::InvalidResponse)?;

        let fields = [
            ("fajr", entry.fajr),
            ("dhuhr", entry.dhuhr),
            ("asr", entry.asr),
            ("maghrib", entry.maghrib),
            ("isha", entry.isha),
        ];

        let events = fields.into_iter().filter_map(|(name, secs)| {
            let secs = secs?;
            let time = Local.timestamp_opt(secs, 0).single()?.time();
            anchor(today, time).map(|instant| Event::new(name, instant))
        });

        Ok(Schedule::new(events))
    }
}

impl LegacyResponse {
    fn into_schedule(self, today: NaiveDate) -> Result<Schedule, FetchError> {
        let zone = self
            .data
            .zon
            .into_iter()
            .next()
            .ok_or(FetchError::InvalidResponse)?;

        let events = zone.waktu_solat.into_iter().filter_map(|t| {
            let name = canonical_name(&t.name)?;
            let Some(time) = parse_clock(&t.time) else {
                tracing::warn!(name = %t.name, time = %t.time, "skipping unparseable prayer time");
                return None;
            };
            anchor(today, time).map(|instant| Event::new(name, instant))
        });

        Ok(Schedule::new(events))
    }
}

/// Map a provider event name to its canonical name. Non-prayer entries
/// (imsak, syuruk, dhuha) map to `None`.
fn canonical_name(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "subuh" | "fajr" => Some("fajr"),
        "zohor" | "zuhur" | "dhuhr" => Some("dhuhr"),
        "asar" | "asr" => Some("asr"),
        "maghrib" => Some("maghrib"),
        "isyak" | "isha" => Some("isha"),
        _ => None,
    }
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}
