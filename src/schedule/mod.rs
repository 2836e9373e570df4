//! Today's prayer schedule and the sources it is fetched from.
//!
//! A [`ScheduleSource`] turns a zone and a calendar day into a [`Schedule`]:
//! the day's events in canonical order, each anchored to that day.

pub mod http;
pub mod provider;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use crate::error::FetchError;
use crate::zone::Zone;

pub use http::HttpSource;
pub use provider::ProviderResponse;

/// Event names in the order they occur during a day.
pub const CANONICAL_ORDER: [&str; 5] = ["fajr", "dhuhr", "asr", "maghrib", "isha"];

/// A named instant today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub instant: DateTime<Local>,
}

impl Event {
    pub fn new(name: impl Into<String>, instant: DateTime<Local>) -> Self {
        Self {
            name: name.into(),
            instant,
        }
    }
}

/// Today's events, unique by name, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    events: Vec<Event>,
}

impl Schedule {
    /// Build a schedule. Duplicate names keep their first occurrence; events
    /// are ordered by [`CANONICAL_ORDER`], unknown names last in input order.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        let mut unique: Vec<Event> = Vec::new();
        for event in events {
            if event.name.is_empty() || unique.iter().any(|e| e.name == event.name) {
                continue;
            }
            unique.push(event);
        }
        unique.sort_by_key(|e| canonical_rank(&e.name));
        Self { events: unique }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Look up an event by name.
    pub fn get(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }
}

fn canonical_rank(name: &str) -> usize {
    CANONICAL_ORDER
        .iter()
        .position(|n| *n == name)
        .unwrap_or(CANONICAL_ORDER.len())
}

/// Combine `day` with a local wall-clock time.
///
/// Returns `None` for times that do not exist locally (DST gaps).
pub fn anchor(day: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&day.and_time(time)).earliest()
}

/// Something that can produce today's schedule for a zone.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Fetch the schedule for `zone` on `today`.
    async fn fetch_today(&self, zone: &Zone, today: NaiveDate) -> Result<Schedule, FetchError>;
}
