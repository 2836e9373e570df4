//! Remaining time until each of today's events.
//!
//! The countdown is rebuilt from the schedule once per fetch cycle and then
//! advanced by a fixed interval on every tick. Entries are kept in schedule
//! order, so the front entry is always the next event.

use chrono::{DateTime, Datelike, Local};
use std::collections::VecDeque;

use crate::clock::{POLL_INTERVAL_MS, signed_delta};
use crate::schedule::Schedule;

/// One event's remaining time. `remaining_ms` is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub remaining_ms: i64,
}

/// What a tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Events whose time passed during this tick, in order.
    pub evicted: Vec<String>,
    /// True when this tick left the countdown empty.
    pub day_ended: bool,
}

#[derive(Debug, Default)]
pub struct Countdown {
    entries: VecDeque<Entry>,
    /// Day-of-month of the last reset.
    anchor_day: Option<u32>,
    day_ended: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all entries and anchor the countdown to `now`'s day.
    pub fn reset(&mut self, now: &DateTime<Local>) {
        self.entries.clear();
        self.anchor_day = Some(now.day());
        self.day_ended = false;
    }

    /// Fill from `schedule`, keeping only events still ahead of `now`.
    pub fn populate(&mut self, schedule: &Schedule, now: &DateTime<Local>) {
        for event in schedule.iter() {
            let remaining_ms = signed_delta(&event.instant, now);
            if remaining_ms > 0 {
                self.entries.push_back(Entry {
                    name: event.name.clone(),
                    remaining_ms,
                });
            }
        }
        if self.entries.is_empty() {
            self.day_ended = true;
        }
    }

    /// Advance by one poll interval.
    pub fn tick(&mut self) -> TickReport {
        self.advance(POLL_INTERVAL_MS)
    }

    /// Advance every entry by `interval_ms`, evicting those that reach zero.
    ///
    /// Entries are ordered by remaining time, so evictions only ever come
    /// off the front.
    pub fn advance(&mut self, interval_ms: i64) -> TickReport {
        let mut report = TickReport::default();

        while let Some(front) = self.entries.front() {
            if front.remaining_ms - interval_ms > 0 {
                break;
            }
            if let Some(passed) = self.entries.pop_front() {
                report.evicted.push(passed.name);
            }
        }

        for entry in self.entries.iter_mut() {
            entry.remaining_ms -= interval_ms;
        }

        if self.entries.is_empty() {
            self.day_ended = true;
            report.day_ended = true;
        }
        report
    }

    /// The next event, if any remain today.
    pub fn active(&self) -> Option<&Entry> {
        self.entries.front()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.remaining_ms)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once no events are left for the anchored day.
    pub fn day_ended(&self) -> bool {
        self.day_ended
    }

    pub fn anchor_day(&self) -> Option<u32> {
        self.anchor_day
    }

    /// True when `now` falls on a different day than the last reset.
    pub fn is_stale(&self, now: &DateTime<Local>) -> bool {
        self.anchor_day != Some(now.day())
    }
}
