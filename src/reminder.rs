//! Reminder triggers for the next event.
//!
//! Two triggers are checked against the active countdown entry:
//! - arrival, when less than a minute remains (or, failing that, when the
//!   event is evicted because its instant was reached);
//! - upcoming, when the remaining time first drops into the one-interval
//!   window at the configured lead time.
//!
//! [`ReminderGate`] makes each trigger fire at most once per event per
//! fetch cycle.

use std::collections::HashSet;

use crate::clock::{POLL_INTERVAL_MS, capitalize, split_duration};
use crate::countdown::Entry;

/// Which trigger fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    Upcoming,
    Arrival,
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Arrival => write!(f, "arrival"),
        }
    }
}

/// A reminder to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reminder {
    /// `timer` minutes before the event.
    Upcoming { name: String, minutes: u32 },
    /// The event is within the last minute.
    Arrival { name: String },
}

impl Reminder {
    pub fn kind(&self) -> ReminderKind {
        match self {
            Self::Upcoming { .. } => ReminderKind::Upcoming,
            Self::Arrival { .. } => ReminderKind::Arrival,
        }
    }

    /// The event this reminder is for.
    pub fn event(&self) -> &str {
        match self {
            Self::Upcoming { name, .. } | Self::Arrival { name } => name,
        }
    }

    /// User-facing text.
    pub fn message(&self) -> String {
        match self {
            Self::Upcoming { name, minutes } => {
                format!("{} prayer in {minutes} minutes", capitalize(name))
            }
            Self::Arrival { name } => format!("It's time for {} prayer", capitalize(name)),
        }
    }
}

/// True iff `time_left_ms` sits within one poll interval at or after the
/// `timer`-minute mark.
pub fn should_show_notification(time_left_ms: i64, timer: u32) -> bool {
    let until_reminder = time_left_ms - i64::from(timer) * 60_000;
    (0..POLL_INTERVAL_MS).contains(&until_reminder)
}

/// True iff less than a whole minute remains.
pub fn is_arrival(remaining_ms: i64) -> bool {
    split_duration(remaining_ms).is_zero()
}

/// Tracks which reminders already fired this cycle.
#[derive(Debug, Default)]
pub struct ReminderGate {
    fired: HashSet<(String, ReminderKind)>,
}

impl ReminderGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything fired so far. Called on every fetch cycle reset.
    pub fn clear(&mut self) {
        self.fired.clear();
    }

    /// Reminders due for `active` that have not fired yet.
    pub fn evaluate(&mut self, active: &Entry, timer: u32) -> Vec<Reminder> {
        let mut due = Vec::new();

        if should_show_notification(active.remaining_ms, timer) {
            due.push(Reminder::Upcoming {
                name: active.name.clone(),
                minutes: timer,
            });
        }
        if is_arrival(active.remaining_ms) {
            due.push(Reminder::Arrival {
                name: active.name.clone(),
            });
        }

        due.retain(|r| self.fired.insert((r.event().to_owned(), r.kind())));
        due
    }

    /// Arrival for an event whose instant has just been reached, unless its
    /// arrival already fired while it was still counting down.
    pub fn reached(&mut self, name: &str) -> Option<Reminder> {
        self.fired
            .insert((name.to_owned(), ReminderKind::Arrival))
            .then(|| Reminder::Arrival {
                name: name.to_owned(),
            })
    }
}
