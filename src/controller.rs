//! The reminder controller. Owns the schedule, countdown and session state
//! and drives them through one fetch/tick state machine.
//!
//! ```text
//! Idle ──refresh──▶ Fetching ──ok──▶ Populated ◀──▶ Rendering
//!   ▲                  │                 │
//!   └──────error───────┘                 └─ tick (60s)
//! ```
//!
//! Ticks are only honored from `Populated`. A day change seen by any tick
//! triggers a fresh fetch cycle instead of a decrement, and so does a tick
//! that finds a fetch left in `Fetching` by a dropped `refresh` future.

use chrono::{DateTime, Local};

use crate::channel::Channel;
use crate::clock::{POLL_INTERVAL_MS, format_countdown, signed_delta};
use crate::countdown::Countdown;
use crate::error::FetchError;
use crate::reminder::{Reminder, ReminderGate};
use crate::schedule::{Schedule, ScheduleSource};
use crate::zone::Zone;

/// Status text once every event of the day has passed.
pub const NO_EVENTS_LEFT: &str = "No prayers left today";

/// Status text while no schedule could be fetched.
pub const UNAVAILABLE: &str = "Prayer times unavailable";

/// Gap between ticks beyond which the countdown is rebuilt from the
/// schedule instead of decremented (suspend/resume, stalled runtime).
const RESYNC_AFTER_MS: i64 = 2 * POLL_INTERVAL_MS;

/// Where the controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing fetched yet, or the last fetch failed.
    Idle,
    Fetching,
    Populated,
    Rendering,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Populated => write!(f, "populated"),
            Self::Rendering => write!(f, "rendering"),
        }
    }
}

pub struct Controller<S, C> {
    source: S,
    channel: C,
    zone: Zone,
    /// Pre-event reminder lead time, minutes.
    timer: u32,
    phase: Phase,
    schedule: Schedule,
    countdown: Countdown,
    gate: ReminderGate,
    /// Name of the event the status line currently counts down to.
    active: Option<String>,
    status: String,
    last_tick: Option<DateTime<Local>>,
}

impl<S: ScheduleSource, C: Channel> Controller<S, C> {
    pub fn new(source: S, channel: C, zone: Zone, timer: u32) -> Self {
        Self {
            source,
            channel,
            zone,
            timer,
            phase: Phase::Idle,
            schedule: Schedule::default(),
            countdown: Countdown::new(),
            gate: ReminderGate::new(),
            active: None,
            status: String::new(),
            last_tick: None,
        }
    }

    /// Run a full fetch cycle: reset, fetch today's schedule, populate the
    /// countdown and render.
    ///
    /// Fetch failures are reported through the channel and returned; the
    /// countdown stays empty until the next cycle.
    pub async fn refresh(&mut self, now: DateTime<Local>) -> Result<(), FetchError> {
        if self.phase == Phase::Fetching {
            tracing::warn!("previous fetch was abandoned, starting over");
        }

        self.schedule = Schedule::default();
        self.countdown.reset(&now);
        self.gate.clear();
        self.active = None;
        self.last_tick = Some(now);
        self.phase = Phase::Fetching;

        tracing::info!(zone = %self.zone, source = self.source.name(), "fetching today's schedule");
        match self.source.fetch_today(&self.zone, now.date_naive()).await {
            Ok(schedule) => {
                self.schedule = schedule;
                self.countdown.populate(&self.schedule, &now);
                self.phase = Phase::Populated;
                tracing::info!(
                    events = self.schedule.len(),
                    upcoming = self.countdown.len(),
                    "schedule populated"
                );
                self.render().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch schedule");
                self.phase = Phase::Idle;
                self.set_status(UNAVAILABLE).await;
                self.deliver_error(&e.to_string()).await;
                Err(e)
            }
        }
    }

    /// The user-requested refresh: a fetch cycle followed by a
    /// confirmation message when it succeeds.
    pub async fn manual_refresh(&mut self, now: DateTime<Local>) -> Result<(), FetchError> {
        self.refresh(now).await?;
        if let Err(e) = self.channel.info("Refreshed").await {
            tracing::warn!(channel = self.channel.name(), error = %e, "failed to confirm refresh");
        }
        Ok(())
    }

    /// One poll interval has elapsed.
    pub async fn tick(&mut self, now: DateTime<Local>) {
        // `Fetching` seen here means an earlier fetch was dropped mid-flight
        if self.phase == Phase::Fetching || self.countdown.is_stale(&now) {
            tracing::info!(phase = %self.phase, "refreshing schedule");
            // already reported through the channel
            let _ = self.refresh(now).await;
            return;
        }

        if self.phase != Phase::Populated {
            tracing::debug!(phase = %self.phase, "tick ignored");
            return;
        }

        let gap = self.last_tick.map(|t| signed_delta(&now, &t));
        self.last_tick = Some(now);

        if self.countdown.day_ended() {
            self.set_status(NO_EVENTS_LEFT).await;
            return;
        }

        if gap.is_some_and(|ms| ms > RESYNC_AFTER_MS) {
            tracing::info!(gap_ms = ?gap, "clock jumped, rebuilding countdown");
            self.countdown.reset(&now);
            self.countdown.populate(&self.schedule, &now);
        } else {
            let report = self.countdown.tick();
            for name in &report.evicted {
                tracing::info!(event = %name, "event time reached");
                if let Some(reminder) = self.gate.reached(name) {
                    self.deliver(&reminder).await;
                }
            }
        }

        self.render().await;
    }

    /// Refresh the status line and fire any due reminders for the next event.
    async fn render(&mut self) {
        self.phase = Phase::Rendering;

        let due = match self.countdown.active() {
            Some(entry) => {
                let text = format_countdown(&entry.name, entry.remaining_ms);
                tracing::debug!(event = %entry.name, remaining_ms = entry.remaining_ms, "countdown");
                self.active = Some(entry.name.clone());
                let due = self.gate.evaluate(entry, self.timer);
                self.set_status(&text).await;
                due
            }
            None => {
                self.active = None;
                self.set_status(NO_EVENTS_LEFT).await;
                Vec::new()
            }
        };

        for reminder in &due {
            self.deliver(reminder).await;
        }

        self.phase = Phase::Populated;
    }

    async fn set_status(&mut self, text: &str) {
        self.status = text.to_owned();
        if let Err(e) = self.channel.status(text).await {
            tracing::warn!(channel = self.channel.name(), error = %e, "failed to update status");
        }
    }

    async fn deliver(&self, reminder: &Reminder) {
        tracing::info!(event = reminder.event(), kind = %reminder.kind(), "reminder");
        if let Err(e) = self.channel.remind(reminder).await {
            tracing::warn!(channel = self.channel.name(), error = %e, "failed to deliver reminder");
        }
    }

    async fn deliver_error(&self, text: &str) {
        if let Err(e) = self.channel.error(text).await {
            tracing::warn!(channel = self.channel.name(), error = %e, "failed to deliver error");
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// The event the status line counts down to.
    pub fn active_event(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn day_ended(&self) -> bool {
        self.countdown.day_ended()
    }

    /// The most recent status text.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Event, anchor};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        anchor(day(), NaiveTime::from_hms_opt(h, m, s).unwrap()).unwrap()
    }

    fn zone() -> Zone {
        Zone {
            code: "JHR04".into(),
            area: "Batu Pahat".into(),
        }
    }

    /// Returns a fixed schedule anchored to whatever day is asked for.
    struct FixedSource {
        times: Vec<(&'static str, u32, u32)>,
        fail: Option<FetchError>,
        calls: Arc<AtomicUsize>,
        /// While set, fetches hang until cancelled.
        stall: Arc<AtomicBool>,
    }

    impl FixedSource {
        fn new(times: Vec<(&'static str, u32, u32)>) -> Self {
            Self {
                times,
                fail: None,
                calls: Arc::default(),
                stall: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl ScheduleSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_today(&self, _zone: &Zone, today: NaiveDate) -> Result<Schedule, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall.load(Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
            if let Some(e) = &self.fail {
                return Err(e.clone());
            }
            Ok(Schedule::new(self.times.iter().map(|(name, h, m)| {
                let time = NaiveTime::from_hms_opt(*h, *m, 0).unwrap();
                Event::new(*name, anchor(today, time).unwrap())
            })))
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[async_trait]
    impl Channel for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        async fn status(&self, _text: &str) -> color_eyre::Result<()> {
            Ok(())
        }
        async fn remind(&self, reminder: &Reminder) -> color_eyre::Result<()> {
            self.0.lock().unwrap().push(reminder.message());
            Ok(())
        }
        async fn info(&self, text: &str) -> color_eyre::Result<()> {
            self.0.lock().unwrap().push(format!("info: {text}"));
            Ok(())
        }
        async fn error(&self, text: &str) -> color_eyre::Result<()> {
            self.0.lock().unwrap().push(format!("error: {text}"));
            Ok(())
        }
    }

    fn five() -> Vec<(&'static str, u32, u32)> {
        vec![
            ("fajr", 5, 50),
            ("dhuhr", 13, 5),
            ("asr", 16, 20),
            ("maghrib", 19, 7),
            ("isha", 20, 16),
        ]
    }

    #[tokio::test]
    async fn test_refresh_populates_and_renders() {
        let rec = Recorder::default();
        let mut ctl = Controller::new(FixedSource::new(five()), rec.clone(), zone(), 10);
        assert_eq!(ctl.phase(), Phase::Idle);

        ctl.refresh(at(14, 0, 0)).await.unwrap();
        assert_eq!(ctl.phase(), Phase::Populated);
        assert_eq!(ctl.active_event(), Some("asr"));
        assert_eq!(ctl.status(), "Asr in 2h 20m");
        assert_eq!(ctl.countdown().len(), 3);
        assert_eq!(ctl.schedule().len(), 5);
        assert!(rec.take().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_after_last_event_ends_day() {
        let mut ctl = Controller::new(FixedSource::new(five()), Recorder::default(), zone(), 10);
        ctl.refresh(at(22, 0, 0)).await.unwrap();
        assert!(ctl.day_ended());
        assert_eq!(ctl.status(), NO_EVENTS_LEFT);
        assert_eq!(ctl.active_event(), None);
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_and_stays_idle() {
        let rec = Recorder::default();
        let mut source = FixedSource::new(five());
        source.fail = Some(FetchError::Network);
        let mut ctl = Controller::new(source, rec.clone(), zone(), 10);

        let err = ctl.refresh(at(9, 0, 0)).await.unwrap_err();
        assert_eq!(err, FetchError::Network);
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.countdown().is_empty());
        assert!(!ctl.day_ended());
        assert_eq!(
            rec.take(),
            vec!["error: Network Error: No response received from the server"]
        );

        // ticks on the same day do not retry
        ctl.tick(at(9, 1, 0)).await;
        assert_eq!(ctl.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_event_reminder_fires_once() {
        let rec = Recorder::default();
        let mut ctl = Controller::new(FixedSource::new(five()), rec.clone(), zone(), 10);
        ctl.refresh(at(16, 0, 30)).await.unwrap();

        let mut now = at(16, 0, 30);
        let mut fired = Vec::new();
        for _ in 0..12 {
            now += Duration::minutes(1);
            ctl.tick(now).await;
            fired.extend(rec.take().into_iter().map(|m| (now.format("%H:%M:%S").to_string(), m)));
        }
        assert_eq!(
            fired,
            vec![("16:09:30".to_string(), "Asr prayer in 10 minutes".to_string())]
        );
    }

    #[tokio::test]
    async fn test_arrival_at_exact_minute_boundaries() {
        let rec = Recorder::default();
        let mut ctl = Controller::new(FixedSource::new(five()), rec.clone(), zone(), 5);
        ctl.refresh(at(19, 0, 0)).await.unwrap();

        let mut now = at(19, 0, 0);
        let mut log = Vec::new();
        for _ in 0..8 {
            now += Duration::minutes(1);
            ctl.tick(now).await;
            for m in rec.take() {
                log.push((now.format("%H:%M").to_string(), m));
            }
        }
        assert_eq!(
            log,
            vec![
                ("19:02".to_string(), "Maghrib prayer in 5 minutes".to_string()),
                ("19:07".to_string(), "It's time for Maghrib prayer".to_string()),
            ]
        );
        assert_eq!(ctl.active_event(), Some("isha"));
    }

    #[tokio::test]
    async fn test_day_rollover_refetches() {
        let source = FixedSource::new(five());
        let calls = source.calls.clone();
        let mut ctl = Controller::new(source, Recorder::default(), zone(), 10);
        ctl.refresh(at(23, 58, 0)).await.unwrap();
        assert!(ctl.day_ended());

        ctl.tick(at(23, 59, 0)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctl.status(), NO_EVENTS_LEFT);

        ctl.tick(at(0, 0, 0) + Duration::days(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!ctl.day_ended());
        assert_eq!(ctl.active_event(), Some("fajr"));
        assert_eq!(ctl.countdown().anchor_day(), Some(19));
    }

    #[tokio::test]
    async fn test_clock_jump_rebuilds_countdown() {
        let rec = Recorder::default();
        let mut ctl = Controller::new(FixedSource::new(five()), rec.clone(), zone(), 10);
        ctl.refresh(at(12, 0, 0)).await.unwrap();

        // resumed from suspend three hours later
        ctl.tick(at(15, 0, 0)).await;
        assert_eq!(ctl.active_event(), Some("asr"));
        assert_eq!(ctl.countdown().get("asr"), Some(80 * 60_000));
        assert!(rec.take().is_empty());
    }

    #[tokio::test]
    async fn test_manual_refresh_confirms() {
        let rec = Recorder::default();
        let mut ctl = Controller::new(FixedSource::new(five()), rec.clone(), zone(), 10);
        ctl.manual_refresh(at(8, 0, 0)).await.unwrap();
        assert_eq!(rec.take(), vec!["info: Refreshed"]);
    }

    #[tokio::test]
    async fn test_first_tick_without_refresh_fetches() {
        let source = FixedSource::new(five());
        let calls = source.calls.clone();
        let mut ctl = Controller::new(source, Recorder::default(), zone(), 10);
        // never refreshed: the countdown has no anchor, so the first tick fetches
        ctl.tick(at(8, 0, 0)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctl.phase(), Phase::Populated);
    }

    #[tokio::test]
    async fn test_dropped_refresh_does_not_wedge_manual_refresh() {
        let rec = Recorder::default();
        let source = FixedSource::new(five());
        let calls = source.calls.clone();
        let stall = source.stall.clone();
        let mut ctl = Controller::new(source, rec.clone(), zone(), 10);

        stall.store(true, Ordering::SeqCst);
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(50), ctl.refresh(at(14, 0, 0)))
                .await;
        assert!(timed_out.is_err());
        assert_eq!(ctl.phase(), Phase::Fetching);

        stall.store(false, Ordering::SeqCst);
        ctl.manual_refresh(at(14, 0, 30)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(ctl.phase(), Phase::Populated);
        assert_eq!(ctl.active_event(), Some("asr"));
        assert_eq!(rec.take(), vec!["info: Refreshed"]);
    }

    #[tokio::test]
    async fn test_tick_after_dropped_refresh_fetches_again() {
        let source = FixedSource::new(five());
        let calls = source.calls.clone();
        let stall = source.stall.clone();
        let mut ctl = Controller::new(source, Recorder::default(), zone(), 10);

        stall.store(true, Ordering::SeqCst);
        let _ = tokio::time::timeout(std::time::Duration::from_millis(50), ctl.refresh(at(14, 0, 0)))
            .await;

        stall.store(false, Ordering::SeqCst);
        ctl.tick(at(14, 1, 0)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(ctl.phase(), Phase::Populated);
        assert_eq!(ctl.countdown().len(), 3);
    }
}
