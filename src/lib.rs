//! waktu library: prayer schedule fetching, countdown and reminders.

pub mod channel;
pub mod clock;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod daemon;
pub mod doctor;
pub mod error;
pub mod reminder;
pub mod schedule;
pub mod zone;
