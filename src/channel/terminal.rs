//! Terminal channel: prints to stdout.

use async_trait::async_trait;
use chrono::Local;
use std::io::Write;

use super::{Channel, labelled};
use crate::reminder::Reminder;

/// Writes status lines and messages to stdout, one per line, each stamped
/// with the local time.
pub struct TerminalChannel;

impl TerminalChannel {
    fn line(&self, text: &str) -> color_eyre::Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "[{}] {text}", Local::now().format("%H:%M"))?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Channel for TerminalChannel {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn status(&self, text: &str) -> color_eyre::Result<()> {
        self.line(&format!("⌚ {text}"))
    }

    async fn remind(&self, reminder: &Reminder) -> color_eyre::Result<()> {
        self.line(&format!("🔔 {}", reminder.message()))
    }

    async fn info(&self, text: &str) -> color_eyre::Result<()> {
        self.line(&labelled(text))
    }

    async fn error(&self, text: &str) -> color_eyre::Result<()> {
        self.line(&labelled(text))
    }
}
