//! Desktop notification channel.
//!
//! Reminders and errors become system notifications; the status line has no
//! desktop equivalent and is ignored.

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use super::{APP_LABEL, Channel};
use crate::reminder::Reminder;

/// Raises desktop notifications via the platform notification service.
pub struct DesktopChannel {
    timeout_ms: u32,
}

impl DesktopChannel {
    pub fn new() -> Self {
        Self { timeout_ms: 10_000 }
    }

    fn show(&self, body: &str) -> color_eyre::Result<()> {
        Notification::new()
            .appname("waktu")
            .summary(APP_LABEL)
            .body(body)
            .timeout(Timeout::Milliseconds(self.timeout_ms))
            .show()
            .map_err(|e| color_eyre::eyre::eyre!("desktop notification failed: {e}"))?;
        Ok(())
    }
}

impl Default for DesktopChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for DesktopChannel {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn status(&self, _text: &str) -> color_eyre::Result<()> {
        Ok(())
    }

    async fn remind(&self, reminder: &Reminder) -> color_eyre::Result<()> {
        self.show(&reminder.message())
    }

    async fn info(&self, text: &str) -> color_eyre::Result<()> {
        self.show(text)
    }

    async fn error(&self, text: &str) -> color_eyre::Result<()> {
        self.show(text)
    }
}
