//! Output channels for the status line, reminders and messages.

pub mod desktop;
pub mod terminal;

use async_trait::async_trait;

use crate::reminder::Reminder;

pub use desktop::DesktopChannel;
pub use terminal::TerminalChannel;

/// Prefix for user-facing info and error messages.
pub const APP_LABEL: &str = "Prayer Reminder";

/// `"Prayer Reminder: {text}"`.
pub fn labelled(text: &str) -> String {
    format!("{APP_LABEL}: {text}")
}

/// Trait for presentation integrations.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Show the current countdown text. Called on every refresh and tick.
    async fn status(&self, text: &str) -> color_eyre::Result<()>;

    /// Deliver a reminder.
    async fn remind(&self, reminder: &Reminder) -> color_eyre::Result<()>;

    /// Show an informational message (e.g. "Refreshed").
    async fn info(&self, text: &str) -> color_eyre::Result<()>;

    /// Show an error message.
    async fn error(&self, text: &str) -> color_eyre::Result<()>;
}

/// Sends everything to several channels. A failing channel is logged and
/// skipped so the others still receive the message.
#[derive(Default)]
pub struct Fanout {
    channels: Vec<Box<dyn Channel>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: impl Channel + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }
}

fn report(channel: &dyn Channel, what: &str, result: color_eyre::Result<()>) {
    if let Err(e) = result {
        tracing::warn!(channel = channel.name(), error = %e, "failed to deliver {what}");
    }
}

#[async_trait]
impl Channel for Fanout {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn status(&self, text: &str) -> color_eyre::Result<()> {
        for ch in &self.channels {
            report(ch.as_ref(), "status", ch.status(text).await);
        }
        Ok(())
    }

    async fn remind(&self, reminder: &Reminder) -> color_eyre::Result<()> {
        for ch in &self.channels {
            report(ch.as_ref(), "reminder", ch.remind(reminder).await);
        }
        Ok(())
    }

    async fn info(&self, text: &str) -> color_eyre::Result<()> {
        for ch in &self.channels {
            report(ch.as_ref(), "info", ch.info(text).await);
        }
        Ok(())
    }

    async fn error(&self, text: &str) -> color_eyre::Result<()> {
        for ch in &self.channels {
            report(ch.as_ref(), "error", ch.error(text).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    struct Recording(Log);

    struct Broken;

    #[async_trait]
    impl Channel for Recording {
        fn name(&self) -> &str {
            "recording"
        }
        async fn status(&self, text: &str) -> color_eyre::Result<()> {
            self.0.0.lock().unwrap().push(format!("status:{text}"));
            Ok(())
        }
        async fn remind(&self, reminder: &Reminder) -> color_eyre::Result<()> {
            self.0.0.lock().unwrap().push(format!("remind:{}", reminder.message()));
            Ok(())
        }
        async fn info(&self, text: &str) -> color_eyre::Result<()> {
            self.0.0.lock().unwrap().push(format!("info:{text}"));
            Ok(())
        }
        async fn error(&self, text: &str) -> color_eyre::Result<()> {
            self.0.0.lock().unwrap().push(format!("error:{text}"));
            Ok(())
        }
    }

    #[async_trait]
    impl Channel for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        async fn status(&self, _: &str) -> color_eyre::Result<()> {
            color_eyre::eyre::bail!("no display")
        }
        async fn remind(&self, _: &Reminder) -> color_eyre::Result<()> {
            color_eyre::eyre::bail!("no display")
        }
        async fn info(&self, _: &str) -> color_eyre::Result<()> {
            color_eyre::eyre::bail!("no display")
        }
        async fn error(&self, _: &str) -> color_eyre::Result<()> {
            color_eyre::eyre::bail!("no display")
        }
    }

    #[test]
    fn test_labelled() {
        assert_eq!(labelled("Refreshed"), "Prayer Reminder: Refreshed");
    }

    #[tokio::test]
    async fn test_fanout_skips_failing_channel() {
        let log = Log::default();
        let fanout = Fanout::new().with(Broken).with(Recording(log.clone()));

        fanout.status("Asr in 5m").await.unwrap();
        fanout
            .remind(&Reminder::Arrival { name: "asr".into() })
            .await
            .unwrap();
        fanout.error("boom").await.unwrap();

        let entries = log.0.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "status:Asr in 5m",
                "remind:It's time for Asr prayer",
                "error:boom"
            ]
        );
    }
}
