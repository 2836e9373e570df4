//! `waktu doctor`: diagnostic health checks for configuration, provider and daemon.

use chrono::Local;
use color_eyre::eyre::Result;
use std::path::Path;

use crate::config::Config;
use crate::countdown::Countdown;
use crate::schedule::{HttpSource, ScheduleSource};

// ── Data types ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Pass,
    Warn,
    Fail,
}

struct Check {
    status: Status,
    message: String,
    hint: Option<String>,
}

struct Category {
    name: &'static str,
    checks: Vec<Check>,
}

impl Check {
    fn pass(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Pass,
            message: msg.into(),
            hint: None,
        }
    }

    fn warn(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Warn,
            message: msg.into(),
            hint: None,
        }
    }

    fn fail(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: msg.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Category {
    fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status == Status::Fail)
    }
}

// ── Entry point ──────────────────────────────────────────

pub async fn run(config_path: &Path) -> Result<()> {
    let (config_cat, config) = check_config(config_path);
    let mut categories = vec![config_cat];
    if let Some(config) = &config {
        categories.push(check_provider(config).await);
        categories.push(check_notifications(config));
    }
    categories.push(check_daemon());

    print_report(&categories);

    if categories.iter().any(Category::has_failures) {
        std::process::exit(1);
    }
    Ok(())
}

// ── Category 1: Configuration ────────────────────────────

fn check_config(path: &Path) -> (Category, Option<Config>) {
    let mut checks = Vec::new();

    if !path.exists() {
        checks.push(
            Check::fail(format!("No config file at {}", tilde(path))).with_hint(
                "Create it with at least:\n    zone = \"JHR04 - Batu Pahat, Muar\"\n    timer = 10",
            ),
        );
        return (
            Category {
                name: "Configuration",
                checks,
            },
            None,
        );
    }
    checks.push(Check::pass(format!("Config file {}", tilde(path))));

    let config = match Config::load(path) {
        Ok(config) => {
            checks.push(Check::pass(format!("Zone {}", config.zone)));
            checks.push(Check::pass(format!(
                "Reminder {} minute(s) before each prayer",
                config.timer
            )));
            if config.provider.timeout_secs == 0 {
                checks.push(
                    Check::warn("Provider timeout is 0 (requests time out immediately)")
                        .with_hint("Set [provider] timeout_secs, e.g. 15"),
                );
            }
            Some(config)
        }
        Err(e) => {
            checks.push(Check::fail(e.to_string()).with_hint("Fix the config file and rerun"));
            None
        }
    };

    (
        Category {
            name: "Configuration",
            checks,
        },
        config,
    )
}

// ── Category 2: Provider ─────────────────────────────────

async fn check_provider(config: &Config) -> Category {
    let mut checks = Vec::new();

    let source = match HttpSource::new(&config.provider) {
        Ok(source) => source,
        Err(e) => {
            checks.push(Check::fail(e.to_string()));
            return Category {
                name: "Provider",
                checks,
            };
        }
    };
    checks.push(Check::pass(format!("Endpoint {}", source.url_for(&config.zone))));

    let now = Local::now();
    match source.fetch_today(&config.zone, now.date_naive()).await {
        Ok(schedule) => {
            checks.push(Check::pass(format!(
                "Today's schedule has {} prayer(s)",
                schedule.len()
            )));
            let mut countdown = Countdown::new();
            countdown.reset(&now);
            countdown.populate(&schedule, &now);
            match countdown.active() {
                Some(next) => checks.push(Check::pass(format!("Next prayer: {}", next.name))),
                None => checks.push(Check::pass("No prayers left today")),
            }
        }
        Err(e) => {
            checks.push(
                Check::fail(e.to_string())
                    .with_hint("Check the zone code and [provider] base_url in the config"),
            );
        }
    }

    Category {
        name: "Provider",
        checks,
    }
}

// ── Category 3: Notifications ────────────────────────────

fn check_notifications(config: &Config) -> Category {
    let check = if config.notifications.desktop {
        Check::pass("Desktop notifications enabled")
    } else {
        Check::warn("Desktop notifications disabled (terminal only)")
            .with_hint("Set [notifications] desktop = true to enable")
    };
    Category {
        name: "Notifications",
        checks: vec![check],
    }
}

// ── Category 4: Daemon ───────────────────────────────────

fn check_daemon() -> Category {
    let mut checks = Vec::new();
    let pid_path = crate::daemon::pid_path();

    match crate::daemon::running_pid() {
        Some(pid) => checks.push(Check::pass(format!("Daemon running (PID {pid})"))),
        None if pid_path.exists() => checks.push(
            Check::warn(format!("Stale PID file at {}", tilde(&pid_path)))
                .with_hint("Run `waktu daemon stop` to clean it up"),
        ),
        None => checks.push(
            Check::warn("Daemon not running").with_hint("Start it with `waktu daemon start`"),
        ),
    }

    let log = crate::daemon::log_path();
    if log.exists() {
        checks.push(Check::pass(format!("Log file {}", tilde(&log))));
    }

    Category {
        name: "Daemon",
        checks,
    }
}

// ── Report renderer ──────────────────────────────────────

fn print_report(categories: &[Category]) {
    let mut total_pass = 0u32;
    let mut total_warn = 0u32;
    let mut total_fail = 0u32;

    for (i, cat) in categories.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", cat.name);
        for check in &cat.checks {
            let icon = match check.status {
                Status::Pass => "\x1b[32m\u{2713}\x1b[0m",
                Status::Warn => "\x1b[33m!\x1b[0m",
                Status::Fail => "\x1b[31m\u{2717}\x1b[0m",
            };
            println!("  {icon} {}", check.message);
            if let Some(ref hint) = check.hint {
                println!("    {hint}");
            }

            match check.status {
                Status::Pass => total_pass += 1,
                Status::Warn => total_warn += 1,
                Status::Fail => total_fail += 1,
            }
        }
    }

    println!();
    let mut parts = Vec::new();
    if total_pass > 0 {
        parts.push(format!("{total_pass} passed"));
    }
    if total_warn > 0 {
        parts.push(format!("{total_warn} warning(s)"));
    }
    if total_fail > 0 {
        parts.push(format!("{total_fail} failure(s)"));
    }
    println!("{}", parts.join(", "));
}

// ── Helpers ──────────────────────────────────────────────

/// Replace $HOME prefix with ~ for display.
fn tilde(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(suffix) = path.strip_prefix(&home)
    {
        return format!("~/{}", suffix.display());
    }
    path.display().to_string()
}
