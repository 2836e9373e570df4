//! waktu: daily prayer-time reminders in the terminal and on the desktop.

use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use waktu::clock::{capitalize, format_countdown, reminder_threshold};
use waktu::config::{self, Config};
use waktu::controller::NO_EVENTS_LEFT;
use waktu::countdown::Countdown;
use waktu::schedule::{HttpSource, Schedule, ScheduleSource};
use waktu::zone::ZoneDescriptor;
use waktu::{daemon, doctor};

/// Prayer-time countdown and reminders for a Malaysian prayer zone.
#[derive(Parser)]
#[command(name = "waktu", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/waktu/config.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reminder loop in the foreground.
    Run,

    /// Manage the background daemon.
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },

    /// Ask the running daemon to refetch today's schedule.
    Refresh,

    /// Print today's schedule with reminder times.
    Today,

    /// Print the countdown to the next prayer and exit.
    Next,

    /// Resolve a zone descriptor to its area name.
    Zone {
        /// Descriptor such as "JHR04 - Batu Pahat, Muar". Defaults to the configured zone.
        descriptor: Option<String>,
    },

    /// Run diagnostic health checks.
    Doctor,
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon (background by default).
    Start {
        /// Run in the foreground instead of detaching.
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the running daemon.
    Stop,
}

impl Command {
    /// Long-running commands log lifecycle events by default; one-shot
    /// commands only log problems.
    fn default_log_level(&self) -> &'static str {
        match self {
            Self::Run | Self::Daemon { .. } => "info",
            _ => "warn",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.command.default_log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(config::default_path);

    match cli.command {
        Command::Run => daemon::run(load_config(&config_path)?).await,
        Command::Daemon { action } => match action {
            DaemonAction::Start { foreground } => daemon::start(&config_path, foreground).await,
            DaemonAction::Stop => daemon::stop(),
        },
        Command::Refresh => daemon::refresh(),
        Command::Today => cmd_today(&config_path).await,
        Command::Next => cmd_next(&config_path).await,
        Command::Zone { descriptor } => cmd_zone(&config_path, descriptor.as_deref()),
        Command::Doctor => doctor::run(&config_path).await,
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).wrap_err("failed to load configuration")
}

async fn fetch_today(config: &Config) -> Result<Schedule> {
    let source = HttpSource::new(&config.provider)?;
    let today = Local::now().date_naive();
    let schedule = source.fetch_today(&config.zone, today).await?;
    Ok(schedule)
}

async fn cmd_today(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let schedule = fetch_today(&config).await?;
    let now = Local::now();

    println!("{} · {}", config.zone.area, now.format("%A, %-d %B %Y"));
    println!();
    for event in schedule.iter() {
        let at = event.instant;
        let reminder = reminder_threshold(
            &Local,
            at.date_naive(),
            at.hour(),
            at.minute(),
            config.timer,
        )
        .map(|r| r.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".into());
        let marker = if at <= now { " " } else { "›" };
        println!(
            "{marker} {:<8} {}   reminder {reminder}",
            capitalize(&event.name),
            at.format("%H:%M"),
        );
    }
    Ok(())
}

async fn cmd_next(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let schedule = fetch_today(&config).await?;
    let now = Local::now();

    let mut countdown = Countdown::new();
    countdown.reset(&now);
    countdown.populate(&schedule, &now);

    match countdown.active() {
        Some(next) => println!("{}", format_countdown(&next.name, next.remaining_ms)),
        None => println!("{NO_EVENTS_LEFT}"),
    }
    Ok(())
}

fn cmd_zone(config_path: &Path, descriptor: Option<&str>) -> Result<()> {
    let zone = match descriptor {
        Some(d) => ZoneDescriptor::parse(d)
            .wrap_err("invalid zone descriptor")?
            .primary(),
        None => load_config(config_path)?.zone,
    };
    println!("{}", zone.area);
    println!("code: {}", zone.code);
    Ok(())
}
