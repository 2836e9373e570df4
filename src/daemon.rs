//! Daemon mode: the long-running reminder loop.
//!
//! The loop `tokio::select!`s over three sources:
//! 1. The 60 s poll timer (missed ticks are skipped)
//! 2. Refresh requests (SIGHUP)
//! 3. Shutdown signals (SIGTERM/SIGINT)
//!
//! `daemon start` detaches a copy of itself with output redirected to a log
//! file and records its PID in the state directory.

use chrono::Local;
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::channel::{DesktopChannel, Fanout, TerminalChannel};
use crate::clock::POLL_INTERVAL_MS;
use crate::config::Config;
use crate::controller::Controller;
use crate::schedule::HttpSource;

// ---------------------------------------------------------------------------
// PID file helpers
// ---------------------------------------------------------------------------

/// Where the PID and log files live, e.g. `~/.local/state/waktu`.
pub fn state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waktu")
}

pub fn pid_path() -> PathBuf {
    state_dir().join("daemon.pid")
}

pub fn log_path() -> PathBuf {
    state_dir().join("daemon.log")
}

fn write_pid() -> Result<()> {
    let path = pid_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, std::process::id().to_string())
        .wrap_err_with(|| format!("failed to write PID file {}", path.display()))
}

fn read_pid() -> Option<u32> {
    std::fs::read_to_string(pid_path())
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

fn remove_pid() {
    let _ = std::fs::remove_file(pid_path());
}

fn kill(args: &[&str]) -> bool {
    std::process::Command::new("kill")
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn is_process_alive(pid: u32) -> bool {
    kill(&["-0", &pid.to_string()])
}

/// PID of the running daemon, if its PID file points at a live process.
pub fn running_pid() -> Option<u32> {
    read_pid().filter(|pid| is_process_alive(*pid))
}

// ---------------------------------------------------------------------------
// Public API: start / stop / refresh
// ---------------------------------------------------------------------------

/// Start the daemon.
///
/// By default, spawns a background child process with output redirected to
/// the log file and returns immediately. With `foreground: true`, runs the
/// loop inline (blocking).
pub async fn start(config_path: &Path, foreground: bool) -> Result<()> {
    if let Some(pid) = read_pid() {
        if is_process_alive(pid) {
            color_eyre::eyre::bail!("daemon already running (PID {pid})");
        }
        tracing::info!(pid, "removing stale PID file");
        remove_pid();
    }

    // Fail here rather than in the detached child.
    let config = Config::load(config_path)?;

    if !foreground {
        return spawn_background(config_path);
    }

    write_pid()?;
    tracing::info!(pid = std::process::id(), "daemon started");

    let result = run(config).await;

    remove_pid();
    tracing::info!("PID file removed");
    result
}

/// Spawn `waktu daemon start --foreground` as a detached background process.
fn spawn_background(config_path: &Path) -> Result<()> {
    let exe = std::env::current_exe().wrap_err("failed to find waktu executable")?;
    let log = log_path();
    if let Some(parent) = log.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }

    let log_file = std::fs::File::create(&log)
        .wrap_err_with(|| format!("failed to create log file {}", log.display()))?;
    let stderr_file = log_file
        .try_clone()
        .wrap_err("failed to clone log file handle")?;

    let mut cmd = std::process::Command::new(exe);
    cmd.arg("--config").arg(config_path);
    cmd.args(["daemon", "start", "--foreground"]);
    cmd.stdout(log_file);
    cmd.stderr(stderr_file);
    cmd.stdin(std::process::Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn().wrap_err("failed to spawn daemon process")?;

    println!("daemon started (PID {})", child.id());
    println!("logs: {}", log.display());
    Ok(())
}

/// Stop the running daemon by reading its PID file and sending SIGTERM.
pub fn stop() -> Result<()> {
    let Some(pid) = read_pid() else {
        println!("daemon is not running (no PID file)");
        return Ok(());
    };

    if !is_process_alive(pid) {
        println!("daemon is not running (PID {pid} is stale), removing PID file");
        remove_pid();
        return Ok(());
    }

    kill(&[&pid.to_string()]);

    for _ in 0..50 {
        if !is_process_alive(pid) {
            remove_pid();
            println!("daemon stopped (PID {pid})");
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    kill(&["-9", &pid.to_string()]);
    remove_pid();
    println!("daemon killed (PID {pid})");
    Ok(())
}

/// Ask the running daemon to refetch today's schedule.
pub fn refresh() -> Result<()> {
    let Some(pid) = running_pid() else {
        color_eyre::eyre::bail!("daemon is not running; start it with `waktu daemon start`");
    };
    if !kill(&["-HUP", &pid.to_string()]) {
        color_eyre::eyre::bail!("failed to signal daemon (PID {pid})");
    }
    println!("refresh requested (PID {pid})");
    Ok(())
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Channels enabled by `config`: the terminal always, the desktop optionally.
pub fn build_channel(config: &Config) -> Fanout {
    let fanout = Fanout::new().with(TerminalChannel);
    if config.notifications.desktop {
        fanout.with(DesktopChannel::new())
    } else {
        fanout
    }
}

/// Resolve SIGINT/SIGTERM into a cancellation.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        tracing::info!("shutdown signal received");
        cancel.cancel();
    });
}

/// Forward SIGHUP as refresh requests. The queue holds one request, so a
/// burst of signals during a fetch collapses into a single refresh.
fn spawn_refresh_listener(tx: mpsc::Sender<()>, cancel: CancellationToken) {
    #[cfg(unix)]
    tokio::spawn(async move {
        let mut sighup =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGHUP handler");
                    return;
                }
            };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = sighup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    if tx.try_send(()).is_err() {
                        tracing::debug!("refresh already queued");
                    }
                }
            }
        }
    });
    #[cfg(not(unix))]
    {
        let _ = (tx, cancel);
    }
}

/// Run the reminder loop until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<()> {
    let source = HttpSource::new(&config.provider).wrap_err("failed to build HTTP client")?;
    let channel = build_channel(&config);
    tracing::info!(
        zone = %config.zone,
        timer = config.timer,
        desktop = config.notifications.desktop,
        "starting reminder loop"
    );

    let mut controller = Controller::new(source, channel, config.zone, config.timer);

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
    spawn_refresh_listener(refresh_tx, cancel.clone());

    let mut poll_timer =
        tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS.unsigned_abs()));
    poll_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // Skip the first immediate tick.
    poll_timer.tick().await;

    // Startup fetch. Failures are already reported through the channel.
    let _ = controller.refresh(Local::now()).await;
    poll_timer.reset();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("shutting down");
                break;
            }

            _ = poll_timer.tick() => {
                controller.tick(Local::now()).await;
            }

            Some(()) = refresh_rx.recv() => {
                tracing::info!("refresh requested");
                let _ = controller.manual_refresh(Local::now()).await;
                poll_timer.reset();
            }
        }
    }

    Ok(())
}
