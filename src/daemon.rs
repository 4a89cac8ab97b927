//! Daemon mode — fires scheduled reminders as alerts.
//!
//! The daemon ticks on an interval, loads the file-backed notification store,
//! and emits an [`Alert`] for every registration whose trigger matches the
//! current wall-clock minute (at most once per minute, honoring each
//! registration's `starts_on` date). Shutdown is cooperative via
//! SIGINT/SIGTERM and a cancellation token.

use crate::alert::{Alert, deduplicate};
use crate::config::AppConfig;
use crate::output::{self, OutputMode};
use crate::scheduler::{FileNotificationStore, ScheduledReminder};
use chrono::{Local, NaiveDate, Timelike};
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// PID file helpers
// ---------------------------------------------------------------------------

fn pid_path(root: &Path) -> PathBuf {
    root.join(".dosette").join("daemon.pid")
}

fn log_path(root: &Path) -> PathBuf {
    root.join(".dosette").join("daemon.log")
}

fn write_pid(root: &Path) -> Result<()> {
    let path = pid_path(root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, std::process::id().to_string())
        .wrap_err_with(|| format!("failed to write PID file {}", path.display()))
}

fn read_pid(root: &Path) -> Option<u32> {
    std::fs::read_to_string(pid_path(root))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

fn remove_pid(root: &Path) {
    let _ = std::fs::remove_file(pid_path(root));
}

fn is_process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// PID of the running daemon under `root`, if any.
pub fn running_pid(root: &Path) -> Option<u32> {
    read_pid(root).filter(|&pid| is_process_alive(pid))
}

// ---------------------------------------------------------------------------
// Public API: start / stop
// ---------------------------------------------------------------------------

/// Start the daemon.
///
/// By default, spawns a background child process with output redirected to
/// `.dosette/daemon.log` and returns immediately. With `foreground: true`,
/// runs the firing loop inline until SIGINT/SIGTERM.
pub async fn start(root: &Path, foreground: bool) -> Result<()> {
    // Check for stale PID file.
    if let Some(pid) = read_pid(root) {
        if is_process_alive(pid) {
            color_eyre::eyre::bail!("daemon already running (PID {pid})");
        }
        eprintln!("[daemon] removing stale PID file (PID {pid} is not running)");
        remove_pid(root);
    }

    if !foreground {
        return spawn_background(root);
    }

    let config = AppConfig::load(root)?;
    write_pid(root)?;

    let cancel = CancellationToken::new();
    let loop_task = tokio::spawn(run_loop(root.to_path_buf(), config, cancel.clone()));

    let mut sigterm =
        signal(SignalKind::terminate()).wrap_err("failed to install SIGTERM handler")?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => eprintln!("[daemon] received SIGINT, shutting down"),
        _ = sigterm.recv() => eprintln!("[daemon] received SIGTERM, shutting down"),
    }

    cancel.cancel();
    let result = loop_task.await.wrap_err("daemon loop panicked")?;
    remove_pid(root);
    result
}

/// Stop the running daemon, if any.
pub fn stop(root: &Path) -> Result<()> {
    match read_pid(root) {
        Some(pid) if is_process_alive(pid) => {
            std::process::Command::new("kill")
                .arg(pid.to_string())
                .status()
                .wrap_err("failed to signal daemon")?;
            remove_pid(root);
            println!("Daemon stopped (PID {pid}).");
            Ok(())
        }
        Some(pid) => {
            remove_pid(root);
            println!("Removed stale PID file (PID {pid} was not running).");
            Ok(())
        }
        None => {
            println!("Daemon is not running.");
            Ok(())
        }
    }
}

/// Re-exec ourselves in the background with output going to the log file.
fn spawn_background(root: &Path) -> Result<()> {
    let exe = std::env::current_exe().wrap_err("failed to locate the dosette binary")?;
    let log = log_path(root);
    if let Some(parent) = log.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let log_file = std::fs::File::create(&log)
        .wrap_err_with(|| format!("failed to create {}", log.display()))?;
    let err_file = log_file.try_clone().wrap_err("failed to clone log handle")?;

    let child = std::process::Command::new(exe)
        .arg("-C")
        .arg(root)
        .args(["daemon", "start", "--foreground"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::from(log_file))
        .stderr(std::process::Stdio::from(err_file))
        .spawn()
        .wrap_err("failed to spawn daemon process")?;

    println!(
        "Daemon started (PID {}), logging to {}.",
        child.id(),
        log.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Firing loop
// ---------------------------------------------------------------------------

async fn run_loop(root: PathBuf, config: AppConfig, cancel: CancellationToken) -> Result<()> {
    let output_mode = OutputMode::from_config(
        &config.output.mode,
        config.output.path.as_ref(),
        config.output.url.as_deref(),
    )?;

    let tick = std::time::Duration::from_secs(config.tick_interval_secs.max(1));
    let mut ticker = tokio::time::interval(tick);
    let mut last_fired: Option<(NaiveDate, u32, u32)> = None;

    eprintln!(
        "[daemon] checking for due reminders every {}s",
        tick.as_secs()
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let now = Local::now();
                let key = (now.date_naive(), now.hour(), now.minute());
                if last_fired == Some(key) {
                    continue;
                }
                last_fired = Some(key);

                let store = FileNotificationStore::load(&root);
                let alerts = deduplicate(&due_alerts(store.scheduled(), key.0, key.1, key.2));
                if alerts.is_empty() {
                    continue;
                }

                eprintln!(
                    "[daemon] {} reminder(s) due at {:02}:{:02}",
                    alerts.len(),
                    key.1,
                    key.2
                );
                if let Err(e) = output::emit(&alerts, &output_mode).await {
                    eprintln!("[daemon] failed to emit alerts: {e}");
                }
            }
        }
    }

    Ok(())
}

/// Alerts for every registration due at `hour:minute` on `today`.
///
/// A registration with a future `starts_on` date has not begun repeating yet
/// and is skipped.
fn due_alerts(
    scheduled: &[ScheduledReminder],
    today: NaiveDate,
    hour: u32,
    minute: u32,
) -> Vec<Alert> {
    scheduled
        .iter()
        .filter(|r| r.hour == hour && r.minute == minute)
        .filter(|r| r.starts_on.is_none_or(|d| d <= today))
        .map(|r| Alert::new(&r.medication_id, &r.title, &r.body, r.hour, r.minute))
        .collect()
}
