//! Dosette — medication schedules and dose reminders from the command line.
//!
//! Keeps a local medication collection, computes each medication's dose
//! times over a 24-hour cycle, and keeps a file-backed notification store
//! reconciled with them; the daemon fires due registrations as alerts.

mod alert;
mod config;
mod daemon;
mod dose;
mod medication;
mod output;
mod scheduler;
mod state;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::dose::DoseTime;
use crate::medication::{Medication, MedicationStore};
use crate::scheduler::{FileNotificationStore, ReminderScheduler};
use chrono::{Local, Timelike};

/// Dosette — plan medication doses and keep reminders armed.
#[derive(Parser)]
#[command(name = "dosette", version, about)]
struct Cli {
    /// Working directory (defaults to current directory).
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a dosette directory with a config template.
    Init,

    /// Show medications, scheduled reminders, and daemon state.
    Status,

    /// Add a medication and arm its reminders.
    Add {
        /// Medication name.
        name: String,

        /// Time of the first dose (HH:MM, or a full YYYY-MM-DDTHH:MM).
        #[arg(long)]
        first_dose: String,

        /// Date of the first dose (YYYY-MM-DD, defaults to today).
        #[arg(long)]
        date: Option<String>,

        /// Interval between doses (e.g. 8h, 90m, 1h30m).
        #[arg(long)]
        every: String,

        /// How long reminders keep firing after each dose (default: 30m).
        #[arg(long)]
        window: Option<String>,
    },

    /// List medications with their dose times.
    List,

    /// Re-enable a disabled medication.
    Enable {
        /// Medication ID (or prefix).
        id: String,
    },

    /// Disable a medication without deleting it.
    Disable {
        /// Medication ID (or prefix).
        id: String,
    },

    /// Remove a medication.
    Remove {
        /// Medication ID (or prefix).
        id: String,
    },

    /// Record a dose as taken and silence its reminders until tomorrow.
    Take {
        /// Medication ID (or prefix).
        id: String,

        /// The dose time taken (HH:MM, defaults to the nearest dose time).
        #[arg(long)]
        at: Option<String>,
    },

    /// Rebuild the entire reminder set from the medication list.
    Reconcile,

    /// List scheduled reminder registrations.
    Alarms {
        /// Print only the count.
        #[arg(long)]
        count: bool,
    },

    /// Manage the reminder-firing daemon.
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon (backgrounds by default).
    Start {
        /// Run in foreground instead of daemonizing.
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the running daemon.
    Stop,
    /// Restart the daemon.
    Restart,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let cwd = match &cli.dir {
        Some(d) => d.clone(),
        None => std::env::current_dir().wrap_err("failed to get current directory")?,
    };

    match cli.command {
        Command::Init => cmd_init(&cwd),
        Command::Status => cmd_status(&cwd).await,
        Command::Add {
            name,
            first_dose,
            date,
            every,
            window,
        } => {
            cmd_add(
                &cwd,
                &name,
                &first_dose,
                date.as_deref(),
                &every,
                window.as_deref(),
            )
            .await
        }
        Command::List => cmd_list(&cwd),
        Command::Enable { id } => cmd_set_disabled(&cwd, &id, false).await,
        Command::Disable { id } => cmd_set_disabled(&cwd, &id, true).await,
        Command::Remove { id } => cmd_remove(&cwd, &id).await,
        Command::Take { id, at } => cmd_take(&cwd, &id, at.as_deref()).await,
        Command::Reconcile => cmd_reconcile(&cwd).await,
        Command::Alarms { count } => cmd_alarms(&cwd, count).await,
        Command::Daemon { action } => match action {
            DaemonAction::Start { foreground } => daemon::start(&cwd, foreground).await,
            DaemonAction::Stop => daemon::stop(&cwd),
            DaemonAction::Restart => {
                let _ = daemon::stop(&cwd);
                daemon::start(&cwd, false).await
            }
        },
    }
}

/// Initialize the dosette directory.
fn cmd_init(cwd: &Path) -> Result<()> {
    let config_path = config::init_config(cwd)?;
    println!("Initialized: {}", config_path.display());
    println!("Edit {} to configure outputs.", config_path.display());
    Ok(())
}

/// Show medications, reminders, and daemon state.
async fn cmd_status(cwd: &Path) -> Result<()> {
    let store = MedicationStore::load(cwd);
    let enabled = store.active().len();
    let total = store.all().len();

    let scheduler = ReminderScheduler::new(FileNotificationStore::load(cwd));
    let scheduled = scheduler.scheduled_count().await;

    println!("Root: {}", cwd.display());
    println!("Medications: {total} ({enabled} enabled)");
    println!("Scheduled reminders: {scheduled}");
    match daemon::running_pid(cwd) {
        Some(pid) => println!("Daemon: running (PID {pid})"),
        None => println!("Daemon: stopped"),
    }

    Ok(())
}

/// Add a medication, then rebuild the reminder set.
async fn cmd_add(
    cwd: &Path,
    name: &str,
    first_dose: &str,
    date: Option<&str>,
    every: &str,
    window: Option<&str>,
) -> Result<()> {
    let med = medication::create_medication(name, first_dose, date, every, window)
        .map_err(|e| eyre!(e))?;

    let mut store = MedicationStore::load(cwd);
    let id = store.add(med);
    store.save()?;

    println!("Added: {}", medication::format_medication(store.get(&id)?));
    reconcile_now(cwd, &store).await
}

/// List medications with their dose times.
fn cmd_list(cwd: &Path) -> Result<()> {
    let store = MedicationStore::load(cwd);
    let all: Vec<&Medication> = store.all().iter().collect();
    println!("{}", medication::format_medication_list(&all));
    Ok(())
}

/// Enable or disable a medication, then rebuild the reminder set.
async fn cmd_set_disabled(cwd: &Path, id: &str, disabled: bool) -> Result<()> {
    let mut store = MedicationStore::load(cwd);
    let full_id = store.set_disabled(id, disabled)?;
    store.save()?;

    let verb = if disabled { "Disabled" } else { "Enabled" };
    println!("{verb} `{}`.", &full_id[..8.min(full_id.len())]);
    reconcile_now(cwd, &store).await
}

/// Remove a medication, then rebuild the reminder set.
async fn cmd_remove(cwd: &Path, id: &str) -> Result<()> {
    let mut store = MedicationStore::load(cwd);
    let removed = store.remove(id)?;
    store.save()?;

    println!("Removed {}.", removed.name);
    reconcile_now(cwd, &store).await
}

/// Record a dose as taken: silence its remaining window until tomorrow.
async fn cmd_take(cwd: &Path, id: &str, at: Option<&str>) -> Result<()> {
    let store = MedicationStore::load(cwd);
    let med = store.get(id)?.clone();
    let times = med.dose_times();

    let dose = match at {
        Some(s) => {
            let time = chrono::NaiveTime::parse_from_str(s, "%H:%M")
                .map_err(|_| eyre!("invalid time '{s}', expected HH:MM"))?;
            let wanted = DoseTime {
                hour: time.hour(),
                minute: time.minute(),
            };
            if !times.contains(&wanted) {
                bail!("{} has no dose at {wanted}", med.name);
            }
            wanted
        }
        None => dose::nearest(&times, Local::now().time())
            .ok_or_else(|| eyre!("{} has no dose times", med.name))?,
    };

    let config = AppConfig::load(cwd)?;
    let mut scheduler =
        ReminderScheduler::new(FileNotificationStore::load(cwd)).with_title(config.reminder_title);

    let tomorrow = Local::now().date_naive() + chrono::Days::new(1);
    let silenced = scheduler.silence_dose(&med, dose, tomorrow).await?;
    println!(
        "Recorded {} at {dose}: silenced {silenced} reminder(s) until {tomorrow}.",
        med.name
    );

    Ok(())
}

/// Force a full cancel-and-rebuild pass.
async fn cmd_reconcile(cwd: &Path) -> Result<()> {
    let store = MedicationStore::load(cwd);
    reconcile_now(cwd, &store).await
}

/// List (or count) scheduled reminder registrations.
async fn cmd_alarms(cwd: &Path, count_only: bool) -> Result<()> {
    let notif = FileNotificationStore::load(cwd);

    if count_only {
        let scheduler = ReminderScheduler::new(notif);
        println!("{}", scheduler.scheduled_count().await);
        return Ok(());
    }

    let scheduled = notif.scheduled();
    if scheduled.is_empty() {
        println!("No scheduled reminders.");
        return Ok(());
    }

    println!("Scheduled reminders:");
    for r in scheduled {
        let starts = r
            .starts_on
            .map(|d| format!(" (from {d})"))
            .unwrap_or_default();
        println!(
            "  {:02}:{:02} `{}` dose {:02}:{:02}{starts} — {}",
            r.hour,
            r.minute,
            &r.medication_id[..8.min(r.medication_id.len())],
            r.dose_hour,
            r.dose_minute,
            r.body
        );
    }

    Ok(())
}

/// Rebuild the reminder set from the store's current snapshot.
async fn reconcile_now(cwd: &Path, store: &MedicationStore) -> Result<()> {
    let config = AppConfig::load(cwd)?;
    let mut scheduler =
        ReminderScheduler::new(FileNotificationStore::load(cwd)).with_title(config.reminder_title);

    let report = scheduler.reconcile(&store.snapshot()).await?;
    println!(
        "Armed {} reminder(s) across {} medication(s).",
        report.reminders, report.medications
    );

    Ok(())
}
