//! Medication-schedule entries.
//!
//! A medication couples a first-dose anchor with a repeat interval and an
//! alarm-window length; everything the scheduler needs is derived from those.
//! Entries persist to `.dosette/medications.json`.

pub mod store;
pub mod types;

pub use store::{LookupError, MedicationStore};
pub use types::Medication;

use crate::dose::Interval;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Create a medication from CLI strings.
///
/// `first_dose` is either a time (`08:00`, taken on `date` or today) or a
/// full datetime (`2026-03-10T08:00`). `window` defaults to 30 minutes.
pub fn create_medication(
    name: &str,
    first_dose: &str,
    date: Option<&str>,
    every: &str,
    window: Option<&str>,
) -> Result<Medication, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("medication name must not be empty".into());
    }

    let first_dose_at = parse_first_dose(first_dose, date, Local::now().date_naive())?;
    let interval = Interval::parse(every)?;
    let alarm_window = match window {
        Some(w) => Interval::parse(w)?,
        None => Interval::DEFAULT_WINDOW,
    };

    Ok(Medication::new(name, first_dose_at, interval, alarm_window))
}

/// Parse a first-dose anchor.
///
/// Accepts `HH:MM` (combined with `date` when given, else `fallback_date`)
/// or `YYYY-MM-DDTHH:MM`.
pub fn parse_first_dose(
    s: &str,
    date: Option<&str>,
    fallback_date: NaiveDate,
) -> Result<NaiveDateTime, String> {
    let s = s.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }

    let time = NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| format!("invalid first-dose time '{s}', expected HH:MM"))?;

    let day = match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{d}', expected YYYY-MM-DD"))?,
        None => fallback_date,
    };

    Ok(day.and_time(time))
}

/// Format a single medication for display.
pub fn format_medication(med: &Medication) -> String {
    let short_id = &med.id[..8.min(med.id.len())];
    let disabled = if med.disabled { " (disabled)" } else { "" };
    let times: Vec<String> = med.dose_times().iter().map(|t| t.to_string()).collect();

    format!(
        "`{short_id}` {} — every {}, window {}{disabled}\n  doses: {}",
        med.name,
        med.interval,
        med.alarm_window,
        times.join(", ")
    )
}

/// Format a list of medications for display.
pub fn format_medication_list(medications: &[&Medication]) -> String {
    if medications.is_empty() {
        return "No medications. Run `dosette add` to create one.".into();
    }

    let mut text = String::from("Medications:\n");
    for (i, med) in medications.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, format_medication(med)));
    }
    text
}
