//! Data types for medication-schedule entries.

use crate::dose::{self, DoseTime, Interval};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A medication-schedule entry (persisted to `.dosette/medications.json`).
///
/// The scheduler reads these as immutable snapshots; all edits go through
/// [`MedicationStore`](super::store::MedicationStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    /// Unique identifier (UUID v4), stable across edits.
    pub id: String,
    /// Display name, interpolated into reminder bodies.
    pub name: String,
    /// Anchor of the very first dose. Only its time-of-day drives recurring
    /// scheduling; the date records when the course started.
    pub first_dose_at: NaiveDateTime,
    /// Spacing between consecutive doses.
    pub interval: Interval,
    /// How long intrusive reminders keep firing after each dose is due.
    #[serde(default = "default_alarm_window")]
    pub alarm_window: Interval,
    /// Disabled medications are excluded from scheduling.
    #[serde(default)]
    pub disabled: bool,
    /// When this entry was created.
    pub created_at: DateTime<Utc>,
}

fn default_alarm_window() -> Interval {
    Interval::DEFAULT_WINDOW
}

impl Medication {
    /// Create a new enabled medication.
    pub fn new(
        name: impl Into<String>,
        first_dose_at: NaiveDateTime,
        interval: Interval,
        alarm_window: Interval,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            first_dose_at,
            interval,
            alarm_window,
            disabled: false,
            created_at: Utc::now(),
        }
    }

    /// Dose times for this medication's current cycle, sorted ascending.
    pub fn dose_times(&self) -> Vec<DoseTime> {
        dose::compute_dose_times(self.first_dose_at, self.interval)
    }
}
