//! Alert type — a reminder that has fired.
//!
//! The daemon produces one alert per due registration and hands batches to
//! the configured output. Within a batch, alerts collapsing onto the same
//! medication and trigger minute are duplicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fired medication reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier for this firing.
    pub id: String,

    /// The medication this reminder belongs to.
    pub medication_id: String,

    /// Reminder title.
    pub title: String,

    /// Reminder body (interpolated with the medication name).
    pub body: String,

    /// Trigger time-of-day that fired.
    pub hour: u32,
    pub minute: u32,

    /// When this alert was produced.
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert, stamping `id` and `timestamp`.
    pub fn new(
        medication_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        hour: u32,
        minute: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medication_id: medication_id.into(),
            title: title.into(),
            body: body.into(),
            hour,
            minute,
            timestamp: Utc::now(),
        }
    }
}

/// Drop duplicate alerts for the same medication and trigger minute,
/// keeping the first occurrence.
pub fn deduplicate(alerts: &[Alert]) -> Vec<Alert> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for alert in alerts {
        let key = (alert.medication_id.clone(), alert.hour, alert.minute);
        if seen.insert(key) {
            result.push(alert.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_alert(medication_id: &str, hour: u32, minute: u32) -> Alert {
        Alert::new(
            medication_id,
            "Medication reminder",
            "Time to take Amoxicillin.",
            hour,
            minute,
        )
    }

    #[test]
    fn test_alert_new() {
        let alert = make_alert("med-1", 8, 0);
        assert!(!alert.id.is_empty());
        assert_eq!(alert.medication_id, "med-1");
        assert_eq!(alert.hour, 8);
        assert_eq!(alert.minute, 0);
    }

    #[test]
    fn test_alert_roundtrip() {
        let alert = make_alert("med-1", 16, 30);
        let json = serde_json::to_string(&alert).unwrap();
        let parsed: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, alert.id);
        assert_eq!(parsed.medication_id, alert.medication_id);
        assert_eq!(parsed.hour, 16);
        assert_eq!(parsed.minute, 30);
    }

    #[test]
    fn test_deduplicate_same_medication_and_minute() {
        let alerts = vec![
            make_alert("med-1", 8, 0),
            make_alert("med-1", 8, 0),
            make_alert("med-1", 8, 0),
        ];
        let result = deduplicate(&alerts);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, alerts[0].id);
    }

    #[test]
    fn test_deduplicate_keeps_distinct_minutes() {
        let alerts = vec![make_alert("med-1", 8, 0), make_alert("med-1", 8, 5)];
        assert_eq!(deduplicate(&alerts).len(), 2);
    }

    #[test]
    fn test_deduplicate_keeps_distinct_medications() {
        let alerts = vec![make_alert("med-1", 8, 0), make_alert("med-2", 8, 0)];
        assert_eq!(deduplicate(&alerts).len(), 2);
    }

    #[test]
    fn test_deduplicate_empty_input() {
        assert!(deduplicate(&[]).is_empty());
    }
}
