//! Reminder scheduling — reconciliation of medications against the
//! notification store.
//!
//! The strategy is cancel-all-then-rebuild: every pass discards the entire
//! scheduled set and re-registers it from the current medication snapshot.
//! No incremental diffing — correctness comes from never letting stale
//! registrations outlive one pass. Callers serialize passes; two interleaved
//! reconciliations can lose or duplicate reminders.

pub mod file_store;
pub mod notify;

pub use file_store::FileNotificationStore;
pub use notify::{
    MemoryNotificationStore, NotificationStore, NotifyError, ReminderRequest, ScheduledReminder,
    StoreOp,
};

use crate::dose::DoseTime;
use crate::medication::Medication;
use chrono::NaiveDate;

/// Title carried by every reminder unless overridden via [`ReminderScheduler::with_title`].
pub const REMINDER_TITLE: &str = "Medication reminder";

/// Spacing of intrusive reminders within an alarm window, in minutes.
const TICK_MINUTES: i64 = 5;

/// Errors from a scheduling pass.
#[derive(Debug)]
pub enum ScheduleError {
    /// The cancellation phase failed; nothing was re-registered.
    Cancel(NotifyError),
    /// A registration failed after `registered` successes. Earlier
    /// registrations in the pass are left in place — the next pass's
    /// cancel-all sweeps them up.
    Register { registered: usize, source: NotifyError },
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancel(source) => write!(f, "failed to cancel scheduled reminders: {source}"),
            Self::Register { registered, source } => write!(
                f,
                "registration failed after {registered} reminder(s): {source}"
            ),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cancel(source) | Self::Register { source, .. } => Some(source),
        }
    }
}

/// What one reconciliation pass registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Enabled medications scheduled.
    pub medications: usize,
    /// Dose times across those medications.
    pub doses: usize,
    /// Reminder registrations issued.
    pub reminders: usize,
}

/// Drives a [`NotificationStore`] from medication snapshots.
///
/// The store is injected so the scheduler never reaches for device-global
/// state directly; tests run against [`MemoryNotificationStore`].
pub struct ReminderScheduler<S> {
    store: S,
    title: String,
}

impl<S: NotificationStore> ReminderScheduler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            title: REMINDER_TITLE.to_owned(),
        }
    }

    /// Override the reminder title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Replace the entire reminder set from a medication snapshot.
    ///
    /// Cancels everything first (completing before any registration begins),
    /// then registers one daily reminder per 5-minute tick of each enabled
    /// medication's alarm window, per dose time. An empty (or fully disabled)
    /// snapshot is valid and simply leaves the store empty.
    pub async fn reconcile(
        &mut self,
        medications: &[Medication],
    ) -> Result<ReconcileReport, ScheduleError> {
        self.store.cancel_all().await.map_err(ScheduleError::Cancel)?;

        let mut report = ReconcileReport::default();

        for med in medications.iter().filter(|m| !m.disabled) {
            report.medications += 1;

            for dose in med.dose_times() {
                report.doses += 1;

                for request in window_requests(&self.title, med, dose, None) {
                    match self.store.schedule_daily(request).await {
                        Ok(_) => report.reminders += 1,
                        Err(source) => {
                            return Err(ScheduleError::Register {
                                registered: report.reminders,
                                source,
                            });
                        }
                    }
                }
            }
        }

        eprintln!(
            "[scheduler] reconciled {} medication(s): {} dose time(s), {} reminder(s)",
            report.medications, report.doses, report.reminders
        );

        Ok(report)
    }

    /// Silence one dose's remaining reminder window until `resume_on`.
    ///
    /// Cancels every reminder tagged with this medication and dose time, then
    /// re-registers the dose's window ticks constrained to start on
    /// `resume_on` (normally tomorrow). Used when a dose is recorded as
    /// taken. Returns how many reminders were cancelled.
    pub async fn silence_dose(
        &mut self,
        med: &Medication,
        dose: DoseTime,
        resume_on: NaiveDate,
    ) -> Result<usize, ScheduleError> {
        let scheduled = self
            .store
            .list_scheduled()
            .await
            .map_err(ScheduleError::Cancel)?;

        let mut cancelled = 0;
        for reminder in scheduled.iter().filter(|r| {
            r.medication_id == med.id && r.dose_hour == dose.hour && r.dose_minute == dose.minute
        }) {
            self.store
                .cancel(&reminder.identifier)
                .await
                .map_err(ScheduleError::Cancel)?;
            cancelled += 1;
        }

        let mut registered = 0;
        for request in window_requests(&self.title, med, dose, Some(resume_on)) {
            self.store
                .schedule_daily(request)
                .await
                .map_err(|source| ScheduleError::Register { registered, source })?;
            registered += 1;
        }

        eprintln!(
            "[scheduler] silenced {cancelled} reminder(s) for {} at {dose}, resuming {resume_on}",
            med.name
        );

        Ok(cancelled)
    }

    /// Count of currently scheduled reminders; 0 (with a logged warning)
    /// when the store cannot be reached.
    pub async fn scheduled_count(&self) -> usize {
        match self.store.list_scheduled().await {
            Ok(scheduled) => scheduled.len(),
            Err(e) => {
                eprintln!("[scheduler] failed to count scheduled reminders: {e}");
                0
            }
        }
    }
}

/// Registration requests for one dose's alarm window.
///
/// Ticks every 5 minutes from the dose time (inclusive) until the window
/// elapses (exclusive), wrapping across midnight.
fn window_requests(
    title: &str,
    med: &Medication,
    dose: DoseTime,
    starts_on: Option<NaiveDate>,
) -> Vec<ReminderRequest> {
    let dose_start = i64::from(dose.hour) * 60 + i64::from(dose.minute);
    let mut requests = Vec::new();

    let mut offset = 0;
    while offset < med.alarm_window.minutes() {
        let tick = (dose_start + offset).rem_euclid(24 * 60);
        requests.push(ReminderRequest {
            title: title.to_owned(),
            body: format!("Time to take {}.", med.name),
            medication_id: med.id.clone(),
            dose_hour: dose.hour,
            dose_minute: dose.minute,
            hour: (tick / 60) as u32,
            minute: (tick % 60) as u32,
            starts_on,
        });
        offset += TICK_MINUTES;
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::notify::StoreOp;
    use super::*;
    use crate::dose::Interval;
    use chrono::NaiveDate;

    fn make_med(id: &str, name: &str, anchor_h: u32, every: &str, window: &str) -> Medication {
        let mut med = Medication::new(
            name,
            NaiveDate::from_ymd_opt(2026, 3, 10)
                .unwrap()
                .and_hms_opt(anchor_h, 0, 0)
                .unwrap(),
            Interval::parse(every).unwrap(),
            Interval::parse(window).unwrap(),
        );
        med.id = id.into();
        med
    }

    #[tokio::test]
    async fn test_reconcile_empty_clears_everything() {
        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        scheduler
            .reconcile(&[make_med("m1", "Amoxicillin", 8, "8h", "30m")])
            .await
            .unwrap();
        assert!(scheduler.scheduled_count().await > 0);

        let report = scheduler.reconcile(&[]).await.unwrap();
        assert_eq!(report, ReconcileReport::default());
        assert_eq!(scheduler.scheduled_count().await, 0);
    }

    #[tokio::test]
    async fn test_disabled_medication_contributes_nothing() {
        let mut med = make_med("m1", "Amoxicillin", 8, "8h", "30m");
        med.disabled = true;

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        let report = scheduler.reconcile(&[med]).await.unwrap();
        assert_eq!(report.medications, 0);
        assert_eq!(scheduler.scheduled_count().await, 0);
    }

    #[tokio::test]
    async fn test_window_fan_out_six_ticks_for_thirty_minutes() {
        let med = make_med("m1", "Ibuprofen", 9, "24h", "30m");

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        let report = scheduler.reconcile(&[med]).await.unwrap();
        assert_eq!(report.doses, 1);
        assert_eq!(report.reminders, 6);

        let minutes: Vec<u32> = scheduler
            .store()
            .scheduled()
            .iter()
            .map(|r| r.minute)
            .collect();
        assert_eq!(minutes, vec![0, 5, 10, 15, 20, 25]);
    }

    #[tokio::test]
    async fn test_window_ticks_wrap_midnight() {
        let mut med = make_med("m1", "Melatonin", 23, "24h", "30m");
        med.first_dose_at = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(23, 50, 0)
            .unwrap();

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        scheduler.reconcile(&[med]).await.unwrap();

        let ticks: Vec<(u32, u32)> = scheduler
            .store()
            .scheduled()
            .iter()
            .map(|r| (r.hour, r.minute))
            .collect();
        assert_eq!(
            ticks,
            vec![(23, 50), (23, 55), (0, 0), (0, 5), (0, 10), (0, 15)]
        );
        // All six belong to the 23:50 dose.
        assert!(
            scheduler
                .store()
                .scheduled()
                .iter()
                .all(|r| r.dose_hour == 23 && r.dose_minute == 50)
        );
    }

    #[tokio::test]
    async fn test_cancel_all_precedes_first_registration() {
        let med = make_med("m1", "Amoxicillin", 8, "8h", "30m");

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        scheduler.reconcile(std::slice::from_ref(&med)).await.unwrap();
        scheduler.reconcile(&[med]).await.unwrap();

        // Two passes of 18 registrations each (3 doses × 6 ticks), each
        // preceded by its cancel-all.
        let ops = scheduler.store().ops();
        assert_eq!(ops.len(), 38);
        assert_eq!(ops[0], StoreOp::CancelAll);
        assert!(ops[1..19].iter().all(|op| *op == StoreOp::Schedule));
        assert_eq!(ops[19], StoreOp::CancelAll);
        assert!(ops[20..].iter().all(|op| *op == StoreOp::Schedule));
    }

    #[tokio::test]
    async fn test_rerun_is_stable() {
        let med = make_med("m1", "Amoxicillin", 8, "8h", "30m");

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        let first = scheduler.reconcile(std::slice::from_ref(&med)).await.unwrap();
        let count_after_first = scheduler.scheduled_count().await;

        let second = scheduler.reconcile(&[med]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(scheduler.scheduled_count().await, count_after_first);
    }

    #[tokio::test]
    async fn test_multiple_medications_fan_out() {
        // 8h → 3 doses × 6 ticks, 12h → 2 doses × 12 ticks.
        let meds = vec![
            make_med("m1", "Amoxicillin", 8, "8h", "30m"),
            make_med("m2", "Metformin", 7, "12h", "1h"),
        ];

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        let report = scheduler.reconcile(&meds).await.unwrap();
        assert_eq!(report.medications, 2);
        assert_eq!(report.doses, 5);
        assert_eq!(report.reminders, 3 * 6 + 2 * 12);
    }

    #[tokio::test]
    async fn test_partial_failure_reports_progress_without_rollback() {
        let med = make_med("m1", "Amoxicillin", 9, "24h", "30m");

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::with_quota(4));
        let err = scheduler.reconcile(&[med]).await.unwrap_err();

        match err {
            ScheduleError::Register { registered, source } => {
                assert_eq!(registered, 4);
                assert!(matches!(source, NotifyError::QuotaExceeded { limit: 4 }));
            }
            other => panic!("expected Register error, got {other:?}"),
        }
        // The four successful registrations stay put.
        assert_eq!(scheduler.scheduled_count().await, 4);
    }

    #[tokio::test]
    async fn test_silence_dose_resumes_tomorrow() {
        let med = make_med("m1", "Amoxicillin", 8, "8h", "30m");
        let tomorrow = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        scheduler.reconcile(std::slice::from_ref(&med)).await.unwrap();
        let total = scheduler.scheduled_count().await;

        let dose = DoseTime { hour: 8, minute: 0 };
        let cancelled = scheduler.silence_dose(&med, dose, tomorrow).await.unwrap();
        assert_eq!(cancelled, 6);

        // Same total: the window was re-registered, date-constrained.
        assert_eq!(scheduler.scheduled_count().await, total);
        for reminder in scheduler.store().scheduled() {
            if reminder.dose_hour == 8 && reminder.dose_minute == 0 {
                assert_eq!(reminder.starts_on, Some(tomorrow));
            } else {
                assert!(reminder.starts_on.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_silence_dose_only_touches_matching_medication() {
        let meds = vec![
            make_med("m1", "Amoxicillin", 8, "24h", "30m"),
            make_med("m2", "Ibuprofen", 8, "24h", "30m"),
        ];
        let tomorrow = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();

        let mut scheduler = ReminderScheduler::new(MemoryNotificationStore::new());
        scheduler.reconcile(&meds).await.unwrap();

        let dose = DoseTime { hour: 8, minute: 0 };
        scheduler.silence_dose(&meds[0], dose, tomorrow).await.unwrap();

        for reminder in scheduler.store().scheduled() {
            if reminder.medication_id == "m1" {
                assert_eq!(reminder.starts_on, Some(tomorrow));
            } else {
                assert!(reminder.starts_on.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_custom_title_and_body_interpolation() {
        let med = make_med("m1", "Amoxicillin", 9, "24h", "30m");

        let mut scheduler =
            ReminderScheduler::new(MemoryNotificationStore::new()).with_title("Pill time");
        scheduler.reconcile(&[med]).await.unwrap();

        let reminder = &scheduler.store().scheduled()[0];
        assert_eq!(reminder.title, "Pill time");
        assert_eq!(reminder.body, "Time to take Amoxicillin.");
    }

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::Cancel(NotifyError::Unavailable("down".into()));
        assert!(err.to_string().contains("cancel"), "got: {err}");

        let err = ScheduleError::Register {
            registered: 3,
            source: NotifyError::QuotaExceeded { limit: 3 },
        };
        assert!(err.to_string().contains("after 3"), "got: {err}");
    }
}
