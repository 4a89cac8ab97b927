//! Notification-store boundary.
//!
//! The platform facility that owns the device's scheduled-notification list.
//! The scheduler only ever talks to this trait, so tests (and the daemon)
//! pick the implementation: [`MemoryNotificationStore`] here, or the
//! file-backed store in [`file_store`](super::file_store).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registration request for one daily-repeating reminder.
///
/// The trigger is hour/minute only — daily repetition substitutes for
/// re-arming. `dose_hour`/`dose_minute` tag the reminder with the dose it
/// belongs to, which may differ from the trigger within an alarm window.
#[derive(Debug, Clone)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub medication_id: String,
    pub dose_hour: u32,
    pub dose_minute: u32,
    /// Trigger time-of-day.
    pub hour: u32,
    pub minute: u32,
    /// First calendar day the trigger may fire. `None` means the next
    /// occurrence, today included.
    pub starts_on: Option<NaiveDate>,
}

/// A currently scheduled reminder, as enumerated from the store.
///
/// The `identifier` is owned by the store; callers use it for cancellation
/// within one exchange and never persist it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub medication_id: String,
    pub dose_hour: u32,
    pub dose_minute: u32,
    pub hour: u32,
    pub minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
}

impl ScheduledReminder {
    /// Materialize a request under a store-assigned identifier.
    pub fn from_request(identifier: impl Into<String>, request: ReminderRequest) -> Self {
        Self {
            identifier: identifier.into(),
            title: request.title,
            body: request.body,
            medication_id: request.medication_id,
            dose_hour: request.dose_hour,
            dose_minute: request.dose_minute,
            hour: request.hour,
            minute: request.minute,
            starts_on: request.starts_on,
        }
    }
}

/// Errors surfaced by a notification store.
#[derive(Debug)]
pub enum NotifyError {
    /// The underlying platform call failed (permission revoked, I/O error).
    Unavailable(String),
    /// The store refused a registration because its capacity is exhausted.
    QuotaExceeded { limit: usize },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "notification store unavailable: {reason}"),
            Self::QuotaExceeded { limit } => {
                write!(f, "notification quota exceeded (limit {limit})")
            }
        }
    }
}

impl std::error::Error for NotifyError {}

/// A platform facility for daily-repeating local notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Register a reminder repeating daily at its trigger hour/minute.
    /// Returns the store-owned identifier.
    async fn schedule_daily(&mut self, request: ReminderRequest) -> Result<String, NotifyError>;

    /// Enumerate all currently scheduled reminders.
    async fn list_scheduled(&self) -> Result<Vec<ScheduledReminder>, NotifyError>;

    /// Cancel one reminder by identifier. Unknown identifiers are ignored.
    async fn cancel(&mut self, identifier: &str) -> Result<(), NotifyError>;

    /// Cancel every scheduled reminder.
    async fn cancel_all(&mut self) -> Result<(), NotifyError>;
}

/// One observed call against a store, for ordering assertions in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Schedule,
    Cancel,
    CancelAll,
}

/// In-memory notification store.
///
/// The substitute for the platform store in tests and dry runs: records the
/// order of operations and can emulate a platform registration quota.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    scheduled: Vec<ScheduledReminder>,
    ops: Vec<StoreOp>,
    quota: Option<usize>,
    next_id: u64,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any registration beyond `limit` concurrently scheduled reminders.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Currently scheduled reminders, registration order.
    pub fn scheduled(&self) -> &[ScheduledReminder] {
        &self.scheduled
    }

    /// Every operation issued against this store, in order.
    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn schedule_daily(&mut self, request: ReminderRequest) -> Result<String, NotifyError> {
        self.ops.push(StoreOp::Schedule);

        if let Some(limit) = self.quota
            && self.scheduled.len() >= limit
        {
            return Err(NotifyError::QuotaExceeded { limit });
        }

        self.next_id += 1;
        let identifier = format!("mem-{}", self.next_id);
        self.scheduled
            .push(ScheduledReminder::from_request(identifier.clone(), request));
        Ok(identifier)
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledReminder>, NotifyError> {
        Ok(self.scheduled.clone())
    }

    async fn cancel(&mut self, identifier: &str) -> Result<(), NotifyError> {
        self.ops.push(StoreOp::Cancel);
        self.scheduled.retain(|r| r.identifier != identifier);
        Ok(())
    }

    async fn cancel_all(&mut self) -> Result<(), NotifyError> {
        self.ops.push(StoreOp::CancelAll);
        self.scheduled.clear();
        Ok(())
    }
}
