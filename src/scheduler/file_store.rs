//! File-backed notification store.
//!
//! The device-local stand-in for a platform notification subsystem:
//! registrations persist to `.dosette/alarms.json` (atomic write via
//! `crate::state`) and the daemon fires them. Every mutation saves
//! immediately so the daemon's next tick sees it.

use super::notify::{NotificationStore, NotifyError, ReminderRequest, ScheduledReminder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk format for the alarms file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AlarmStoreState {
    #[serde(default)]
    scheduled: Vec<ScheduledReminder>,
}

/// Notification store persisted to `<root>/.dosette/alarms.json`.
pub struct FileNotificationStore {
    path: PathBuf,
    state: AlarmStoreState,
}

impl FileNotificationStore {
    /// Load or create the store under `root`.
    pub fn load(root: &Path) -> Self {
        let path = root.join(".dosette/alarms.json");
        let state: AlarmStoreState = crate::state::load_state(&path).unwrap_or_default();
        Self { path, state }
    }

    /// Currently scheduled reminders, registration order.
    pub fn scheduled(&self) -> &[ScheduledReminder] {
        &self.state.scheduled
    }

    fn save(&self) -> Result<(), NotifyError> {
        crate::state::save_state(&self.path, &self.state)
            .map_err(|e| NotifyError::Unavailable(format!("{e:#}")))
    }
}

#[async_trait]
impl NotificationStore for FileNotificationStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn schedule_daily(&mut self, request: ReminderRequest) -> Result<String, NotifyError> {
        let identifier = uuid::Uuid::new_v4().to_string();
        self.state
            .scheduled
            .push(ScheduledReminder::from_request(identifier.clone(), request));
        self.save()?;
        Ok(identifier)
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledReminder>, NotifyError> {
        Ok(self.state.scheduled.clone())
    }

    async fn cancel(&mut self, identifier: &str) -> Result<(), NotifyError> {
        self.state.scheduled.retain(|r| r.identifier != identifier);
        self.save()
    }

    async fn cancel_all(&mut self) -> Result<(), NotifyError> {
        self.state.scheduled.clear();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(hour: u32, minute: u32) -> ReminderRequest {
        ReminderRequest {
            title: "Medication reminder".into(),
            body: "Time to take Ibuprofen.".into(),
            medication_id: "med-1".into(),
            dose_hour: hour,
            dose_minute: minute,
            hour,
            minute,
            starts_on: None,
        }
    }

    #[tokio::test]
    async fn test_registrations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let mut store = FileNotificationStore::load(root);
        store.schedule_daily(make_request(8, 0)).await.unwrap();
        store.schedule_daily(make_request(8, 5)).await.unwrap();

        let store2 = FileNotificationStore::load(root);
        assert_eq!(store2.scheduled().len(), 2);
        assert_eq!(store2.scheduled()[0].hour, 8);
        assert_eq!(store2.scheduled()[1].minute, 5);
    }

    #[tokio::test]
    async fn test_cancel_persists() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let mut store = FileNotificationStore::load(root);
        let id = store.schedule_daily(make_request(8, 0)).await.unwrap();
        store.schedule_daily(make_request(16, 0)).await.unwrap();
        store.cancel(&id).await.unwrap();

        let store2 = FileNotificationStore::load(root);
        assert_eq!(store2.scheduled().len(), 1);
        assert_eq!(store2.scheduled()[0].hour, 16);
    }

    #[tokio::test]
    async fn test_cancel_all_persists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let mut store = FileNotificationStore::load(root);
        store.schedule_daily(make_request(8, 0)).await.unwrap();
        store.cancel_all().await.unwrap();

        let store2 = FileNotificationStore::load(root);
        assert!(store2.scheduled().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNotificationStore::load(dir.path());
        assert!(store.scheduled().is_empty());
    }
}
