//! Notification records and the notification store.
//!
//! Notifications are appended to `.herald/notifications.jsonl`, one
//! record per recipient. `message` and `recipient_uid` are immutable
//! after insert; `read` is the only field that ever changes, flipped by
//! an explicit mark-read. Records carry a weak `related_task_id`
//! back-reference used for the Create-event dedup lookup; deleting a
//! task never deletes its notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::Storage;

const NOTIFICATIONS_LOCK: &str = "notifications";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub recipient_uid: String,
    pub message: String,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_task_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread notification addressed to a single recipient.
    pub fn addressed_to(
        recipient_uid: impl Into<String>,
        message: impl Into<String>,
        related_task_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipient_uid: recipient_uid.into(),
            message: message.into(),
            read: false,
            related_task_id,
            created_at: Utc::now(),
        }
    }
}

/// The store surface the fanout dispatcher writes through.
///
/// Kept as a trait so the dispatcher can be exercised against an
/// in-memory sink (including injected write failures) without touching
/// the file-backed store.
pub trait NotificationSink {
    fn find_by_task_and_message(&self, task_id: &str, message: &str)
        -> Result<Option<Notification>>;
    fn insert(&self, notification: Notification) -> Result<Notification>;
}

#[derive(Debug, Clone)]
pub struct NotificationStore {
    storage: Storage,
}

impl NotificationStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Append a notification record.
    pub fn insert(&self, notification: Notification) -> Result<Notification> {
        let _lock = self.lock()?;
        self.storage
            .append_jsonl(&self.storage.notifications_file(), &notification)
            .map_err(|err| Error::NotificationWriteFailed(err.to_string()))?;
        Ok(notification)
    }

    /// Dedup lookup: first record matching (related_task_id, message).
    pub fn find_by_task_and_message(
        &self,
        task_id: &str,
        message: &str,
    ) -> Result<Option<Notification>> {
        let records = self.load()?;
        Ok(records.into_iter().find(|record| {
            record.related_task_id.as_deref() == Some(task_id) && record.message == message
        }))
    }

    /// All notifications for one recipient, newest first.
    pub fn list_for_recipient(&self, uid: &str, unread_only: bool) -> Result<Vec<Notification>> {
        let mut records = self.load()?;
        records.retain(|record| record.recipient_uid == uid);
        if unread_only {
            records.retain(|record| !record.read);
        }
        records.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(records)
    }

    /// Every stored notification, in append order.
    pub fn list_all(&self) -> Result<Vec<Notification>> {
        self.load()
    }

    /// Count of unread notifications for a recipient.
    pub fn unread_count(&self, uid: &str) -> Result<usize> {
        Ok(self
            .load()?
            .iter()
            .filter(|record| record.recipient_uid == uid && !record.read)
            .count())
    }

    /// Flip `read` on a single record. Message and recipient stay as
    /// inserted; the whole file is rewritten atomically under lock.
    pub fn mark_read(&self, id: &str) -> Result<Notification> {
        let _lock = self.lock()?;
        let mut records = self.load()?;
        let slot = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::NotificationNotFound(id.to_string()))?;
        slot.read = true;
        let updated = slot.clone();

        let mut buffer = Vec::new();
        for record in &records {
            buffer.extend_from_slice(serde_json::to_string(record)?.as_bytes());
            buffer.push(b'\n');
        }
        self.storage
            .write_atomic(&self.storage.notifications_file(), &buffer)?;

        Ok(updated)
    }

    fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(
            self.storage.lock_file(NOTIFICATIONS_LOCK),
            DEFAULT_LOCK_TIMEOUT_MS,
        )
    }

    fn load(&self) -> Result<Vec<Notification>> {
        self.storage.read_jsonl(&self.storage.notifications_file())
    }
}

impl NotificationSink for NotificationStore {
    fn find_by_task_and_message(
        &self,
        task_id: &str,
        message: &str,
    ) -> Result<Option<Notification>> {
        NotificationStore::find_by_task_and_message(self, task_id, message)
    }

    fn insert(&self, notification: Notification) -> Result<Notification> {
        NotificationStore::insert(self, notification)
    }
}
