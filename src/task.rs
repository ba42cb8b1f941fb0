//! Task records and the task store.
//!
//! Tasks live in a single snapshot document (`.herald/tasks.json`)
//! mutated under an exclusive file lock, so each mutation is
//! single-document atomic. Every mutation returns the state the fanout
//! dispatcher needs: the created record, the (previous, next) pair, or
//! the deleted record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::Storage;

const TASKS_SCHEMA_VERSION: &str = "herald.tasks.v1";
const TASKS_LOCK: &str = "tasks";

/// Task workflow status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Canonical serialized form, also used as the raw label fallback.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: String,
    pub customer: Option<String>,
    pub sales: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Partial update applied to an existing task.
///
/// `created_by` is intentionally absent: it is immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
    pub customer: Option<String>,
    pub sales: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub clear_customer: bool,
    pub clear_sales: bool,
    pub clear_due_date: bool,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.customer.is_none()
            && self.sales.is_none()
            && self.due_date.is_none()
            && !self.clear_customer
            && !self.clear_sales
            && !self.clear_due_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
}

impl TaskSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
}

impl TaskStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Create a task. `actor` becomes the immutable `created_by`.
    pub fn create(&self, fields: NewTask, actor: &str) -> Result<Task> {
        let title = fields.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }
        let assigned_to = fields.assigned_to.trim();
        if assigned_to.is_empty() {
            return Err(Error::InvalidArgument(
                "assigned_to cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let task = Task {
            id: Ulid::new().to_string().to_lowercase(),
            title: title.to_string(),
            description: fields.description,
            status: TaskStatus::Todo,
            assigned_to: assigned_to.to_string(),
            created_by: actor.to_string(),
            customer: fields.customer,
            sales: fields.sales,
            due_date: fields.due_date,
            created_at: now,
            updated_at: now,
        };

        let _lock = self.lock()?;
        let mut snapshot = self.load_snapshot()?;
        snapshot.tasks.push(task.clone());
        self.save_snapshot(snapshot)?;

        Ok(task)
    }

    /// Fetch a task by id.
    pub fn get(&self, id: &str) -> Result<Task> {
        let snapshot = self.load_snapshot()?;
        snapshot
            .tasks
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Apply a patch and return the (previous, next) pair for fanout.
    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<(Task, Task)> {
        let _lock = self.lock()?;
        let mut snapshot = self.load_snapshot()?;
        let slot = snapshot
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let previous = slot.clone();
        let mut next = previous.clone();

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(Error::InvalidArgument("title cannot be empty".to_string()));
            }
            next.title = title;
        }
        if let Some(description) = patch.description {
            next.description = Some(description);
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(assigned_to) = patch.assigned_to {
            let assigned_to = assigned_to.trim().to_string();
            if assigned_to.is_empty() {
                return Err(Error::InvalidArgument(
                    "assigned_to cannot be empty".to_string(),
                ));
            }
            next.assigned_to = assigned_to;
        }
        if patch.clear_customer {
            next.customer = None;
        } else if let Some(customer) = patch.customer {
            next.customer = Some(customer);
        }
        if patch.clear_sales {
            next.sales = None;
        } else if let Some(sales) = patch.sales {
            next.sales = Some(sales);
        }
        if patch.clear_due_date {
            next.due_date = None;
        } else if let Some(due_date) = patch.due_date {
            next.due_date = Some(due_date);
        }
        next.updated_at = Utc::now();

        *slot = next.clone();
        self.save_snapshot(snapshot)?;

        Ok((previous, next))
    }

    /// Remove a task, returning the deleted record for fanout.
    pub fn delete(&self, id: &str) -> Result<Task> {
        let _lock = self.lock()?;
        let mut snapshot = self.load_snapshot()?;
        let index = snapshot
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let removed = snapshot.tasks.remove(index);
        self.save_snapshot(snapshot)?;

        Ok(removed)
    }

    /// List tasks, optionally filtered by status, newest first.
    pub fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let snapshot = self.load_snapshot()?;
        let mut tasks = snapshot.tasks;
        if let Some(status) = status {
            tasks.retain(|task| task.status == status);
        }
        tasks.sort_by(|left, right| {
            right
                .updated_at
                .cmp(&left.updated_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(tasks)
    }

    fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(self.storage.lock_file(TASKS_LOCK), DEFAULT_LOCK_TIMEOUT_MS)
    }

    fn load_snapshot(&self) -> Result<TaskSnapshot> {
        let path = self.storage.tasks_file();
        if !path.exists() {
            return Ok(TaskSnapshot::empty());
        }
        self.storage.read_json(&path)
    }

    fn save_snapshot(&self, mut snapshot: TaskSnapshot) -> Result<()> {
        snapshot.generated_at = Utc::now();
        self.storage.write_json(&self.storage.tasks_file(), &snapshot)
    }
}
