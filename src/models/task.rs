use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the lifecycle status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet. Default for new tasks.
    Pending,
    /// Being worked on.
    InProgress,
    /// Finished. Never turns overdue.
    Completed,
    /// Derived: the due date has passed before completion.
    Overdue,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status derivation rule shared by create, update and the lazy read path.
///
/// - A past due date turns anything but `completed` into `overdue`.
/// - No status (creation) becomes `pending`.
/// - `overdue` only holds while the task is past due; otherwise it reverts to `pending`.
/// - Any other explicit status is kept.
pub fn derive_status(
    due_date: Option<DateTime<Utc>>,
    status: Option<TaskStatus>,
    now: DateTime<Utc>,
) -> TaskStatus {
    let past_due = due_date.map_or(false, |due| due < now);
    match status {
        Some(TaskStatus::Completed) => TaskStatus::Completed,
        _ if past_due => TaskStatus::Overdue,
        None | Some(TaskStatus::Overdue) => TaskStatus::Pending,
        Some(explicit) => explicit,
    }
}

/// Rejects `overdue`, which only the server may assign.
fn validate_user_status(status: &TaskStatus) -> Result<(), ValidationError> {
    if *status == TaskStatus::Overdue {
        let mut error = ValidationError::new("status");
        error.message = Some("status must be one of pending, in_progress, completed".into());
        return Err(error);
    }
    Ok(())
}

/// Keeps `null` distinguishable from an absent field: absent deserializes to
/// `None` via `#[serde(default)]`, `null` to `Some(None)`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Input structure for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    /// Initial status. Defaults to `pending` when omitted.
    #[validate(custom = "validate_user_status")]
    pub status: Option<TaskStatus>,
}

/// Partial update of a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    /// `null` clears the description.
    #[validate(length(max = 1000))]
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    /// `None`: unchanged. `Some(None)`: clear the due date. `Some(Some(d))`: set it.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[validate(custom = "validate_user_status")]
    pub status: Option<TaskStatus>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    /// Identifier of the owning user. Never changes after creation.
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a new task for `user_id`, deriving its initial status at `now`.
    pub fn new(input: CreateTaskInput, user_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: derive_status(input.due_date, input.status, now),
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Merges the fields present in `input`. The owner is never touched.
    pub fn apply_update(&mut self, input: UpdateTaskInput) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(due_date) = input.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
    }

    /// Re-applies the derivation rule. Returns `true` when the status changed.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let derived = derive_status(self.due_date, Some(self.status), now);
        let changed = derived != self.status;
        self.status = derived;
        changed
    }

    /// Whether the lazy overdue sweep would touch this task at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none()
            && self.due_date.map_or(false, |due| due < now)
            && !matches!(self.status, TaskStatus::Completed | TaskStatus::Overdue)
    }
}
