use chrono::Utc;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CreateTaskInput, Task, UpdateTaskInput};
use crate::store::{TaskRepository, UserRepository};

/// What `create` does with a due date that has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PastDuePolicy {
    /// Accept the task and mark it overdue immediately.
    #[default]
    MarkOverdue,
    /// Refuse the task with `InvalidDueDate`.
    Reject,
}

impl FromStr for PastDuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mark_overdue" => Ok(PastDuePolicy::MarkOverdue),
            "reject" => Ok(PastDuePolicy::Reject),
            other => Err(format!(
                "unknown past due policy '{}', expected mark_overdue or reject",
                other
            )),
        }
    }
}

impl fmt::Display for PastDuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PastDuePolicy::MarkOverdue => f.write_str("mark_overdue"),
            PastDuePolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Owner-scoped task operations and due-date driven status transitions.
///
/// Every lookup matches both task id and owner; a task that exists but belongs to
/// somebody else is reported exactly like a missing one. The owner must still be a
/// live user: a deleted account's unexpired token gets `Unauthorized`.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    past_due_policy: PastDuePolicy,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        past_due_policy: PastDuePolicy,
    ) -> Self {
        Self {
            tasks,
            users,
            past_due_policy,
        }
    }

    pub fn past_due_policy(&self) -> PastDuePolicy {
        self.past_due_policy
    }

    pub async fn create(&self, input: CreateTaskInput, owner_id: i32) -> Result<Task, AppError> {
        self.ensure_owner(owner_id).await?;

        let now = Utc::now();
        if self.past_due_policy == PastDuePolicy::Reject
            && input.due_date.map_or(false, |due| due < now)
        {
            log::warn!("User {} tried to create a task due in the past", owner_id);
            return Err(AppError::InvalidDueDate);
        }

        let task = Task::new(input, owner_id, now);
        let saved = self.tasks.save(&task).await.map_err(|e| {
            log::error!("Failed to create task for user {}: {}", owner_id, e);
            AppError::from(e)
        })?;

        log::info!(
            "Task {} created for user {} with status {}",
            saved.id,
            owner_id,
            saved.status
        );
        Ok(saved)
    }

    /// All tasks of `owner_id`, after the overdue sweep has brought their status up to date.
    pub async fn get_by_user(&self, owner_id: i32) -> Result<Vec<Task>, AppError> {
        self.ensure_owner(owner_id).await?;

        let swept = self
            .tasks
            .mark_overdue_bulk(owner_id, Utc::now())
            .await
            .map_err(|e| {
                log::error!("Failed to update overdue tasks for user {}: {}", owner_id, e);
                AppError::from(e)
            })?;
        if swept > 0 {
            log::info!("Marked {} task(s) overdue for user {}", swept, owner_id);
        }

        let tasks = self.tasks.find_by_owner(owner_id).await?;
        log::debug!("Retrieved {} task(s) for user {}", tasks.len(), owner_id);
        Ok(tasks)
    }

    pub async fn get_by_id_and_user(&self, task_id: Uuid, owner_id: i32) -> Result<Task, AppError> {
        let mut task = self.find_owned(task_id, owner_id).await?;

        let now = Utc::now();
        if task.refresh_status(now) {
            task.updated_at = now;
            self.tasks.update(&task).await?;
            log::info!("Task {} status refreshed to {}", task.id, task.status);
        }
        Ok(task)
    }

    /// Merges the fields present in `input`, then re-derives the status.
    pub async fn update_task(
        &self,
        input: UpdateTaskInput,
        task_id: Uuid,
        owner_id: i32,
    ) -> Result<Task, AppError> {
        let mut task = self.find_owned(task_id, owner_id).await?;

        let now = Utc::now();
        task.apply_update(input);
        task.refresh_status(now);
        task.updated_at = now;

        self.tasks.update(&task).await.map_err(|e| {
            log::error!("Failed to update task {}: {}", task_id, e);
            AppError::from(e)
        })?;

        log::info!("Task {} updated", task_id);
        Ok(task)
    }

    pub async fn delete_task(&self, task_id: Uuid, owner_id: i32) -> Result<(), AppError> {
        let task = self.find_owned(task_id, owner_id).await?;

        self.tasks.delete(task.id).await.map_err(|e| {
            log::error!("Failed to delete task {}: {}", task_id, e);
            AppError::from(e)
        })?;

        log::info!("Task {} deleted", task_id);
        Ok(())
    }

    /// Administrative lookup of any task regardless of owner.
    ///
    /// There is no admin role yet, so this always answers `NotImplemented`.
    pub async fn get_by_id(&self, task_id: Uuid) -> Result<Task, AppError> {
        log::warn!("Admin task lookup requested for {}", task_id);
        Err(AppError::NotImplemented)
    }

    async fn ensure_owner(&self, owner_id: i32) -> Result<(), AppError> {
        match self.users.find_by_id(owner_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                log::warn!("Task access by deleted or unknown user {}", owner_id);
                Err(AppError::Unauthorized)
            }
            Err(e) => {
                log::error!("Failed to resolve owner {}: {}", owner_id, e);
                Err(e.into())
            }
        }
    }

    async fn find_owned(&self, task_id: Uuid, owner_id: i32) -> Result<Task, AppError> {
        self.ensure_owner(owner_id).await?;

        match self.tasks.find_by_id_and_owner(task_id, owner_id).await {
            Ok(Some(task)) => Ok(task),
            Ok(None) => {
                log::warn!("Task {} not found for user {}", task_id, owner_id);
                Err(AppError::TaskNotFoundOrUnauthorized)
            }
            Err(e) => {
                log::error!("Failed to load task {} for user {}: {}", task_id, owner_id, e);
                Err(e.into())
            }
        }
    }
}
