//! In-process stores used when no database is configured, and by the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{StoreError, TaskRepository, UserRepository};
use crate::models::{NewUser, Task, TaskStatus, User};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
}

#[derive(Default)]
struct UserTable {
    next_id: i32,
    rows: Vec<User>,
}

/// User directory kept in memory. Email uniqueness is enforced among live users.
#[derive(Default)]
pub struct MemoryUserRepository {
    table: Mutex<UserTable>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = lock(&self.table)?;
        if table
            .rows
            .iter()
            .any(|row| row.deleted_at.is_none() && row.email == user.email)
        {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }

        table.next_id += 1;
        let now = Utc::now();
        let saved = User {
            id: table.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .iter()
            .find(|row| row.deleted_at.is_none() && row.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .iter()
            .find(|row| row.deleted_at.is_none() && row.id == id)
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut table = lock(&self.table)?;
        if table.rows.iter().any(|row| {
            row.deleted_at.is_none() && row.id != user.id && row.email == user.email
        }) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        if let Some(row) = table
            .rows
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.id == user.id)
        {
            row.name = user.name.clone();
            row.email = user.email.clone();
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut table = lock(&self.table)?;
        if let Some(row) = table
            .rows
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.id == id)
        {
            let now = Utc::now();
            row.deleted_at = Some(now);
            row.updated_at = now;
        }
        Ok(())
    }
}

/// Task store kept in memory.
#[derive(Default)]
pub struct MemoryTaskRepository {
    rows: Mutex<Vec<Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn save(&self, task: &Task) -> Result<Task, StoreError> {
        let mut rows = lock(&self.rows)?;
        if rows.iter().any(|row| row.id == task.id) {
            return Err(StoreError::UniqueViolation("tasks_pkey".into()));
        }
        rows.push(task.clone());
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let rows = lock(&self.rows)?;
        Ok(rows
            .iter()
            .find(|row| row.deleted_at.is_none() && row.id == id)
            .cloned())
    }

    async fn find_by_owner(&self, owner: i32) -> Result<Vec<Task>, StoreError> {
        let rows = lock(&self.rows)?;
        let mut tasks: Vec<Task> = rows
            .iter()
            .filter(|row| row.deleted_at.is_none() && row.user_id == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner: i32,
    ) -> Result<Option<Task>, StoreError> {
        let rows = lock(&self.rows)?;
        Ok(rows
            .iter()
            .find(|row| row.deleted_at.is_none() && row.id == id && row.user_id == owner)
            .cloned())
    }

    async fn update(&self, task: &Task) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows)?;
        if let Some(row) = rows
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.id == task.id)
        {
            row.title = task.title.clone();
            row.description = task.description.clone();
            row.due_date = task.due_date;
            row.status = task.status;
            row.updated_at = task.updated_at;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows)?;
        if let Some(row) = rows
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.id == id)
        {
            let now = Utc::now();
            row.deleted_at = Some(now);
            row.updated_at = now;
        }
        Ok(())
    }

    async fn mark_overdue_bulk(&self, owner: i32, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = lock(&self.rows)?;
        let mut changed = 0;
        for row in rows
            .iter_mut()
            .filter(|row| row.user_id == owner && row.is_stale_at(now))
        {
            row.status = TaskStatus::Overdue;
            row.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateTaskInput;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            password_hash: "$2b$04$hash".into(),
        }
    }

    fn task(owner: i32, title: &str, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Task {
        Task::new(
            CreateTaskInput {
                title: title.into(),
                description: None,
                due_date,
                status: None,
            },
            owner,
            now,
        )
    }

    #[actix_rt::test]
    async fn test_user_ids_are_assigned_and_emails_unique() {
        let users = MemoryUserRepository::new();
        let first = users.save(new_user("a@x.com")).await.unwrap();
        let second = users.save(new_user("b@x.com")).await.unwrap();
        assert_ne!(first.id, second.id);

        let duplicate = users.save(new_user("a@x.com")).await;
        assert!(matches!(duplicate, Err(StoreError::UniqueViolation(_))));
    }

    #[actix_rt::test]
    async fn test_soft_deleted_user_is_invisible_and_frees_email() {
        let users = MemoryUserRepository::new();
        let ann = users.save(new_user("a@x.com")).await.unwrap();
        users.delete(ann.id).await.unwrap();

        assert!(users.find_by_id(ann.id).await.unwrap().is_none());
        assert!(users.find_by_email("a@x.com").await.unwrap().is_none());
        assert!(users.save(new_user("a@x.com")).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_owner_scoped_lookup() {
        let tasks = MemoryTaskRepository::new();
        let now = Utc::now();
        let saved = tasks.save(&task(1, "mine", None, now)).await.unwrap();

        assert!(tasks.find_by_id_and_owner(saved.id, 1).await.unwrap().is_some());
        assert!(tasks.find_by_id_and_owner(saved.id, 2).await.unwrap().is_none());
        assert!(tasks.find_by_id(saved.id).await.unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_mark_overdue_bulk_is_scoped_and_idempotent() {
        let tasks = MemoryTaskRepository::new();
        let created = Utc::now() - Duration::days(3);
        let due = Some(created + Duration::days(1));
        let now = Utc::now();

        tasks.save(&task(1, "stale", due, created)).await.unwrap();
        tasks.save(&task(1, "future", Some(now + Duration::days(1)), created)).await.unwrap();
        tasks.save(&task(2, "other owner", due, created)).await.unwrap();

        assert_eq!(tasks.mark_overdue_bulk(1, now).await.unwrap(), 1);
        assert_eq!(tasks.mark_overdue_bulk(1, now).await.unwrap(), 0);

        let other = tasks.find_by_owner(2).await.unwrap();
        assert_eq!(other[0].status, TaskStatus::Pending);
    }

    #[actix_rt::test]
    async fn test_deleted_task_disappears() {
        let tasks = MemoryTaskRepository::new();
        let saved = tasks.save(&task(1, "gone", None, Utc::now())).await.unwrap();
        tasks.delete(saved.id).await.unwrap();

        assert!(tasks.find_by_id(saved.id).await.unwrap().is_none());
        assert!(tasks.find_by_owner(1).await.unwrap().is_empty());
    }
}
