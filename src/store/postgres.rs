use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, TaskRepository, UserRepository};
use crate::models::{NewUser, Task, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at, deleted_at";
const TASK_COLUMNS: &str =
    "id, title, description, due_date, status, user_id, created_at, updated_at, deleted_at";

/// User directory backed by the `users` table.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let saved = sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        log::debug!("Inserted user {}", saved.id);
        Ok(saved)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET name = $1, email = $2, updated_at = NOW() \
             WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Task store backed by the `tasks` table.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn save(&self, task: &Task) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, due_date, status, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TASK_COLUMNS
        );
        let saved = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(task.status)
            .bind(task.user_id)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_by_owner(&self, owner: i32) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner: i32,
    ) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE tasks SET title = $1, description = $2, due_date = $3, status = $4, updated_at = $5 \
             WHERE id = $6 AND deleted_at IS NULL",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status)
        .bind(task.updated_at)
        .bind(task.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE tasks SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_overdue_bulk(&self, owner: i32, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'overdue', updated_at = $2 \
             WHERE user_id = $1 AND deleted_at IS NULL \
               AND due_date IS NOT NULL AND due_date < $2 \
               AND status NOT IN ('completed', 'overdue')",
        )
        .bind(owner)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
