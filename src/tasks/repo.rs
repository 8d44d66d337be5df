use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Task, TaskQuery, TaskWithOwner, TaskWithOwnerRow};
use crate::error::AppResult;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fails with `AppError::InvalidReference` if `user_id` is unknown.
    async fn create(&self, user_id: i64, body: &str) -> AppResult<Task>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>>;
    async fn update_body(&self, id: i64, body: &str) -> AppResult<Option<Task>>;
    /// Returns the requested page and the total number of matching tasks.
    async fn list(&self, query: &TaskQuery) -> AppResult<(Vec<TaskWithOwner>, i64)>;
}

#[derive(Clone)]
pub struct PgTaskStore {
    db: PgPool,
}

impl PgTaskStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, user_id: i64, body: &str) -> AppResult<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (body, user_id)
            VALUES ($1, $2)
            RETURNING id, body, user_id, created_at, updated_at
            "#,
        )
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, body, user_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(task)
    }

    async fn update_body(&self, id: i64, body: &str) -> AppResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET body = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, body, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.db)
        .await?;
        Ok(task)
    }

    async fn list(&self, query: &TaskQuery) -> AppResult<(Vec<TaskWithOwner>, i64)> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
            "#,
        )
        .bind(query.owner)
        .fetch_one(&self.db)
        .await?;

        let direction = query.sort.sql();
        let sql = format!(
            r#"
            SELECT t.id, t.body, t.user_id, t.created_at, t.updated_at,
                   u.first_name, u.last_name, u.username, u.email
              FROM tasks t
              JOIN users u ON u.id = t.user_id
             WHERE ($1::BIGINT IS NULL OR t.user_id = $1)
             ORDER BY t.created_at {direction}, t.id {direction}
             LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, TaskWithOwnerRow>(&sql)
            .bind(query.owner)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.db)
            .await?;

        Ok((rows.into_iter().map(TaskWithOwner::from).collect(), total))
    }
}
