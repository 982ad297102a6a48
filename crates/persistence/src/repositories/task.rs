//! Task repository. Every statement is scoped by circle.

use chrono::Utc;
use domain::models::task::{
    completion_stamp, CreateTaskRequest, Task, TaskFilter, TaskPatch, TaskStatus, TaskView,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{TaskEntity, TaskPriorityDb, TaskStatusDb};
use crate::metrics::QueryTimer;

const SELECT_TASK: &str = r#"
    SELECT t.id, t.circle_id, t.title, t.description, t.due_date, t.priority, t.status,
           t.assigned_to, t.created_by, t.completed_at, t.created_at, t.updated_at,
           c.name AS creator_name, a.name AS assignee_name
    FROM tasks t
    JOIN users c ON c.id = t.created_by
    LEFT JOIN users a ON a.id = t.assigned_to
"#;

// pending, in_progress, completed; then high before low; undated last
const TASK_ORDER: &str = "ORDER BY t.status ASC, t.priority DESC, t.due_date ASC NULLS LAST, t.id ASC";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        circle_id: i64,
        created_by: i64,
        request: &CreateTaskRequest,
    ) -> Result<TaskEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_task");
        let status = request.status.unwrap_or_default();
        let completed_at = completion_stamp(TaskStatus::Pending, None, status, Utc::now());

        let result = sqlx::query_as::<_, TaskEntity>(
            r#"
            WITH inserted AS (
                INSERT INTO tasks
                    (circle_id, title, description, due_date, priority, status, assigned_to,
                     created_by, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT i.id, i.circle_id, i.title, i.description, i.due_date, i.priority, i.status,
                   i.assigned_to, i.created_by, i.completed_at, i.created_at, i.updated_at,
                   c.name AS creator_name, a.name AS assignee_name
            FROM inserted i
            JOIN users c ON c.id = i.created_by
            LEFT JOIN users a ON a.id = i.assigned_to
            "#,
        )
        .bind(circle_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(request.due_date)
        .bind(TaskPriorityDb::from(request.priority.unwrap_or_default()))
        .bind(TaskStatusDb::from(status))
        .bind(request.assigned_to)
        .bind(created_by)
        .bind(completed_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Tasks of a circle matching `filter`, in work order.
    pub async fn list(
        &self,
        circle_id: i64,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tasks");
        let query = format!(
            "{SELECT_TASK}
            WHERE t.circle_id = $1
              AND ($2::task_status IS NULL OR t.status = $2)
              AND ($3::task_priority IS NULL OR t.priority = $3)
              AND ($4::bigint IS NULL OR t.assigned_to = $4)
            {TASK_ORDER}"
        );
        let result = sqlx::query_as::<_, TaskEntity>(&query)
            .bind(circle_id)
            .bind(filter.status.map(TaskStatusDb::from))
            .bind(filter.priority.map(TaskPriorityDb::from))
            .bind(filter.assigned_to)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find(&self, circle_id: i64, id: i64) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_task");
        let query = format!("{SELECT_TASK} WHERE t.id = $1 AND t.circle_id = $2");
        let result = sqlx::query_as::<_, TaskEntity>(&query)
            .bind(id)
            .bind(circle_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        circle_id: i64,
        id: i64,
        patch: TaskPatch,
    ) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_task");
        let result = self
            .modify(circle_id, id, |task| patch.apply(task, Utc::now()))
            .await;
        timer.record();
        result
    }

    pub async fn update_status(
        &self,
        circle_id: i64,
        id: i64,
        status: TaskStatus,
    ) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_task_status");
        let result = self
            .modify(circle_id, id, |task| task.transition(status, Utc::now()))
            .await;
        timer.record();
        result
    }

    pub async fn delete(&self, circle_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_task");
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND circle_id = $2")
            .bind(id)
            .bind(circle_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }

    /// Loads the task under a row lock, applies `change` and writes it back.
    async fn modify<F>(
        &self,
        circle_id: i64,
        id: i64,
        change: F,
    ) -> Result<Option<TaskEntity>, sqlx::Error>
    where
        F: FnOnce(&mut Task),
    {
        let mut tx = self.pool.begin().await?;

        let query = format!("{SELECT_TASK} WHERE t.id = $1 AND t.circle_id = $2 FOR UPDATE OF t");
        let current = sqlx::query_as::<_, TaskEntity>(&query)
            .bind(id)
            .bind(circle_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let mut task = TaskView::from(current).task;
        change(&mut task);
        let updated = write_back(&mut tx, &task).await?;

        tx.commit().await?;
        Ok(Some(updated))
    }
}

async fn write_back(
    tx: &mut Transaction<'_, Postgres>,
    task: &Task,
) -> Result<TaskEntity, sqlx::Error> {
    sqlx::query_as::<_, TaskEntity>(
        r#"
        WITH updated AS (
            UPDATE tasks
            SET title = $3, description = $4, due_date = $5, priority = $6, status = $7,
                assigned_to = $8, completed_at = $9, updated_at = NOW()
            WHERE id = $1 AND circle_id = $2
            RETURNING *
        )
        SELECT d.id, d.circle_id, d.title, d.description, d.due_date, d.priority, d.status,
               d.assigned_to, d.created_by, d.completed_at, d.created_at, d.updated_at,
               c.name AS creator_name, a.name AS assignee_name
        FROM updated d
        JOIN users c ON c.id = d.created_by
        LEFT JOIN users a ON a.id = d.assigned_to
        "#,
    )
    .bind(task.id)
    .bind(task.circle_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(TaskPriorityDb::from(task.priority))
    .bind(TaskStatusDb::from(task.status))
    .bind(task.assigned_to)
    .bind(task.completed_at)
    .fetch_one(&mut **tx)
    .await
}
