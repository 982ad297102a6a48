//! Task entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::task::{Task, TaskPriority, TaskStatus, TaskView};
use domain::models::UserSummary;
use sqlx::FromRow;

/// Database enum for task_priority that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum TaskPriorityDb {
    Low,
    Medium,
    High,
}

impl From<TaskPriorityDb> for TaskPriority {
    fn from(db: TaskPriorityDb) -> Self {
        match db {
            TaskPriorityDb::Low => TaskPriority::Low,
            TaskPriorityDb::Medium => TaskPriority::Medium,
            TaskPriorityDb::High => TaskPriority::High,
        }
    }
}

impl From<TaskPriority> for TaskPriorityDb {
    fn from(priority: TaskPriority) -> Self {
        match priority {
            TaskPriority::Low => TaskPriorityDb::Low,
            TaskPriority::Medium => TaskPriorityDb::Medium,
            TaskPriority::High => TaskPriorityDb::High,
        }
    }
}

/// Database enum for task_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatusDb {
    Pending,
    InProgress,
    Completed,
}

impl From<TaskStatusDb> for TaskStatus {
    fn from(db: TaskStatusDb) -> Self {
        match db {
            TaskStatusDb::Pending => TaskStatus::Pending,
            TaskStatusDb::InProgress => TaskStatus::InProgress,
            TaskStatusDb::Completed => TaskStatus::Completed,
        }
    }
}

impl From<TaskStatus> for TaskStatusDb {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => TaskStatusDb::Pending,
            TaskStatus::InProgress => TaskStatusDb::InProgress,
            TaskStatus::Completed => TaskStatusDb::Completed,
        }
    }
}

/// Task row joined with creator and assignee names.
#[derive(Debug, Clone, FromRow)]
pub struct TaskEntity {
    pub id: i64,
    pub circle_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriorityDb,
    pub status: TaskStatusDb,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator_name: String,
    pub assignee_name: Option<String>,
}

impl From<TaskEntity> for TaskView {
    fn from(entity: TaskEntity) -> Self {
        let assignee = entity
            .assigned_to
            .zip(entity.assignee_name)
            .map(|(id, name)| UserSummary { id, name });

        Self {
            creator: UserSummary {
                id: entity.created_by,
                name: entity.creator_name,
            },
            assignee,
            task: Task {
                id: entity.id,
                circle_id: entity.circle_id,
                title: entity.title,
                description: entity.description,
                due_date: entity.due_date,
                priority: entity.priority.into(),
                status: entity.status.into(),
                assigned_to: entity.assigned_to,
                created_by: entity.created_by,
                completed_at: entity.completed_at,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
        }
    }
}
