//! Care task models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::patch::{apply_optional, apply_required_text, apply_value, double_option};
use super::user::UserSummary;

/// Task priority. Ordered low < medium < high.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(format!("Invalid task priority: {}", s)),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task progress. Declaration order is the listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub circle_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Moves the task to `status`, keeping `completed_at` consistent.
    pub fn transition(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.completed_at = completion_stamp(self.status, self.completed_at, status, now);
        self.status = status;
    }
}

/// Completion timestamp after a status change.
///
/// Entering `completed` stamps `now`; staying `completed` keeps the
/// existing stamp; any other status clears it.
pub fn completion_stamp(
    previous: TaskStatus,
    previous_stamp: Option<DateTime<Utc>>,
    next: TaskStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (previous, next) {
        (TaskStatus::Completed, TaskStatus::Completed) => previous_stamp.or(Some(now)),
        (_, TaskStatus::Completed) => Some(now),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub creator: UserSummary,
    pub assignee: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
}

/// Fields a task update may touch.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<i64>>,
}

impl TaskPatch {
    /// The assignee this patch sets, if it sets one.
    pub fn new_assignee(&self) -> Option<i64> {
        self.assigned_to.flatten()
    }

    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        apply_required_text(&mut task.title, self.title);
        apply_optional(&mut task.description, self.description);
        apply_optional(&mut task.due_date, self.due_date);
        apply_value(&mut task.priority, self.priority);
        apply_optional(&mut task.assigned_to, self.assigned_to);
        if let Some(status) = self.status {
            task.transition(status, now);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

/// Query parameters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<i64>,
}

/// Resolved task filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<i64>,
}

impl ListTasksQuery {
    pub fn into_filter(self) -> Result<TaskFilter, String> {
        Ok(TaskFilter {
            status: self.status.as_deref().map(TaskStatus::from_str).transpose()?,
            priority: self
                .priority
                .as_deref()
                .map(TaskPriority::from_str)
                .transpose()?,
            assigned_to: self.assigned_to,
        })
    }
}
