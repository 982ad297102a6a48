//! Task routes, scoped to the caller's circle.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::task::{
    CreateTaskRequest, ListTasksQuery, TaskPatch, TaskView, UpdateTaskStatusRequest,
};
use persistence::repositories::{CircleRepository, TaskRepository};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CircleMember, ValidJson, ValidPath, ValidQuery};
use crate::routes::ListResponse;

#[derive(Debug, Deserialize)]
pub struct TaskPath {
    pub task_id: i64,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Tasks may only be assigned to members of the same circle.
async fn ensure_assignable(
    pool: &PgPool,
    circle_id: i64,
    assignee: Option<i64>,
) -> Result<(), ApiError> {
    let Some(user_id) = assignee else {
        return Ok(());
    };

    let membership = CircleRepository::new(pool.clone())
        .get_membership(circle_id, user_id)
        .await?;
    if membership.is_none() {
        return Err(ApiError::Validation(
            "assignedTo: Assignee must be a member of this circle".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/circles/:circle_id/tasks
pub async fn create_task(
    State(state): State<AppState>,
    member: CircleMember,
    ValidJson(request): ValidJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    request.validate()?;
    ensure_assignable(&state.pool, member.circle_id(), request.assigned_to).await?;

    let task: TaskView = TaskRepository::new(state.pool.clone())
        .create(member.circle_id(), member.user_id(), &request)
        .await?
        .into();

    info!(
        circle_id = member.circle_id(),
        task_id = task.task.id,
        assigned_to = ?task.task.assigned_to,
        "Task created"
    );
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/circles/:circle_id/tasks?status=&priority=&assignedTo=
pub async fn list_tasks(
    State(state): State<AppState>,
    member: CircleMember,
    ValidQuery(query): ValidQuery<ListTasksQuery>,
) -> Result<Json<ListResponse<TaskView>>, ApiError> {
    let filter = query.into_filter().map_err(ApiError::Validation)?;

    let tasks: Vec<TaskView> = TaskRepository::new(state.pool.clone())
        .list(member.circle_id(), &filter)
        .await?
        .into_iter()
        .map(TaskView::from)
        .collect();

    Ok(Json(tasks.into()))
}

/// GET /api/circles/:circle_id/tasks/my-tasks?status=&priority=
pub async fn list_my_tasks(
    State(state): State<AppState>,
    member: CircleMember,
    ValidQuery(query): ValidQuery<ListTasksQuery>,
) -> Result<Json<ListResponse<TaskView>>, ApiError> {
    let mut filter = query.into_filter().map_err(ApiError::Validation)?;
    filter.assigned_to = Some(member.user_id());

    let tasks: Vec<TaskView> = TaskRepository::new(state.pool.clone())
        .list(member.circle_id(), &filter)
        .await?
        .into_iter()
        .map(TaskView::from)
        .collect();

    Ok(Json(tasks.into()))
}

/// GET /api/circles/:circle_id/tasks/:task_id
pub async fn get_task(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<TaskPath>,
) -> Result<Json<TaskView>, ApiError> {
    let task = TaskRepository::new(state.pool.clone())
        .find(member.circle_id(), path.task_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(task.into()))
}

/// PUT /api/circles/:circle_id/tasks/:task_id
pub async fn update_task(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<TaskPath>,
    ValidJson(patch): ValidJson<TaskPatch>,
) -> Result<Json<TaskView>, ApiError> {
    patch.validate()?;
    ensure_assignable(&state.pool, member.circle_id(), patch.new_assignee()).await?;

    let task: TaskView = TaskRepository::new(state.pool.clone())
        .update(member.circle_id(), path.task_id, patch)
        .await?
        .ok_or_else(not_found)?
        .into();

    info!(
        circle_id = member.circle_id(),
        task_id = path.task_id,
        status = task.task.status.as_str(),
        "Task updated"
    );
    Ok(Json(task))
}

/// PATCH /api/circles/:circle_id/tasks/:task_id/status
pub async fn update_task_status(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<TaskPath>,
    ValidJson(request): ValidJson<UpdateTaskStatusRequest>,
) -> Result<Json<TaskView>, ApiError> {
    let task = TaskRepository::new(state.pool.clone())
        .update_status(member.circle_id(), path.task_id, request.status)
        .await?
        .ok_or_else(not_found)?;

    info!(
        circle_id = member.circle_id(),
        task_id = path.task_id,
        status = request.status.as_str(),
        user_id = member.user_id(),
        "Task status changed"
    );
    Ok(Json(task.into()))
}

/// DELETE /api/circles/:circle_id/tasks/:task_id
pub async fn delete_task(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<TaskPath>,
) -> Result<StatusCode, ApiError> {
    let deleted = TaskRepository::new(state.pool.clone())
        .delete(member.circle_id(), path.task_id)
        .await?;
    if !deleted {
        return Err(not_found());
    }

    info!(
        circle_id = member.circle_id(),
        task_id = path.task_id,
        "Task deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
