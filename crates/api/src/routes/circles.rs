//! Circle routes: create, join, list, inspect, rename, rotate code, leave.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::circle::{
    CircleDetail, CircleSummary, CreateCircleRequest, InviteCodeResponse, JoinCircleRequest,
    UpdateCircleRequest,
};
use domain::models::Circle;
use domain::services::LeaveOutcome;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CircleMember, UserAuth, ValidJson, ValidPath};
use crate::routes::ListResponse;
use crate::services::CircleService;

#[derive(Debug, Deserialize)]
pub struct CirclePath {
    pub circle_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    pub circle_deleted: bool,
}

/// POST /api/circles
///
/// The creator becomes the circle's first admin.
pub async fn create_circle(
    State(state): State<AppState>,
    user_auth: UserAuth,
    ValidJson(request): ValidJson<CreateCircleRequest>,
) -> Result<(StatusCode, Json<CircleSummary>), ApiError> {
    request.validate()?;

    let summary = CircleService::new(state.pool.clone())
        .create(
            user_auth.user_id,
            &request.name,
            &request.patient_name,
            request.display_name.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/circles/join
pub async fn join_circle(
    State(state): State<AppState>,
    user_auth: UserAuth,
    ValidJson(request): ValidJson<JoinCircleRequest>,
) -> Result<Json<CircleSummary>, ApiError> {
    request.validate()?;

    let summary = CircleService::new(state.pool.clone())
        .join(
            user_auth.user_id,
            &request.code,
            request.display_name.as_deref(),
        )
        .await?;

    Ok(Json(summary))
}

/// GET /api/circles
pub async fn list_circles(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListResponse<CircleSummary>>, ApiError> {
    let circles = CircleService::new(state.pool.clone())
        .list(user_auth.user_id)
        .await?;

    tracing::debug!(
        user_id = user_auth.user_id,
        circle_count = circles.len(),
        "Listed user circles"
    );
    Ok(Json(circles.into()))
}

/// GET /api/circles/:circle_id
pub async fn get_circle(
    State(state): State<AppState>,
    member: CircleMember,
) -> Result<Json<CircleDetail>, ApiError> {
    let detail = CircleService::new(state.pool.clone())
        .detail(member.circle_id())
        .await?;
    Ok(Json(detail))
}

/// PUT /api/circles/:circle_id (admin)
pub async fn update_circle(
    State(state): State<AppState>,
    admin: CircleMember,
    ValidJson(request): ValidJson<UpdateCircleRequest>,
) -> Result<Json<Circle>, ApiError> {
    request.validate()?;

    let circle = CircleService::new(state.pool.clone())
        .update(
            admin.circle_id(),
            request.name.as_deref(),
            request.patient_name.as_deref(),
        )
        .await?;
    Ok(Json(circle))
}

/// POST /api/circles/:circle_id/code (admin)
pub async fn regenerate_code(
    State(state): State<AppState>,
    admin: CircleMember,
) -> Result<Json<InviteCodeResponse>, ApiError> {
    let code = CircleService::new(state.pool.clone())
        .regenerate_code(admin.circle_id())
        .await?;
    Ok(Json(InviteCodeResponse { code }))
}

/// DELETE /api/circles/:circle_id/leave
///
/// Not behind the membership gate: a caller without a membership gets 404.
pub async fn leave_circle(
    State(state): State<AppState>,
    user_auth: UserAuth,
    ValidPath(path): ValidPath<CirclePath>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let outcome = CircleService::new(state.pool.clone())
        .leave(user_auth.user_id, path.circle_id)
        .await?;

    Ok(Json(LeaveResponse {
        circle_deleted: outcome == LeaveOutcome::CircleDeleted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_response_serialization() {
        let json = serde_json::to_value(LeaveResponse {
            circle_deleted: true,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "circleDeleted": true }));
    }

    #[test]
    fn test_create_request_rejects_blank_patient_name() {
        let request: CreateCircleRequest = serde_json::from_value(serde_json::json!({
            "name": "Care for Mom",
            "patientName": "  "
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
