//! Calendar routes, scoped to the caller's circle.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::calendar_event::{
    month_bounds, CalendarEventView, CreateEventRequest, EventPatch, ListEventsQuery,
};
use persistence::repositories::CalendarEventRepository;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CircleMember, ValidJson, ValidPath, ValidQuery};
use crate::routes::ListResponse;

#[derive(Debug, Deserialize)]
pub struct EventPath {
    pub event_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MonthPath {
    pub year: i32,
    pub month: u32,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Event not found".to_string())
}

/// POST /api/circles/:circle_id/calendar
pub async fn create_event(
    State(state): State<AppState>,
    member: CircleMember,
    ValidJson(request): ValidJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<CalendarEventView>), ApiError> {
    request.validate()?;

    let event: CalendarEventView = CalendarEventRepository::new(state.pool.clone())
        .create(member.circle_id(), member.user_id(), &request)
        .await?
        .into();

    info!(
        circle_id = member.circle_id(),
        event_id = event.event.id,
        event_type = %event.event.event_type,
        "Calendar event created"
    );
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/circles/:circle_id/calendar?startDate=&endDate=&eventType=
pub async fn list_events(
    State(state): State<AppState>,
    member: CircleMember,
    ValidQuery(query): ValidQuery<ListEventsQuery>,
) -> Result<Json<ListResponse<CalendarEventView>>, ApiError> {
    let filter = query.into_filter().map_err(ApiError::Validation)?;

    let events: Vec<CalendarEventView> = CalendarEventRepository::new(state.pool.clone())
        .list(member.circle_id(), &filter)
        .await?
        .into_iter()
        .map(CalendarEventView::from)
        .collect();

    Ok(Json(events.into()))
}

/// GET /api/circles/:circle_id/calendar/month/:year/:month
pub async fn list_month(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<MonthPath>,
) -> Result<Json<ListResponse<CalendarEventView>>, ApiError> {
    shared::validation::validate_year(path.year)
        .and_then(|_| shared::validation::validate_month(path.month))
        .map_err(|e| {
            ApiError::Validation(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid month".to_string()),
            )
        })?;
    let (start, end) = month_bounds(path.year, path.month)
        .ok_or_else(|| ApiError::Validation("Invalid month".to_string()))?;

    let events: Vec<CalendarEventView> = CalendarEventRepository::new(state.pool.clone())
        .list_between(member.circle_id(), start, end)
        .await?
        .into_iter()
        .map(CalendarEventView::from)
        .collect();

    Ok(Json(events.into()))
}

/// GET /api/circles/:circle_id/calendar/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<EventPath>,
) -> Result<Json<CalendarEventView>, ApiError> {
    let event = CalendarEventRepository::new(state.pool.clone())
        .find(member.circle_id(), path.event_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(event.into()))
}

/// PUT /api/circles/:circle_id/calendar/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<EventPath>,
    ValidJson(patch): ValidJson<EventPatch>,
) -> Result<Json<CalendarEventView>, ApiError> {
    patch.validate()?;

    let event = CalendarEventRepository::new(state.pool.clone())
        .update(member.circle_id(), path.event_id, patch)
        .await?
        .ok_or_else(not_found)?;

    info!(
        circle_id = member.circle_id(),
        event_id = path.event_id,
        "Calendar event updated"
    );
    Ok(Json(event.into()))
}

/// DELETE /api/circles/:circle_id/calendar/:event_id
pub async fn delete_event(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<EventPath>,
) -> Result<StatusCode, ApiError> {
    let deleted = CalendarEventRepository::new(state.pool.clone())
        .delete(member.circle_id(), path.event_id)
        .await?;
    if !deleted {
        return Err(not_found());
    }

    info!(
        circle_id = member.circle_id(),
        event_id = path.event_id,
        "Calendar event deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
