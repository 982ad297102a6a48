//! Medication routes, scoped to the caller's circle.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::medication::{
    CreateMedicationRequest, ListMedicationsQuery, MedicationPatch, MedicationView,
};
use persistence::repositories::MedicationRepository;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CircleMember, ValidJson, ValidPath, ValidQuery};
use crate::routes::ListResponse;

#[derive(Debug, Deserialize)]
pub struct MedicationPath {
    pub medication_id: i64,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Medication not found".to_string())
}

/// POST /api/circles/:circle_id/medications
pub async fn create_medication(
    State(state): State<AppState>,
    member: CircleMember,
    ValidJson(request): ValidJson<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<MedicationView>), ApiError> {
    request.validate()?;

    let medication: MedicationView = MedicationRepository::new(state.pool.clone())
        .create(member.circle_id(), member.user_id(), &request)
        .await?
        .into();

    info!(
        circle_id = member.circle_id(),
        medication_id = medication.medication.id,
        user_id = member.user_id(),
        "Medication created"
    );
    Ok((StatusCode::CREATED, Json(medication)))
}

/// GET /api/circles/:circle_id/medications?active=
pub async fn list_medications(
    State(state): State<AppState>,
    member: CircleMember,
    ValidQuery(query): ValidQuery<ListMedicationsQuery>,
) -> Result<Json<ListResponse<MedicationView>>, ApiError> {
    let medications: Vec<MedicationView> = MedicationRepository::new(state.pool.clone())
        .list(member.circle_id(), query.active)
        .await?
        .into_iter()
        .map(MedicationView::from)
        .collect();

    Ok(Json(medications.into()))
}

/// GET /api/circles/:circle_id/medications/:medication_id
pub async fn get_medication(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<MedicationPath>,
) -> Result<Json<MedicationView>, ApiError> {
    let medication = MedicationRepository::new(state.pool.clone())
        .find(member.circle_id(), path.medication_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(medication.into()))
}

/// PUT /api/circles/:circle_id/medications/:medication_id
pub async fn update_medication(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<MedicationPath>,
    ValidJson(patch): ValidJson<MedicationPatch>,
) -> Result<Json<MedicationView>, ApiError> {
    patch.validate()?;

    let medication = MedicationRepository::new(state.pool.clone())
        .update(member.circle_id(), path.medication_id, patch)
        .await?
        .ok_or_else(not_found)?;

    info!(
        circle_id = member.circle_id(),
        medication_id = path.medication_id,
        "Medication updated"
    );
    Ok(Json(medication.into()))
}

/// DELETE /api/circles/:circle_id/medications/:medication_id
pub async fn delete_medication(
    State(state): State<AppState>,
    member: CircleMember,
    ValidPath(path): ValidPath<MedicationPath>,
) -> Result<StatusCode, ApiError> {
    let deleted = MedicationRepository::new(state.pool.clone())
        .delete(member.circle_id(), path.medication_id)
        .await?;
    if !deleted {
        return Err(not_found());
    }

    info!(
        circle_id = member.circle_id(),
        medication_id = path.medication_id,
        "Medication deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
