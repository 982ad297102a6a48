//! Medication entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::medication::{Medication, MedicationView};
use domain::models::UserSummary;
use sqlx::FromRow;

/// Medication row joined with the creator's name.
#[derive(Debug, Clone, FromRow)]
pub struct MedicationEntity {
    pub id: i64,
    pub circle_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub instructions: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator_name: String,
}

impl From<MedicationEntity> for MedicationView {
    fn from(entity: MedicationEntity) -> Self {
        Self {
            creator: UserSummary {
                id: entity.created_by,
                name: entity.creator_name,
            },
            medication: Medication {
                id: entity.id,
                circle_id: entity.circle_id,
                name: entity.name,
                dosage: entity.dosage,
                frequency: entity.frequency,
                instructions: entity.instructions,
                start_date: entity.start_date,
                end_date: entity.end_date,
                is_active: entity.is_active,
                created_by: entity.created_by,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
        }
    }
}
