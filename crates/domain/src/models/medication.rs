//! Medication models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::patch::{apply_optional, apply_required_text, apply_value, double_option};
use super::user::UserSummary;

/// A medication tracked for the circle's patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
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
}

/// Medication together with its creator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationView {
    #[serde(flatten)]
    pub medication: Medication,
    pub creator: UserSummary,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicationRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 150, message = "Name must be at most 150 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Dosage must be at most 100 characters"))]
    pub dosage: Option<String>,

    #[validate(length(max = 100, message = "Frequency must be at most 100 characters"))]
    pub frequency: Option<String>,

    pub instructions: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Fields a medication update may touch.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPatch {
    #[validate(length(max = 150, message = "Name must be at most 150 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100, message = "Dosage must be at most 100 characters"))]
    pub dosage: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100, message = "Frequency must be at most 100 characters"))]
    pub frequency: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub instructions: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,

    pub is_active: Option<bool>,
}

impl MedicationPatch {
    pub fn apply(self, medication: &mut Medication) {
        apply_required_text(&mut medication.name, self.name);
        apply_optional(&mut medication.dosage, self.dosage);
        apply_optional(&mut medication.frequency, self.frequency);
        apply_optional(&mut medication.instructions, self.instructions);
        apply_optional(&mut medication.start_date, self.start_date);
        apply_optional(&mut medication.end_date, self.end_date);
        apply_value(&mut medication.is_active, self.is_active);
    }
}

/// Query parameters for listing medications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMedicationsQuery {
    pub active: Option<bool>,
}
