//! Medication repository. Every statement is scoped by circle.

use domain::models::medication::{CreateMedicationRequest, Medication, MedicationPatch, MedicationView};
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::MedicationEntity;
use crate::metrics::QueryTimer;

const SELECT_MEDICATION: &str = r#"
    SELECT m.id, m.circle_id, m.name, m.dosage, m.frequency, m.instructions,
           m.start_date, m.end_date, m.is_active, m.created_by, m.created_at, m.updated_at,
           u.name AS creator_name
    FROM medications m
    JOIN users u ON u.id = m.created_by
"#;

#[derive(Clone)]
pub struct MedicationRepository {
    pool: PgPool,
}

impl MedicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        circle_id: i64,
        created_by: i64,
        request: &CreateMedicationRequest,
    ) -> Result<MedicationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_medication");
        let result = sqlx::query_as::<_, MedicationEntity>(
            r#"
            WITH inserted AS (
                INSERT INTO medications
                    (circle_id, name, dosage, frequency, instructions, start_date, end_date, is_active, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT i.id, i.circle_id, i.name, i.dosage, i.frequency, i.instructions,
                   i.start_date, i.end_date, i.is_active, i.created_by, i.created_at, i.updated_at,
                   u.name AS creator_name
            FROM inserted i
            JOIN users u ON u.id = i.created_by
            "#,
        )
        .bind(circle_id)
        .bind(request.name.trim())
        .bind(&request.dosage)
        .bind(&request.frequency)
        .bind(&request.instructions)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.is_active.unwrap_or(true))
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Medications of a circle, newest first, optionally filtered by `is_active`.
    pub async fn list(
        &self,
        circle_id: i64,
        active: Option<bool>,
    ) -> Result<Vec<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_medications");
        let query = format!(
            "{SELECT_MEDICATION}
            WHERE m.circle_id = $1 AND ($2::boolean IS NULL OR m.is_active = $2)
            ORDER BY m.created_at DESC, m.id DESC"
        );
        let result = sqlx::query_as::<_, MedicationEntity>(&query)
            .bind(circle_id)
            .bind(active)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find(
        &self,
        circle_id: i64,
        id: i64,
    ) -> Result<Option<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_medication");
        let query = format!("{SELECT_MEDICATION} WHERE m.id = $1 AND m.circle_id = $2");
        let result = sqlx::query_as::<_, MedicationEntity>(&query)
            .bind(id)
            .bind(circle_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Applies a patch under a row lock. `None` if the row is not in this circle.
    pub async fn update(
        &self,
        circle_id: i64,
        id: i64,
        patch: MedicationPatch,
    ) -> Result<Option<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_medication");
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "{SELECT_MEDICATION} WHERE m.id = $1 AND m.circle_id = $2 FOR UPDATE OF m"
        );
        let current = sqlx::query_as::<_, MedicationEntity>(&query)
            .bind(id)
            .bind(circle_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let mut medication = MedicationView::from(current).medication;
        patch.apply(&mut medication);
        let updated = write_back(&mut tx, &medication).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(updated))
    }

    /// Deletes a medication. Returns false if it is not in this circle.
    pub async fn delete(&self, circle_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_medication");
        let result = sqlx::query("DELETE FROM medications WHERE id = $1 AND circle_id = $2")
            .bind(id)
            .bind(circle_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}

async fn write_back(
    tx: &mut Transaction<'_, Postgres>,
    medication: &Medication,
) -> Result<MedicationEntity, sqlx::Error> {
    sqlx::query_as::<_, MedicationEntity>(
        r#"
        WITH updated AS (
            UPDATE medications
            SET name = $3, dosage = $4, frequency = $5, instructions = $6,
                start_date = $7, end_date = $8, is_active = $9, updated_at = NOW()
            WHERE id = $1 AND circle_id = $2
            RETURNING *
        )
        SELECT d.id, d.circle_id, d.name, d.dosage, d.frequency, d.instructions,
               d.start_date, d.end_date, d.is_active, d.created_by, d.created_at, d.updated_at,
               u.name AS creator_name
        FROM updated d
        JOIN users u ON u.id = d.created_by
        "#,
    )
    .bind(medication.id)
    .bind(medication.circle_id)
    .bind(&medication.name)
    .bind(&medication.dosage)
    .bind(&medication.frequency)
    .bind(&medication.instructions)
    .bind(medication.start_date)
    .bind(medication.end_date)
    .bind(medication.is_active)
    .fetch_one(&mut **tx)
    .await
}
