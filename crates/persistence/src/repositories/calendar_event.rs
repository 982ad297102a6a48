//! Calendar event repository. Every statement is scoped by circle.

use chrono::{DateTime, Utc};
use domain::models::calendar_event::{
    CalendarEvent, CalendarEventView, CreateEventRequest, EventFilter, EventPatch,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{CalendarEventEntity, EventTypeDb};
use crate::metrics::QueryTimer;

const SELECT_EVENT: &str = r#"
    SELECT e.id, e.circle_id, e.title, e.description, e.event_date, e.event_end_date,
           e.location, e.event_type, e.reminder_time, e.created_by, e.created_at, e.updated_at,
           u.name AS creator_name
    FROM calendar_events e
    JOIN users u ON u.id = e.created_by
"#;

#[derive(Clone)]
pub struct CalendarEventRepository {
    pool: PgPool,
}

impl CalendarEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        circle_id: i64,
        created_by: i64,
        request: &CreateEventRequest,
    ) -> Result<CalendarEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_calendar_event");
        let result = sqlx::query_as::<_, CalendarEventEntity>(
            r#"
            WITH inserted AS (
                INSERT INTO calendar_events
                    (circle_id, title, description, event_date, event_end_date, location,
                     event_type, reminder_time, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT i.id, i.circle_id, i.title, i.description, i.event_date, i.event_end_date,
                   i.location, i.event_type, i.reminder_time, i.created_by, i.created_at,
                   i.updated_at, u.name AS creator_name
            FROM inserted i
            JOIN users u ON u.id = i.created_by
            "#,
        )
        .bind(circle_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(request.event_date)
        .bind(request.event_end_date)
        .bind(&request.location)
        .bind(EventTypeDb::from(request.event_type.unwrap_or_default()))
        .bind(request.reminder_time)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Events of a circle in chronological order.
    pub async fn list(
        &self,
        circle_id: i64,
        filter: &EventFilter,
    ) -> Result<Vec<CalendarEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_calendar_events");
        let query = format!(
            "{SELECT_EVENT}
            WHERE e.circle_id = $1
              AND ($2::timestamptz IS NULL OR e.event_date >= $2)
              AND ($3::timestamptz IS NULL OR e.event_date <= $3)
              AND ($4::event_type IS NULL OR e.event_type = $4)
            ORDER BY e.event_date ASC, e.id ASC"
        );
        let result = sqlx::query_as::<_, CalendarEventEntity>(&query)
            .bind(circle_id)
            .bind(filter.from)
            .bind(filter.until)
            .bind(filter.event_type.map(EventTypeDb::from))
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Events with `event_date` in `[start, end)`.
    pub async fn list_between(
        &self,
        circle_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_calendar_events_between");
        let query = format!(
            "{SELECT_EVENT}
            WHERE e.circle_id = $1 AND e.event_date >= $2 AND e.event_date < $3
            ORDER BY e.event_date ASC, e.id ASC"
        );
        let result = sqlx::query_as::<_, CalendarEventEntity>(&query)
            .bind(circle_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find(
        &self,
        circle_id: i64,
        id: i64,
    ) -> Result<Option<CalendarEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_calendar_event");
        let query = format!("{SELECT_EVENT} WHERE e.id = $1 AND e.circle_id = $2");
        let result = sqlx::query_as::<_, CalendarEventEntity>(&query)
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
        patch: EventPatch,
    ) -> Result<Option<CalendarEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_calendar_event");
        let mut tx = self.pool.begin().await?;

        let query = format!("{SELECT_EVENT} WHERE e.id = $1 AND e.circle_id = $2 FOR UPDATE OF e");
        let current = sqlx::query_as::<_, CalendarEventEntity>(&query)
            .bind(id)
            .bind(circle_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let mut event = CalendarEventView::from(current).event;
        patch.apply(&mut event);
        let updated = write_back(&mut tx, &event).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(updated))
    }

    pub async fn delete(&self, circle_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_calendar_event");
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1 AND circle_id = $2")
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
    event: &CalendarEvent,
) -> Result<CalendarEventEntity, sqlx::Error> {
    sqlx::query_as::<_, CalendarEventEntity>(
        r#"
        WITH updated AS (
            UPDATE calendar_events
            SET title = $3, description = $4, event_date = $5, event_end_date = $6,
                location = $7, event_type = $8, reminder_time = $9, updated_at = NOW()
            WHERE id = $1 AND circle_id = $2
            RETURNING *
        )
        SELECT d.id, d.circle_id, d.title, d.description, d.event_date, d.event_end_date,
               d.location, d.event_type, d.reminder_time, d.created_by, d.created_at,
               d.updated_at, u.name AS creator_name
        FROM updated d
        JOIN users u ON u.id = d.created_by
        "#,
    )
    .bind(event.id)
    .bind(event.circle_id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.event_date)
    .bind(event.event_end_date)
    .bind(&event.location)
    .bind(EventTypeDb::from(event.event_type))
    .bind(event.reminder_time)
    .fetch_one(&mut **tx)
    .await
}
