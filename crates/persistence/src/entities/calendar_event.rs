//! Calendar event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::calendar_event::{CalendarEvent, CalendarEventView, EventType};
use domain::models::UserSummary;
use sqlx::FromRow;

/// Database enum for event_type that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
pub enum EventTypeDb {
    Appointment,
    Checkup,
    Therapy,
    Other,
}

impl From<EventTypeDb> for EventType {
    fn from(db: EventTypeDb) -> Self {
        match db {
            EventTypeDb::Appointment => EventType::Appointment,
            EventTypeDb::Checkup => EventType::Checkup,
            EventTypeDb::Therapy => EventType::Therapy,
            EventTypeDb::Other => EventType::Other,
        }
    }
}

impl From<EventType> for EventTypeDb {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Appointment => EventTypeDb::Appointment,
            EventType::Checkup => EventTypeDb::Checkup,
            EventType::Therapy => EventTypeDb::Therapy,
            EventType::Other => EventTypeDb::Other,
        }
    }
}

/// Calendar event row joined with the creator's name.
#[derive(Debug, Clone, FromRow)]
pub struct CalendarEventEntity {
    pub id: i64,
    pub circle_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: EventTypeDb,
    pub reminder_time: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator_name: String,
}

impl From<CalendarEventEntity> for CalendarEventView {
    fn from(entity: CalendarEventEntity) -> Self {
        Self {
            creator: UserSummary {
                id: entity.created_by,
                name: entity.creator_name,
            },
            event: CalendarEvent {
                id: entity.id,
                circle_id: entity.circle_id,
                title: entity.title,
                description: entity.description,
                event_date: entity.event_date,
                event_end_date: entity.event_end_date,
                location: entity.location,
                event_type: entity.event_type.into(),
                reminder_time: entity.reminder_time,
                created_by: entity.created_by,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
        }
    }
}
