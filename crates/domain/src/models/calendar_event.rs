//! Calendar event models.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::patch::{apply_optional, apply_required_text, apply_value, double_option};
use super::user::UserSummary;

/// Kind of calendar entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Appointment,
    Checkup,
    Therapy,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Appointment => "appointment",
            EventType::Checkup => "checkup",
            EventType::Therapy => "therapy",
            EventType::Other => "other",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "appointment" => Ok(EventType::Appointment),
            "checkup" => Ok(EventType::Checkup),
            "therapy" => Ok(EventType::Therapy),
            "other" => Ok(EventType::Other),
            _ => Err(format!("Invalid event type: {}", s)),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry on the circle's shared calendar.
///
/// `reminder_time` is persisted for clients but nothing schedules on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: i64,
    pub circle_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: EventType,
    pub reminder_time: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventView {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub creator: UserSummary,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_end_date: Option<DateTime<Utc>>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    pub event_type: Option<EventType>,
    pub reminder_time: Option<DateTime<Utc>>,
}

/// Fields a calendar event update may touch.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub event_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "double_option")]
    pub event_end_date: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<Option<String>>,

    pub event_type: Option<EventType>,

    #[serde(default, deserialize_with = "double_option")]
    pub reminder_time: Option<Option<DateTime<Utc>>>,
}

impl EventPatch {
    pub fn apply(self, event: &mut CalendarEvent) {
        apply_required_text(&mut event.title, self.title);
        apply_optional(&mut event.description, self.description);
        apply_value(&mut event.event_date, self.event_date);
        apply_optional(&mut event.event_end_date, self.event_end_date);
        apply_optional(&mut event.location, self.location);
        apply_value(&mut event.event_type, self.event_type);
        apply_optional(&mut event.reminder_time, self.reminder_time);
    }
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
}

/// Resolved event filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub event_type: Option<EventType>,
}

impl ListEventsQuery {
    pub fn into_filter(self) -> Result<EventFilter, String> {
        let event_type = self
            .event_type
            .as_deref()
            .map(EventType::from_str)
            .transpose()?;

        Ok(EventFilter {
            from: self.start_date,
            until: self.end_date,
            event_type,
        })
    }
}

/// Half-open UTC range `[first day of month, first day of next month)`.
///
/// Returns `None` for a month outside 1..=12.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;

    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0)?),
    ))
}
