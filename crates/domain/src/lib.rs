//! Domain layer for the Care Circle backend.
//!
//! This crate contains:
//! - Domain models (User, Circle, Medication, CalendarEvent, Task)
//! - Request and patch DTOs with their validation rules
//! - Pure membership and access rules used by the API layer

pub mod models;
pub mod services;
