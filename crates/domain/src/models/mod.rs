//! Domain models for Care Circle.

pub mod calendar_event;
pub mod circle;
pub mod medication;
pub mod patch;
pub mod task;
pub mod user;

pub use calendar_event::{CalendarEvent, EventType};
pub use circle::{Circle, CircleMembership, CircleRole};
pub use medication::Medication;
pub use task::{Task, TaskPriority, TaskStatus};
pub use user::{User, UserProfile, UserSummary};
