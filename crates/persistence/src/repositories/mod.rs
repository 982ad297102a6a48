//! Repository implementations for database operations.

pub mod calendar_event;
pub mod circle;
pub mod medication;
pub mod task;
pub mod user;

pub use calendar_event::CalendarEventRepository;
pub use circle::{is_unique_violation, CircleRepository, LeaveResult};
pub use medication::MedicationRepository;
pub use task::TaskRepository;
pub use user::UserRepository;
