//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod calendar_event;
pub mod circle;
pub mod medication;
pub mod task;
pub mod user;

pub use calendar_event::{CalendarEventEntity, EventTypeDb};
pub use circle::{
    CircleEntity, CircleMemberEntity, CircleRoleDb, CircleWithMembershipEntity,
    MemberWithUserEntity,
};
pub use medication::MedicationEntity;
pub use task::{TaskEntity, TaskPriorityDb, TaskStatusDb};
pub use user::UserEntity;
