//! Membership lifecycle rules.
//!
//! A circle must keep at least one admin while it has members, and it
//! ceases to exist once its last member leaves.

use thiserror::Error;

use crate::models::CircleRole;

/// Why a member may not leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LeaveRejection {
    #[error("You are the only admin. Designate another admin before leaving the circle")]
    SoleAdmin,
}

/// What a successful leave did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Membership removed, circle still has members.
    Left,
    /// Membership removed and the now empty circle deleted.
    CircleDeleted,
}

/// Decides whether a member with `role` may leave.
///
/// `admin_count` and `member_count` are taken before the membership is
/// removed and include the leaving member.
pub fn check_leave(
    role: CircleRole,
    admin_count: i64,
    member_count: i64,
) -> Result<(), LeaveRejection> {
    if role == CircleRole::Admin && admin_count <= 1 && member_count > 1 {
        return Err(LeaveRejection::SoleAdmin);
    }
    Ok(())
}

/// Outcome once the membership is gone, from the number of members left.
pub fn outcome_after_leave(remaining_members: i64) -> LeaveOutcome {
    if remaining_members == 0 {
        LeaveOutcome::CircleDeleted
    } else {
        LeaveOutcome::Left
    }
}
