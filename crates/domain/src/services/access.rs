//! Circle access decisions.

use thiserror::Error;

use crate::models::{CircleMembership, CircleRole};

/// Privilege an operation needs within a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Member,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("You are not a member of this circle")]
    NotMember,

    #[error("This action requires the circle admin role")]
    NotAdmin,
}

/// Grants access given the caller's membership row, if any.
pub fn authorize(
    membership: Option<CircleMembership>,
    level: AccessLevel,
) -> Result<CircleMembership, AccessDenied> {
    let membership = membership.ok_or(AccessDenied::NotMember)?;
    match level {
        AccessLevel::Member => Ok(membership),
        AccessLevel::Admin if membership.role == CircleRole::Admin => Ok(membership),
        AccessLevel::Admin => Err(AccessDenied::NotAdmin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn membership(role: CircleRole) -> CircleMembership {
        CircleMembership {
            id: 1,
            circle_id: 2,
            user_id: 3,
            role,
            display_name: "Ann".to_string(),
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_membership_is_denied() {
        assert_eq!(
            authorize(None, AccessLevel::Member),
            Err(AccessDenied::NotMember)
        );
        assert_eq!(
            authorize(None, AccessLevel::Admin),
            Err(AccessDenied::NotMember)
        );
    }

    #[test]
    fn test_member_level() {
        for role in [CircleRole::Admin, CircleRole::Member] {
            let granted = authorize(Some(membership(role)), AccessLevel::Member).unwrap();
            assert_eq!(granted.role, role);
        }
    }

    #[test]
    fn test_admin_level() {
        assert!(authorize(Some(membership(CircleRole::Admin)), AccessLevel::Admin).is_ok());
        assert_eq!(
            authorize(Some(membership(CircleRole::Member)), AccessLevel::Admin),
            Err(AccessDenied::NotAdmin)
        );
    }
}
