//! Circle and membership entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::circle::{Circle, CircleMembership, CircleRole, CircleSummary, MemberInfo};
use domain::models::UserProfile;
use sqlx::FromRow;

/// Database enum for circle_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "circle_role", rename_all = "lowercase")]
pub enum CircleRoleDb {
    Admin,
    Member,
}

impl From<CircleRoleDb> for CircleRole {
    fn from(db_role: CircleRoleDb) -> Self {
        match db_role {
            CircleRoleDb::Admin => CircleRole::Admin,
            CircleRoleDb::Member => CircleRole::Member,
        }
    }
}

impl From<CircleRole> for CircleRoleDb {
    fn from(role: CircleRole) -> Self {
        match role {
            CircleRole::Admin => CircleRoleDb::Admin,
            CircleRole::Member => CircleRoleDb::Member,
        }
    }
}

/// Database row mapping for the circles table.
#[derive(Debug, Clone, FromRow)]
pub struct CircleEntity {
    pub id: i64,
    pub name: String,
    pub patient_name: String,
    pub code: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CircleEntity> for Circle {
    fn from(entity: CircleEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            patient_name: entity.patient_name,
            code: entity.code,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the circle_members table.
#[derive(Debug, Clone, FromRow)]
pub struct CircleMemberEntity {
    pub id: i64,
    pub circle_id: i64,
    pub user_id: i64,
    pub role: CircleRoleDb,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

impl From<CircleMemberEntity> for CircleMembership {
    fn from(entity: CircleMemberEntity) -> Self {
        Self {
            id: entity.id,
            circle_id: entity.circle_id,
            user_id: entity.user_id,
            role: entity.role.into(),
            display_name: entity.display_name,
            joined_at: entity.joined_at,
        }
    }
}

/// Circle joined with the caller's membership and the creator's profile.
#[derive(Debug, Clone, FromRow)]
pub struct CircleWithMembershipEntity {
    pub id: i64,
    pub name: String,
    pub patient_name: String,
    pub code: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Membership fields
    pub role: CircleRoleDb,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    // Creator
    pub creator_name: String,
    pub creator_email: String,
}

impl From<CircleWithMembershipEntity> for CircleSummary {
    fn from(entity: CircleWithMembershipEntity) -> Self {
        Self {
            creator: UserProfile {
                id: entity.created_by,
                name: entity.creator_name,
                email: entity.creator_email,
            },
            circle: Circle {
                id: entity.id,
                name: entity.name,
                patient_name: entity.patient_name,
                code: entity.code,
                created_by: entity.created_by,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
            my_role: entity.role.into(),
            my_display_name: entity.display_name,
            joined_at: entity.joined_at,
        }
    }
}

/// Member row joined with the member's account.
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithUserEntity {
    pub id: i64,
    pub user_id: i64,
    pub role: CircleRoleDb,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

impl From<MemberWithUserEntity> for MemberInfo {
    fn from(entity: MemberWithUserEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            role: entity.role.into(),
            display_name: entity.display_name,
            joined_at: entity.joined_at,
            user: UserProfile {
                id: entity.user_id,
                name: entity.user_name,
                email: entity.user_email,
            },
        }
    }
}
