//! Circle lifecycle: creation, invite codes, joining and leaving.

use domain::models::circle::{CircleDetail, CircleSummary, MemberInfo};
use domain::models::{Circle, CircleMembership, CircleRole, UserProfile};
use domain::services::{
    generate_invite_code, is_well_formed, normalize_invite_code, LeaveOutcome, LeaveRejection,
};
use persistence::repositories::{is_unique_violation, CircleRepository, LeaveResult, UserRepository};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::metrics::{record_circle_created, record_circle_joined, record_circle_left};

#[derive(Debug, Error)]
pub enum CircleError {
    #[error("Circle not found")]
    CircleNotFound,

    #[error("Invalid invite code")]
    UnknownCode,

    #[error("You are already a member of this circle")]
    AlreadyMember,

    #[error("You are not a member of this circle")]
    NotMember,

    #[error(transparent)]
    LeaveRejected(#[from] LeaveRejection),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<CircleError> for ApiError {
    fn from(err: CircleError) -> Self {
        match err {
            CircleError::CircleNotFound
            | CircleError::UnknownCode
            | CircleError::NotMember
            | CircleError::UserNotFound => ApiError::NotFound(err.to_string()),
            CircleError::AlreadyMember => ApiError::Conflict(err.to_string()),
            CircleError::LeaveRejected(rejection) => rejection.into(),
            CircleError::DatabaseError(db_err) => ApiError::from(db_err),
        }
    }
}

/// Name to show for a member: the one supplied, else the account name.
fn resolve_display_name(requested: Option<&str>, account_name: &str) -> String {
    requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(account_name)
        .to_string()
}

/// A trimmed, non-empty replacement value, or `None` to keep the current one.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub struct CircleService {
    circles: CircleRepository,
    users: UserRepository,
}

impl CircleService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            circles: CircleRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }

    async fn account_name(&self, user_id: i64) -> Result<String, CircleError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.name)
            .ok_or(CircleError::UserNotFound)
    }

    /// Creates a circle with the creator as its first admin.
    pub async fn create(
        &self,
        creator_id: i64,
        name: &str,
        patient_name: &str,
        display_name: Option<&str>,
    ) -> Result<CircleSummary, CircleError> {
        let display_name = resolve_display_name(display_name, &self.account_name(creator_id).await?);

        let circle: Circle = self
            .circles
            .create_circle(
                name.trim(),
                patient_name.trim(),
                creator_id,
                &display_name,
                generate_invite_code,
            )
            .await?
            .into();

        info!(circle_id = circle.id, user_id = creator_id, "Circle created");
        record_circle_created();

        self.summary(circle.id, creator_id).await
    }

    /// Joins the circle owning `code` as a plain member.
    pub async fn join(
        &self,
        user_id: i64,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<CircleSummary, CircleError> {
        let code = normalize_invite_code(code);
        if !is_well_formed(&code) {
            return Err(CircleError::UnknownCode);
        }

        let circle = self
            .circles
            .find_by_code(&code)
            .await?
            .ok_or(CircleError::UnknownCode)?;

        if self.circles.get_membership(circle.id, user_id).await?.is_some() {
            return Err(CircleError::AlreadyMember);
        }

        let display_name = resolve_display_name(display_name, &self.account_name(user_id).await?);
        let membership: CircleMembership = match self
            .circles
            .add_member(circle.id, user_id, CircleRole::Member, &display_name)
            .await
        {
            Ok(entity) => entity.into(),
            // Concurrent join by the same user
            Err(e) if is_unique_violation(&e) => return Err(CircleError::AlreadyMember),
            // The circle was deleted after the lookup
            Err(e) if is_foreign_key_violation(&e) => return Err(CircleError::UnknownCode),
            Err(e) => return Err(e.into()),
        };

        info!(
            circle_id = membership.circle_id,
            user_id,
            membership_id = membership.id,
            "Joined circle"
        );
        record_circle_joined();

        self.summary(membership.circle_id, user_id).await
    }

    /// Leaves a circle; the last member out deletes it.
    pub async fn leave(&self, user_id: i64, circle_id: i64) -> Result<LeaveOutcome, CircleError> {
        match self.circles.leave_circle(circle_id, user_id).await? {
            LeaveResult::NotMember => Err(CircleError::NotMember),
            LeaveResult::Rejected(rejection) => Err(rejection.into()),
            LeaveResult::Done(outcome) => {
                let deleted = outcome == LeaveOutcome::CircleDeleted;
                info!(circle_id, user_id, circle_deleted = deleted, "Left circle");
                record_circle_left(deleted);
                Ok(outcome)
            }
        }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<CircleSummary>, CircleError> {
        Ok(self
            .circles
            .list_user_circles(user_id)
            .await?
            .into_iter()
            .map(CircleSummary::from)
            .collect())
    }

    /// Full view of a circle. Authorization is the caller's job.
    pub async fn detail(&self, circle_id: i64) -> Result<CircleDetail, CircleError> {
        let circle: Circle = self
            .circles
            .find_by_id(circle_id)
            .await?
            .ok_or(CircleError::CircleNotFound)?
            .into();

        let creator = self
            .users
            .find_by_id(circle.created_by)
            .await?
            .map(|u| UserProfile {
                id: u.id,
                name: u.name,
                email: u.email,
            })
            .ok_or(CircleError::UserNotFound)?;

        let members = self
            .circles
            .list_members(circle_id)
            .await?
            .into_iter()
            .map(MemberInfo::from)
            .collect();

        Ok(CircleDetail {
            circle,
            creator,
            members,
        })
    }

    /// Renames a circle. Blank or absent fields keep their value.
    pub async fn update(
        &self,
        circle_id: i64,
        name: Option<&str>,
        patient_name: Option<&str>,
    ) -> Result<Circle, CircleError> {
        let circle = self
            .circles
            .update_circle(circle_id, non_blank(name), non_blank(patient_name))
            .await?
            .ok_or(CircleError::CircleNotFound)?;

        info!(circle_id, "Circle updated");
        Ok(circle.into())
    }

    /// Issues a new invite code; the previous one stops working.
    pub async fn regenerate_code(&self, circle_id: i64) -> Result<String, CircleError> {
        let circle = self
            .circles
            .regenerate_code(circle_id, generate_invite_code)
            .await?
            .ok_or(CircleError::CircleNotFound)?;

        info!(circle_id, "Invite code regenerated");
        Ok(circle.code)
    }

    async fn summary(&self, circle_id: i64, user_id: i64) -> Result<CircleSummary, CircleError> {
        self.circles
            .find_user_circle(circle_id, user_id)
            .await?
            .map(CircleSummary::from)
            .ok_or(CircleError::CircleNotFound)
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code == "23503")
        .unwrap_or(false)
}
