//! Membership lookups backing the circle gate.

use domain::models::CircleMembership;
use domain::services::{authorize, AccessLevel};
use persistence::repositories::CircleRepository;
use sqlx::PgPool;

use crate::error::ApiError;

/// Loads the caller's membership and checks it against `level`.
pub async fn require_access(
    pool: &PgPool,
    circle_id: i64,
    user_id: i64,
    level: AccessLevel,
) -> Result<CircleMembership, ApiError> {
    let membership = CircleRepository::new(pool.clone())
        .get_membership(circle_id, user_id)
        .await?
        .map(CircleMembership::from);

    Ok(authorize(membership, level)?)
}
