//! Extractors for the authenticated caller and their circle membership.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::CircleMembership;

use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// Reads the `UserAuth` that `require_user_auth` stored.
#[async_trait]
impl<S> FromRequestParts<S> for UserAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserAuth>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// The caller's confirmed membership in the circle named by the path.
///
/// Only available on routes behind `require_circle_member` or
/// `require_circle_admin`.
#[derive(Debug, Clone)]
pub struct CircleMember(pub CircleMembership);

impl CircleMember {
    pub fn circle_id(&self) -> i64 {
        self.0.circle_id
    }

    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CircleMember
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CircleMembership>()
            .cloned()
            .map(CircleMember)
            .ok_or_else(|| {
                tracing::error!("Circle route served without the membership gate");
                ApiError::Forbidden("You are not a member of this circle".to_string())
            })
    }
}
