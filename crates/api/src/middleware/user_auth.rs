//! Bearer token authentication.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use persistence::repositories::UserRepository;
use shared::jwt::{JwtConfig, JwtError};

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    pub user_id: i64,
    /// Token id, for correlating a session in logs.
    pub jti: String,
}

impl UserAuth {
    /// Verifies a token and reads the user id out of it.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.validate(token)?;
        Ok(UserAuth {
            user_id: claims.user_id()?,
            jti: claims.jti,
        })
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid token for an existing user.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
            .into_response();
    };

    let auth = match UserAuth::validate(&state.jwt, token) {
        Ok(auth) => auth,
        Err(e) => {
            tracing::debug!(error = %e, "JWT validation failed");
            return ApiError::Unauthorized("Invalid or expired token".to_string())
                .into_response();
        }
    };

    // Tokens outlive accounts; a deleted user must not keep access.
    match UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiError::Unauthorized("User no longer exists".to_string()).into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    }

    req.extensions_mut().insert(auth);
    next.run(req).await
}
