//! Circle membership gate.
//!
//! Runs after `require_user_auth` on the circle-scoped routes.
//! The confirmed `CircleMembership` goes into request extensions, and
//! handlers take the circle id from it rather than from the path.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::services::AccessLevel;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::services::access::require_access;

/// Requires the caller to belong to the circle in the path.
pub async fn require_circle_member(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    gate(state, req, next, AccessLevel::Member).await
}

/// Requires the caller to be an admin of the circle in the path.
pub async fn require_circle_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    gate(state, req, next, AccessLevel::Admin).await
}

async fn gate(state: AppState, mut req: Request<Body>, next: Next, level: AccessLevel) -> Response {
    let Some(auth) = req.extensions().get::<UserAuth>().cloned() else {
        tracing::warn!("Circle gate reached without UserAuth in extensions");
        return ApiError::Unauthorized("Authentication required".to_string()).into_response();
    };

    let circle_id = match circle_id_from_path(req.uri().path()) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match require_access(&state.pool, circle_id, auth.user_id, level).await {
        Ok(membership) => {
            req.extensions_mut().insert(membership);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(circle_id, user_id = auth.user_id, "Circle access denied");
            e.into_response()
        }
    }
}

/// Reads the segment after `circles` in paths like `/api/circles/:id/...`.
fn circle_id_from_path(path: &str) -> Result<i64, ApiError> {
    let mut segments = path.split('/').skip_while(|s| *s != "circles").skip(1);
    let raw = segments
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::NotFound("Circle not found".to_string()))?;

    raw.parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("Invalid circle id: {}", raw)))
}
