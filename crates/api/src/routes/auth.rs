//! Account routes: registration, login and profile.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{UserAuth, ValidJson};
use crate::middleware::metrics::record_user_registered;
use crate::services::auth::{AuthResult, AuthService};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires_in: i64,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: UserProfile::from(&result.user),
            token: result.token.token,
            expires_in: result.token.expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let result = AuthService::new(state.pool.clone(), state.jwt.clone())
        .register(&request.name, &request.email, &request.password)
        .await?;

    info!(user_id = result.user.id, jti = %result.token.jti, "User registered");
    record_user_registered();

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let result = AuthService::new(state.pool.clone(), state.jwt.clone())
        .login(&request.email, &request.password)
        .await?;

    info!(user_id = result.user.id, jti = %result.token.jti, "User logged in");
    Ok(Json(result.into()))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = AuthService::new(state.pool.clone(), state.jwt.clone())
        .profile(user_auth.user_id)
        .await?;

    Ok(Json(ProfileResponse {
        user: UserProfile::from(&user),
    }))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user_auth: UserAuth,
    ValidJson(request): ValidJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    request.validate()?;

    let user = AuthService::new(state.pool.clone(), state.jwt.clone())
        .update_profile(user_auth.user_id, &request.name)
        .await?;

    info!(user_id = user.id, "Profile updated");
    Ok(Json(ProfileResponse {
        user: UserProfile::from(&user),
    }))
}
