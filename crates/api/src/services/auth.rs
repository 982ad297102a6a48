//! Account registration, login and profile management.

use std::sync::Arc;

use domain::models::user::normalize_email;
use domain::models::User;
use persistence::repositories::{is_unique_violation, UserRepository};
use shared::jwt::{IssuedToken, JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LENGTH};
use sqlx::PgPool;
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("{0}")]
    WeakPassword(String),

    /// Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::WeakPassword(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::DatabaseError(db_err) => ApiError::from(db_err),
            AuthError::TokenError(_) | AuthError::PasswordError(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub token: IssuedToken,
}

pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Creates an account and signs the new user in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, AuthError> {
        validate_password(password)?;

        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let user: User = match self
            .users
            .create_user(&email, name.trim(), &password_hash)
            .await
        {
            Ok(entity) => entity.into(),
            // Lost a race with a concurrent registration
            Err(e) if is_unique_violation(&e) => return Err(AuthError::EmailAlreadyExists),
            Err(e) => return Err(e.into()),
        };

        let token = self.jwt.issue(user.id)?;
        Ok(AuthResult { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let user: User = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        // An unreadable stored hash is treated like a wrong password
        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt.issue(user.id)?;
        Ok(AuthResult { user, token })
    }

    pub async fn profile(&self, user_id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update_profile(&self, user_id: i64, name: &str) -> Result<User, AuthError> {
        self.users
            .update_name(user_id, name.trim())
            .await?
            .map(User::from)
            .ok_or(AuthError::UserNotFound)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::EmailAlreadyExists),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::Unauthorized(msg) if msg == "Invalid email or password"
        ));
        assert!(matches!(
            ApiError::from(AuthError::WeakPassword("short".into())),
            ApiError::Validation(msg) if msg == "short"
        ));
        assert!(matches!(
            ApiError::from(AuthError::UserNotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::TokenError(JwtError::InvalidToken)),
            ApiError::Internal(_)
        ));
    }
}
