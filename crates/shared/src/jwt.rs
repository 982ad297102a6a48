//! Session tokens signed with RS256.
//!
//! The subject claim carries the numeric user id. Each token gets a random
//! `jti` so individual sessions can be told apart in logs.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    /// Parses the subject back into a user id.
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub.parse::<i64>().map_err(|_| JwtError::InvalidToken)
    }
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_in: i64,
}

/// Signing and verification keys plus token lifetime.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    /// Token lifetime in seconds (default: 604800 = 7 days)
    pub token_expiry_secs: i64,
    /// Clock skew tolerance in seconds
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// Builds a config from an RSA key pair in PEM format.
    pub fn new(
        private_key_pem: &str,
        public_key_pem: &str,
        token_expiry_secs: i64,
    ) -> Result<Self, JwtError> {
        Self::with_leeway(
            private_key_pem,
            public_key_pem,
            token_expiry_secs,
            DEFAULT_LEEWAY_SECS,
        )
    }

    /// Builds a config from an RSA key pair with a custom clock skew leeway.
    pub fn with_leeway(
        private_key_pem: &str,
        public_key_pem: &str,
        token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            token_expiry_secs,
            leeway_secs,
        })
    }

    /// HS256 config for unit tests. Never used outside tests.
    #[cfg(test)]
    pub fn new_for_testing(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            token_expiry_secs: 900,
            leeway_secs: 0,
        }
    }

    /// Issues a session token for the given user.
    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(self.token_expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_in: self.token_expiry_secs,
        })
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn config() -> JwtConfig {
        JwtConfig::new_for_testing("care_circle_test_secret_0123456789")
    }

    #[test]
    fn test_issue_and_validate() {
        let config = config();
        let issued = config.issue(42).unwrap();

        assert!(issued.token.contains('.'));
        assert_eq!(issued.expires_in, 900);

        let claims = config.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn test_unique_jti_per_token() {
        let config = config();
        let a = config.issue(1).unwrap();
        let b = config.issue(1).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_token() {
        let mut config = config();
        config.token_expiry_secs = 1;
        let issued = config.issue(7).unwrap();

        sleep(StdDuration::from_secs(2));

        let result = config.validate(&issued.token);
        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issued = JwtConfig::new_for_testing("another_secret_entirely_0000000")
            .issue(3)
            .unwrap();
        assert!(matches!(
            config().validate(&issued.token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(config().validate("not_a_jwt").is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "abc".to_string(),
            exp: 0,
            iat: 0,
            jti: String::new(),
        };
        assert!(matches!(claims.user_id(), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_claims_timestamps() {
        let config = config();
        let before = Utc::now().timestamp();
        let issued = config.issue(9).unwrap();
        let claims = config.validate(&issued.token).unwrap();

        assert!(claims.iat >= before);
        assert_eq!(claims.exp - claims.iat, config.token_expiry_secs);
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let result = JwtConfig::new("not a key", "not a key", 60);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }
}
