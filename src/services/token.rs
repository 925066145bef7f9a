//! Bearer token issuance and verification (HS256 JWT).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::config::SecurityConfig;
use crate::domain::{Role, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::Malformed(format!("subject is not a user id: {}", self.sub)))
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token error: {0}")]
    Token(String),

    #[error("malformed token: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_minutes)
    }

    /// # Errors
    ///
    /// Returns [`TokenError::Token`] if signing fails.
    pub fn issue(&self, user_id: UserId, username: &str, role: Role) -> Result<IssuedToken, TokenError> {
        let now = OffsetDateTime::now_utc();
        let expires_at = (now + self.ttl).unix_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: expires_at,
            iat: now.unix_timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Token(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Token`] for a bad signature, expired or garbled token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| TokenError::Token(e.to_string()))?;
        Ok(data.claims)
    }
}
