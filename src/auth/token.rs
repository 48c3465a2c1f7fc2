use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issue timestamp (seconds since epoch).
    pub iat: i64,
}

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The signature did not verify against the shared secret.
    InvalidToken,
    /// The payload could not be parsed.
    Malformed,
    /// The embedded expiry is in the past.
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::InvalidToken => write!(f, "invalid token signature"),
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> TokenError {
        match error.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidToken,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies signed, time-limited identity tokens (HS256).
///
/// The signing key is loaded once at startup and shared by every request.
/// There is no revocation list: a token stays valid until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generates a token for `user_id` that expires after the configured TTL.
    pub fn issue(&self, user_id: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("Token lifetime overflows the clock"))?;
        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and expiry and returns the embedded user id.
    pub fn verify(&self, token: &str) -> Result<i32, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(TokenError::from)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
