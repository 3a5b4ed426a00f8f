use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Bearer tokens are valid for exactly one hour from issuance.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Identity claims embedded in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Hashes and verifies passwords; issues and verifies bearer tokens.
/// The signing secret is injected at startup, never a source literal.
#[derive(Clone)]
pub struct Credentials {
    secret: String,
    bcrypt_cost: u32,
}

impl Credentials {
    pub fn new(secret: impl Into<String>, bcrypt_cost: u32) -> Self {
        Self {
            secret: secret.into(),
            bcrypt_cost,
        }
    }

    /// One-way salted hash. The plaintext is never stored or logged.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Issue a signed token for an identity, expiring one hour from now.
    pub fn issue_token(&self, user_id: &str, email: &str) -> AppResult<String> {
        self.issue_token_at(user_id, email, Utc::now().timestamp())
    }

    fn issue_token_at(&self, user_id: &str, email: &str, iat: i64) -> AppResult<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify a token's signature and expiry. Returns `None` for malformed,
    /// forged, or expired tokens rather than failing the request.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        // No expiry leeway: a token is invalid from its expiry instant on
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .ok()
    }
}
