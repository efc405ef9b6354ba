//! Session-token issuance and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use plotdeck_core::account::User;
use plotdeck_core::auth::{AuthError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: Uuid,
    pub email: String,
    pub exp: i64,
}

/// Mints and verifies the HS256 session tokens handed to the browser.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Signs a minimal claim set for the account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails; the caller surfaces
    /// this as a redirect error code, never as an unhandled fault.
    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = TokenClaims {
            id: user.id,
            email: user.email.clone(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verifies a token and returns its claims. Expiry is enforced.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
