//! Session tokens
//!
//! HS256 JWTs carrying the employee id, username and an absolute expiry.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Employee, TokenError};

/// Decoded payload of a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub employee_id: Uuid,
    pub username: String,
    /// Expiry as a unix timestamp (seconds)
    pub exp: i64,
}

impl TokenClaims {
    /// Claims expiring `ttl` from now
    pub fn new(employee_id: Uuid, username: impl Into<String>, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            employee_id,
            username: username.into(),
            exp: Utc::now().timestamp().saturating_add(ttl_secs),
        }
    }
}

/// Signs and verifies session tokens with one shared key
#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Mint a token for `employee` expiring after the configured TTL
    pub fn issue(&self, employee: &Employee) -> Result<String, TokenError> {
        self.sign(&TokenClaims::new(employee.id, employee.username.clone(), self.ttl))
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

impl fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
