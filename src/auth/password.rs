//! Password hashing
//!
//! Argon2id with a random salt per password, stored as a PHC string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::domain::AuthError;

/// Slow, salted one-way hash for employee passwords
pub trait CredentialHasher: Send + Sync + 'static {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `false` for a mismatch and for an unparseable stored hash
    fn verify(&self, password_hash: &str, password: &str) -> bool;
}

/// Argon2id hasher
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Hasher with the crate's recommended cost parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum-cost parameters, for tests and load runs only
    pub fn fast() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password_hash: &str, password: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }
}
