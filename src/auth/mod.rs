//! Auth module
//!
//! Password hashing and session tokens.

pub mod password;
pub mod token;

pub use password::{Argon2Hasher, CredentialHasher};
pub use token::{JwtSigner, TokenClaims};
