//! Domain Error Types
//!
//! One closed error enum per operation. Business rejections are distinct
//! variants; everything the store reports is carried in `Store` and treated
//! as an infrastructure fault by the caller.

use thiserror::Error;

use crate::repository::StoreError;

/// Errors from `AuthHandler::authorize`
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password for an existing employee
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A concurrent first login created the same username first
    #[error("employee already exists")]
    EmployeeExists,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmployeeExists => Self::EmployeeExists,
            other => Self::Store(other),
        }
    }
}

/// Errors from `TransferHandler::send_coins`
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer to same employee")]
    TransferToSameEmployee,

    #[error("negative transfer amount")]
    NegativeTransferAmount,

    #[error("sender not found")]
    SenderNotFound,

    #[error("not enough coins")]
    NotEnoughCoins,

    #[error("receiver not found")]
    ReceiverNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from `PurchaseHandler::buy`
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("employee not found")]
    EmployeeNotFound,

    #[error("item not found")]
    ItemNotFound,

    #[error("not enough coins")]
    NotEnoughCoins,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from `InfoHandler::get`
#[derive(Debug, Error)]
pub enum InfoError {
    #[error("employee not found")]
    EmployeeNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session token failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TransferError {
    /// Check if this is a client error (caller may retry with other input)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

impl PurchaseError {
    /// Check if this is a client error (caller may retry with other input)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
