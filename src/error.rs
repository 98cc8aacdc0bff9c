//! Error handling module
//!
//! HTTP-facing error and its response conversion. Every error body has the
//! shape `{"errors": "<message>"}`; infrastructure details are logged and
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{AuthError, InfoError, PurchaseError, TransferError};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "internal server error";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    // Operation errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error(transparent)]
    Info(#[from] InfoError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: String,
}

impl AppError {
    /// Status code for this error. 5xx errors carry no client-visible detail.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmployeeExists => StatusCode::CONFLICT,
                AuthError::Hashing(_) | AuthError::Token(_) | AuthError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },

            // The sender is the token holder, so an unknown sender means the
            // token no longer names an employee.
            AppError::Transfer(e) => match e {
                TransferError::SenderNotFound => StatusCode::UNAUTHORIZED,
                TransferError::TransferToSameEmployee
                | TransferError::NegativeTransferAmount
                | TransferError::NotEnoughCoins
                | TransferError::ReceiverNotFound => StatusCode::BAD_REQUEST,
                TransferError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },

            AppError::Purchase(e) => match e {
                PurchaseError::EmployeeNotFound => StatusCode::UNAUTHORIZED,
                PurchaseError::ItemNotFound | PurchaseError::NotEnoughCoins => {
                    StatusCode::BAD_REQUEST
                }
                PurchaseError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },

            AppError::Info(e) => match e {
                InfoError::EmployeeNotFound => StatusCode::UNAUTHORIZED,
                InfoError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let errors = if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}
