//! coin_shop Library
//!
//! Re-exports modules for integration testing, the load driver and the
//! server binary.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod repository;

mod error;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{AuthError, InfoError, PurchaseError, TokenError, TransferError};
pub use repository::{MemoryStore, PgStore, Store, StoreError, UnitOfWork};
