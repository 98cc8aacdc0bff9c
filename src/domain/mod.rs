//! Domain module
//!
//! Core domain types and per-operation errors.

pub mod error;
pub mod models;

pub use error::{AuthError, InfoError, PurchaseError, TokenError, TransferError};
pub use models::{
    CoinHistory, CoinTransaction, Employee, EmployeeInfo, InventoryItem, InventoryRow, Item,
    Transfer, INITIAL_BALANCE,
};
