//! Handlers module
//!
//! The four shop operations. Each one validates what it can without the
//! store, then performs its reads and writes inside a single unit of work.

mod auth_handler;
mod info_handler;
mod purchase_handler;
mod transfer_handler;


pub use auth_handler::{AuthHandler, AuthResult};
pub use info_handler::InfoHandler;
pub use purchase_handler::PurchaseHandler;
pub use transfer_handler::TransferHandler;
