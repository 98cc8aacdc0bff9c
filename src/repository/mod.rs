//! Repository module
//!
//! Persistence contracts for the four shop tables. A `Store` opens a
//! `Session` (one database transaction); the session implements every
//! repository trait, so all reads and writes of one operation share the
//! same transaction context.

mod error;
pub mod memory;
pub mod postgres;
mod uow;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CoinTransaction, Employee, InventoryItem, InventoryRow, Item, Transfer};

pub use error::StoreError;
pub use memory::{FailPoint, MemorySession, MemoryStore, DEFAULT_CATALOG};
pub use postgres::{PgSession, PgStore};
pub use uow::{Staged, UnitOfWork};

/// Employee persistence
#[async_trait]
pub trait EmployeeRepository: Send {
    /// Insert a new employee. Fails with `StoreError::EmployeeExists` on a
    /// username collision.
    async fn save_employee(&mut self, employee: &Employee) -> Result<(), StoreError>;

    async fn find_employee_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Employee>, StoreError>;

    async fn update_employee_by_username(
        &mut self,
        username: &str,
        employee: &Employee,
    ) -> Result<(), StoreError>;

    /// Lock the rows of the given employees for the rest of the session.
    /// Locks are taken in ascending id order; unknown usernames are ignored.
    async fn lock_employees(&mut self, usernames: &[&str]) -> Result<(), StoreError>;
}

/// Catalog lookups (read-only)
#[async_trait]
pub trait ItemRepository: Send {
    async fn find_item_by_name(&mut self, name: &str) -> Result<Option<Item>, StoreError>;
}

/// Employee holdings
#[async_trait]
pub trait InventoryRepository: Send {
    /// Insert a holding. If a row for the same (employee, item) pair already
    /// exists, its amount is increased by `row.amount` instead.
    async fn save_inventory(&mut self, row: &InventoryRow) -> Result<(), StoreError>;

    /// Find the holding for (employee, item), locking it for the session
    async fn find_inventory(
        &mut self,
        employee_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryRow>, StoreError>;

    /// Holdings of one employee summed per item name, ordered by name
    async fn find_inventory_items(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<InventoryItem>, StoreError>;

    async fn update_inventory_by_id(
        &mut self,
        id: Uuid,
        row: &InventoryRow,
    ) -> Result<(), StoreError>;
}

/// Transfer log
#[async_trait]
pub trait TransferRepository: Send {
    async fn save_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError>;

    /// Incoming transfers summed per sender username
    async fn find_incoming_grouped_by_sender(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<CoinTransaction>, StoreError>;

    /// Outgoing transfers summed per receiver username
    async fn find_outgoing_grouped_by_receiver(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<CoinTransaction>, StoreError>;
}

/// One open transaction. Dropping a session without committing rolls it
/// back.
#[async_trait]
pub trait Session:
    EmployeeRepository + ItemRepository + InventoryRepository + TransferRepository + Send + 'static
{
    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Source of sessions
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Session: Session;

    /// Open a read-write session
    async fn begin(&self) -> Result<Self::Session, StoreError>;

    /// Open a session whose reads all observe one snapshot
    async fn begin_snapshot(&self) -> Result<Self::Session, StoreError> {
        self.begin().await
    }
}
