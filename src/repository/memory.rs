//! In-memory Store
//!
//! Sessions are fully serialized: a session holds the table lock from
//! `begin` until it is committed or dropped, works on a private copy of the
//! tables, and publishes that copy only on commit.
//!
//! Failure points and per-call latency can be injected to exercise rollback
//! and deadline handling.
//!
//! Because a session holds the one table lock for its whole lifetime, any
//! slow step inside an operation stalls every other caller. Password hashing
//! during signup is such a step: with `Argon2Hasher::new()` parameters each
//! first login blocks the whole store for the duration of the hash, so pair
//! this store with `Argon2Hasher::fast()` outside of tests too.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{CoinTransaction, Employee, InventoryItem, InventoryRow, Item, Transfer};

use super::{
    EmployeeRepository, InventoryRepository, ItemRepository, Session, Store, StoreError,
    TransferRepository,
};

/// Catalog seeded by the initial migration
pub const DEFAULT_CATALOG: &[(&str, i64)] = &[
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

/// Store operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    Commit,
    SaveEmployee,
    /// `save_employee` reports a username collision
    EmployeeConflict,
    FindEmployee,
    UpdateEmployee,
    FindItem,
    SaveInventory,
    FindInventory,
    FindInventoryItems,
    UpdateInventory,
    SaveTransfer,
    FindTransfers,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    employees: HashMap<String, Employee>,
    items: HashMap<String, Item>,
    inventory: Vec<InventoryRow>,
    transfers: Vec<Transfer>,
}

impl Tables {
    fn username_of(&self, employee_id: Uuid) -> Option<&str> {
        self.employees
            .values()
            .find(|e| e.id == employee_id)
            .map(|e| e.username.as_str())
    }

    fn grouped_transfers(
        &self,
        matches: impl Fn(&Transfer) -> Option<Uuid>,
    ) -> Vec<CoinTransaction> {
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for transfer in &self.transfers {
            if let Some(counterparty) = matches(transfer) {
                if let Some(user) = self.username_of(counterparty) {
                    *totals.entry(user.to_string()).or_default() += transfer.amount;
                }
            }
        }
        totals
            .into_iter()
            .map(|(user, amount)| CoinTransaction { user, amount })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail: HashSet<FailPoint>,
    latency: Option<Duration>,
    commit_delay: Option<Duration>,
}

/// Shared in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<AsyncMutex<Tables>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryStore {
    /// Empty store without a catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `DEFAULT_CATALOG`
    pub fn with_default_catalog() -> Self {
        let mut tables = Tables::default();
        for (name, price) in DEFAULT_CATALOG {
            tables.items.insert(
                name.to_string(),
                Item {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    price: *price,
                },
            );
        }

        Self {
            tables: Arc::new(AsyncMutex::new(tables)),
            faults: Arc::default(),
        }
    }

    /// Make every subsequent call of `point` fail
    pub fn fail_on(&self, point: FailPoint) {
        self.faults_mut().fail.insert(point);
    }

    pub fn clear_failures(&self) {
        self.faults_mut().fail.clear();
    }

    /// Delay every store call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.faults_mut().latency = latency;
    }

    /// Keep the table lock for `delay` after a commit has been published
    pub fn set_commit_delay(&self, delay: Option<Duration>) {
        self.faults_mut().commit_delay = delay;
    }

    /// Committed state of one employee
    pub async fn employee(&self, username: &str) -> Option<Employee> {
        self.tables.lock().await.employees.get(username).cloned()
    }

    /// Committed inventory rows
    pub async fn inventory_rows(&self) -> Vec<InventoryRow> {
        self.tables.lock().await.inventory.clone()
    }

    /// Committed transfer log
    pub async fn transfers(&self) -> Vec<Transfer> {
        self.tables.lock().await.transfers.clone()
    }

    /// Sum of all committed balances
    pub async fn total_balance(&self) -> i64 {
        self.tables
            .lock()
            .await
            .employees
            .values()
            .map(|e| e.balance)
            .sum()
    }

    fn faults_mut(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        let session = MemorySession {
            guard,
            staged,
            faults: Arc::clone(&self.faults),
        };
        session.step(FailPoint::Begin).await?;
        Ok(session)
    }
}

/// Serialized session over a private copy of the tables
pub struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    faults: Arc<Mutex<Faults>>,
}

impl MemorySession {
    fn injected(&self, point: FailPoint) -> bool {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .fail
            .contains(&point)
    }

    async fn step(&self, point: FailPoint) -> Result<(), StoreError> {
        let (fail, latency) = {
            let faults = self
                .faults
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            (faults.fail.contains(&point), faults.latency)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            return Err(StoreError::Unavailable(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn commit(mut self) -> Result<(), StoreError> {
        self.step(FailPoint::Commit).await?;
        *self.guard = self.staged;

        let delay = self
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl EmployeeRepository for MemorySession {
    async fn save_employee(&mut self, employee: &Employee) -> Result<(), StoreError> {
        self.step(FailPoint::SaveEmployee).await?;
        if self.injected(FailPoint::EmployeeConflict)
            || self.staged.employees.contains_key(&employee.username)
        {
            return Err(StoreError::EmployeeExists);
        }
        self.staged
            .employees
            .insert(employee.username.clone(), employee.clone());
        Ok(())
    }

    async fn find_employee_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Employee>, StoreError> {
        self.step(FailPoint::FindEmployee).await?;
        Ok(self.staged.employees.get(username).cloned())
    }

    async fn update_employee_by_username(
        &mut self,
        username: &str,
        employee: &Employee,
    ) -> Result<(), StoreError> {
        self.step(FailPoint::UpdateEmployee).await?;
        if self.staged.employees.remove(username).is_some() {
            self.staged
                .employees
                .insert(employee.username.clone(), employee.clone());
        }
        Ok(())
    }

    async fn lock_employees(&mut self, _usernames: &[&str]) -> Result<(), StoreError> {
        // The session already holds the table lock.
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for MemorySession {
    async fn find_item_by_name(&mut self, name: &str) -> Result<Option<Item>, StoreError> {
        self.step(FailPoint::FindItem).await?;
        Ok(self.staged.items.get(name).cloned())
    }
}

#[async_trait]
impl InventoryRepository for MemorySession {
    async fn save_inventory(&mut self, row: &InventoryRow) -> Result<(), StoreError> {
        self.step(FailPoint::SaveInventory).await?;
        match self
            .staged
            .inventory
            .iter_mut()
            .find(|r| r.employee_id == row.employee_id && r.item_id == row.item_id)
        {
            Some(existing) => existing.amount += row.amount,
            None => self.staged.inventory.push(row.clone()),
        }
        Ok(())
    }

    async fn find_inventory(
        &mut self,
        employee_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryRow>, StoreError> {
        self.step(FailPoint::FindInventory).await?;
        Ok(self
            .staged
            .inventory
            .iter()
            .find(|r| r.employee_id == employee_id && r.item_id == item_id)
            .cloned())
    }

    async fn find_inventory_items(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<InventoryItem>, StoreError> {
        self.step(FailPoint::FindInventoryItems).await?;

        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for row in self.staged.inventory.iter().filter(|r| r.employee_id == employee_id) {
            if let Some(item) = self.staged.items.values().find(|i| i.id == row.item_id) {
                *totals.entry(item.name.clone()).or_default() += row.amount;
            }
        }

        Ok(totals
            .into_iter()
            .map(|(item_type, quantity)| InventoryItem {
                item_type,
                quantity,
            })
            .collect())
    }

    async fn update_inventory_by_id(
        &mut self,
        id: Uuid,
        row: &InventoryRow,
    ) -> Result<(), StoreError> {
        self.step(FailPoint::UpdateInventory).await?;
        if let Some(existing) = self.staged.inventory.iter_mut().find(|r| r.id == id) {
            existing.employee_id = row.employee_id;
            existing.item_id = row.item_id;
            existing.amount = row.amount;
        }
        Ok(())
    }
}

#[async_trait]
impl TransferRepository for MemorySession {
    async fn save_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError> {
        self.step(FailPoint::SaveTransfer).await?;
        self.staged.transfers.push(transfer.clone());
        Ok(())
    }

    async fn find_incoming_grouped_by_sender(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<CoinTransaction>, StoreError> {
        self.step(FailPoint::FindTransfers).await?;
        Ok(self
            .staged
            .grouped_transfers(|t| (t.to_employee == employee_id).then_some(t.from_employee)))
    }

    async fn find_outgoing_grouped_by_receiver(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<CoinTransaction>, StoreError> {
        self.step(FailPoint::FindTransfers).await?;
        Ok(self
            .staged
            .grouped_transfers(|t| (t.from_employee == employee_id).then_some(t.to_employee)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_employee_conflict() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();

        session.save_employee(&Employee::new("alice", "h1")).await.unwrap();
        let result = session.save_employee(&Employee::new("alice", "h2")).await;

        assert!(matches!(result, Err(StoreError::EmployeeExists)));
    }

    #[tokio::test]
    async fn test_uncommitted_session_is_discarded() {
        let store = MemoryStore::new();
        {
            let mut session = store.begin().await.unwrap();
            session.save_employee(&Employee::new("alice", "h")).await.unwrap();
        }
        assert!(store.employee("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_save_inventory_accumulates_same_pair() {
        let store = MemoryStore::with_default_catalog();
        let mut session = store.begin().await.unwrap();
        let employee = Employee::new("alice", "h");
        let item = session.find_item_by_name("cup").await.unwrap().unwrap();

        session.save_inventory(&InventoryRow::first(employee.id, item.id)).await.unwrap();
        session.save_inventory(&InventoryRow::first(employee.id, item.id)).await.unwrap();
        session.commit().await.unwrap();

        let rows = store.inventory_rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 2);
    }

    #[tokio::test]
    async fn test_grouped_transfers_sum_per_counterparty() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let alice = Employee::new("alice", "h");
        let bob = Employee::new("bob", "h");
        let carol = Employee::new("carol", "h");
        for e in [&alice, &bob, &carol] {
            session.save_employee(e).await.unwrap();
        }

        session.save_transfer(&Transfer::new(alice.id, bob.id, 10)).await.unwrap();
        session.save_transfer(&Transfer::new(alice.id, bob.id, 15)).await.unwrap();
        session.save_transfer(&Transfer::new(alice.id, carol.id, 5)).await.unwrap();
        session.save_transfer(&Transfer::new(carol.id, alice.id, 7)).await.unwrap();

        let sent = session.find_outgoing_grouped_by_receiver(alice.id).await.unwrap();
        assert_eq!(
            sent,
            vec![
                CoinTransaction { user: "bob".to_string(), amount: 25 },
                CoinTransaction { user: "carol".to_string(), amount: 5 },
            ]
        );

        let received = session.find_incoming_grouped_by_sender(alice.id).await.unwrap();
        assert_eq!(received, vec![CoinTransaction { user: "carol".to_string(), amount: 7 }]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on(FailPoint::SaveTransfer);
        let mut session = store.begin().await.unwrap();

        let result = session
            .save_transfer(&Transfer::new(Uuid::new_v4(), Uuid::new_v4(), 1))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        store.clear_failures();
        assert!(session
            .save_transfer(&Transfer::new(Uuid::new_v4(), Uuid::new_v4(), 1))
            .await
            .is_ok());
    }
}
