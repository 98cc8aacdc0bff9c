//! Purchase Handler

use crate::domain::{InventoryRow, PurchaseError};
use crate::repository::{
    EmployeeRepository, InventoryRepository, ItemRepository, Staged, Store, UnitOfWork,
};

/// Handler for buying catalog items
#[derive(Clone)]
pub struct PurchaseHandler<S> {
    uow: UnitOfWork<S>,
}

impl<S: Store> PurchaseHandler<S> {
    pub fn new(uow: UnitOfWork<S>) -> Self {
        Self { uow }
    }

    /// Buy one unit of `item` for `username`
    pub async fn buy(&self, item: &str, username: &str) -> Result<(), PurchaseError> {
        match self.uow.run(self.stage_purchase(item, username)).await {
            Ok(balance) => {
                tracing::info!(username = %username, item = %item, balance = balance, "Item purchased");
                Ok(())
            }
            Err(e) if e.is_client_error() => {
                tracing::info!(username = %username, item = %item, "Purchase rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::error!(username = %username, item = %item, "Purchase failed: {}", e);
                Err(e)
            }
        }
    }

    async fn stage_purchase(
        &self,
        item: &str,
        username: &str,
    ) -> Staged<S::Session, i64, PurchaseError> {
        let mut session = self.uow.begin().await?;
        let outcome = Self::apply(&mut session, item, username).await;
        Ok((session, outcome))
    }

    /// Returns the balance left after the purchase
    async fn apply(
        session: &mut S::Session,
        item_name: &str,
        username: &str,
    ) -> Result<i64, PurchaseError> {
        session.lock_employees(&[username]).await?;

        let mut employee = session
            .find_employee_by_username(username)
            .await?
            .ok_or(PurchaseError::EmployeeNotFound)?;

        let item = session
            .find_item_by_name(item_name)
            .await?
            .ok_or(PurchaseError::ItemNotFound)?;

        if !employee.can_afford(item.price) {
            return Err(PurchaseError::NotEnoughCoins);
        }

        employee.balance -= item.price;
        session.update_employee_by_username(username, &employee).await?;

        match session.find_inventory(employee.id, item.id).await? {
            Some(mut row) => {
                row.amount += 1;
                session.update_inventory_by_id(row.id, &row).await?;
            }
            None => {
                session
                    .save_inventory(&InventoryRow::first(employee.id, item.id))
                    .await?;
            }
        }

        Ok(employee.balance)
    }
}
