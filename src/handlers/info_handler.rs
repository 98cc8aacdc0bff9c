//! Info Handler
//!
//! Read-only view of one employee: balance, holdings and transfer history,
//! all read from one snapshot.

use crate::domain::{CoinHistory, EmployeeInfo, InfoError};
use crate::repository::{
    EmployeeRepository, InventoryRepository, Staged, Store, TransferRepository, UnitOfWork,
};

/// Handler for the employee info view
#[derive(Clone)]
pub struct InfoHandler<S> {
    uow: UnitOfWork<S>,
}

impl<S: Store> InfoHandler<S> {
    pub fn new(uow: UnitOfWork<S>) -> Self {
        Self { uow }
    }

    pub async fn get(&self, username: &str) -> Result<EmployeeInfo, InfoError> {
        let result = self.uow.run(self.stage_info(username)).await;
        if let Err(InfoError::Store(ref e)) = result {
            tracing::error!(username = %username, "Info lookup failed: {}", e);
        }
        result
    }

    async fn stage_info(&self, username: &str) -> Staged<S::Session, EmployeeInfo, InfoError> {
        let mut session = self.uow.begin_snapshot().await?;
        let outcome = Self::apply(&mut session, username).await;
        Ok((session, outcome))
    }

    async fn apply(session: &mut S::Session, username: &str) -> Result<EmployeeInfo, InfoError> {
        let employee = session
            .find_employee_by_username(username)
            .await?
            .ok_or(InfoError::EmployeeNotFound)?;

        let inventory = session.find_inventory_items(employee.id).await?;
        let sent = session.find_outgoing_grouped_by_receiver(employee.id).await?;
        let received = session.find_incoming_grouped_by_sender(employee.id).await?;

        Ok(EmployeeInfo {
            coins: employee.balance,
            inventory,
            coin_history: CoinHistory { received, sent },
        })
    }
}
