//! Transfer Handler
//!
//! Moves coins between two employees and records the transfer.

use crate::domain::{Transfer, TransferError};
use crate::repository::{EmployeeRepository, Staged, Store, TransferRepository, UnitOfWork};

/// Handler for peer-to-peer coin transfers
#[derive(Clone)]
pub struct TransferHandler<S> {
    uow: UnitOfWork<S>,
}

impl<S: Store> TransferHandler<S> {
    pub fn new(uow: UnitOfWork<S>) -> Self {
        Self { uow }
    }

    /// Send `amount` coins from `from` to `to`.
    ///
    /// Checks run in a fixed order and the first failing one decides the
    /// error: same employee, negative amount, unknown sender, insufficient
    /// balance, unknown receiver. A zero amount is accepted and recorded.
    pub async fn send_coins(&self, from: &str, to: &str, amount: i64) -> Result<(), TransferError> {
        if from == to {
            return Err(TransferError::TransferToSameEmployee);
        }
        if amount < 0 {
            return Err(TransferError::NegativeTransferAmount);
        }

        match self.uow.run(self.stage_transfer(from, to, amount)).await {
            Ok(transfer) => {
                tracing::info!(
                    transfer_id = %transfer.id,
                    from = %from,
                    to = %to,
                    amount = amount,
                    "Coins transferred"
                );
                Ok(())
            }
            Err(e) if e.is_client_error() => {
                tracing::info!(from = %from, to = %to, amount = amount, "Transfer rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::error!(from = %from, to = %to, "Transfer failed: {}", e);
                Err(e)
            }
        }
    }

    async fn stage_transfer(
        &self,
        from: &str,
        to: &str,
        amount: i64,
    ) -> Staged<S::Session, Transfer, TransferError> {
        let mut session = self.uow.begin().await?;
        let outcome = Self::apply(&mut session, from, to, amount).await;
        Ok((session, outcome))
    }

    async fn apply(
        session: &mut S::Session,
        from: &str,
        to: &str,
        amount: i64,
    ) -> Result<Transfer, TransferError> {
        session.lock_employees(&[from, to]).await?;

        let mut sender = session
            .find_employee_by_username(from)
            .await?
            .ok_or(TransferError::SenderNotFound)?;

        if !sender.can_afford(amount) {
            return Err(TransferError::NotEnoughCoins);
        }

        let mut receiver = session
            .find_employee_by_username(to)
            .await?
            .ok_or(TransferError::ReceiverNotFound)?;

        sender.balance -= amount;
        receiver.balance += amount;

        session.update_employee_by_username(from, &sender).await?;
        session.update_employee_by_username(to, &receiver).await?;

        let transfer = Transfer::new(sender.id, receiver.id, amount);
        session.save_transfer(&transfer).await?;

        Ok(transfer)
    }
}
