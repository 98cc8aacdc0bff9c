//! Unit of Work
//!
//! Bounds the reads and writes of an operation by a deadline, then commits
//! the session when the operation succeeded and rolls it back otherwise.
//! Commit and rollback run outside the deadline, so an expired deadline only
//! ever discards uncommitted work.

use std::future::Future;
use std::time::Duration;

use super::{Session, Store, StoreError};

/// An open session together with the outcome of the work done on it
pub type Staged<Sess, T, E> = Result<(Sess, Result<T, E>), StoreError>;

/// Atomic-operation coordinator shared by all handlers
#[derive(Debug, Clone)]
pub struct UnitOfWork<S> {
    store: S,
    deadline: Duration,
}

impl<S: Store> UnitOfWork<S> {
    pub fn new(store: S, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Open a read-write session
    pub async fn begin(&self) -> Result<S::Session, StoreError> {
        self.store.begin().await
    }

    /// Open a read-only snapshot session
    pub async fn begin_snapshot(&self) -> Result<S::Session, StoreError> {
        self.store.begin_snapshot().await
    }

    /// Run `work` under the deadline and settle the session it returns.
    ///
    /// `work` opens a session and performs the operation on it. If the
    /// deadline expires first, `work` is dropped together with its
    /// uncommitted session.
    pub async fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: Future<Output = Staged<S::Session, T, E>>,
        E: From<StoreError>,
    {
        let (session, outcome) = match tokio::time::timeout(self.deadline, work).await {
            Ok(staged) => staged?,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = %self.deadline.as_millis(),
                    "Unit of work exceeded its deadline, discarded uncommitted changes"
                );
                return Err(StoreError::Timeout.into());
            }
        };

        self.finish(session, outcome).await
    }

    /// Commit on `Ok`, roll back on `Err`.
    ///
    /// A business error is returned unchanged even when the rollback itself
    /// fails; the rollback failure is only logged.
    async fn finish<T, E>(&self, session: S::Session, outcome: Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        match outcome {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Employee, TransferError};
    use crate::repository::{EmployeeRepository, FailPoint, MemorySession, MemoryStore};

    fn uow(store: &MemoryStore) -> UnitOfWork<MemoryStore> {
        UnitOfWork::new(store.clone(), Duration::from_secs(1))
    }

    async fn stage_alice(
        uow: &UnitOfWork<MemoryStore>,
        outcome: Result<(), TransferError>,
    ) -> Staged<MemorySession, (), TransferError> {
        let mut session = uow.begin().await?;
        session.save_employee(&Employee::new("alice", "h")).await?;
        Ok((session, outcome))
    }

    #[tokio::test]
    async fn test_run_commits_on_success() {
        let store = MemoryStore::new();
        let uow = uow(&store);

        uow.run(stage_alice(&uow, Ok(()))).await.unwrap();

        assert!(store.employee("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_run_rolls_back_and_keeps_business_error() {
        let store = MemoryStore::new();
        let uow = uow(&store);

        let result = uow
            .run(stage_alice(&uow, Err(TransferError::NotEnoughCoins)))
            .await;

        assert!(matches!(result, Err(TransferError::NotEnoughCoins)));
        assert!(store.employee("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_is_store_error() {
        let store = MemoryStore::new();
        store.fail_on(FailPoint::Commit);
        let uow = uow(&store);

        let result = uow.run(stage_alice(&uow, Ok(()))).await;

        assert!(matches!(result, Err(TransferError::Store(_))));
        assert!(store.employee("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_deadline_discards_uncommitted_work() {
        let store = MemoryStore::new();
        let uow = UnitOfWork::new(store.clone(), Duration::from_millis(10));

        let result: Result<(), TransferError> = uow
            .run(async {
                let staged = stage_alice(&uow, Ok(())).await;
                tokio::time::sleep(Duration::from_millis(200)).await;
                staged
            })
            .await;

        assert!(matches!(result, Err(TransferError::Store(StoreError::Timeout))));
        assert!(store.employee("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_slow_commit_is_not_cut_by_deadline() {
        let store = MemoryStore::new();
        store.set_commit_delay(Some(Duration::from_millis(100)));
        let uow = UnitOfWork::new(store.clone(), Duration::from_millis(20));

        let result = uow.run(stage_alice(&uow, Ok(()))).await;
        store.set_commit_delay(None);

        assert!(result.is_ok());
        assert!(store.employee("alice").await.is_some());
    }
}
