//! PostgreSQL Store
//!
//! Every session wraps one `sqlx` transaction at READ COMMITTED. Rows that
//! are read and then written back are locked with `FOR UPDATE`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{CoinTransaction, Employee, InventoryItem, InventoryRow, Item, Transfer};

use super::{
    EmployeeRepository, InventoryRepository, ItemRepository, Session, Store, StoreError,
    TransferRepository,
};

/// Pool-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }

    async fn begin_snapshot(&self) -> Result<PgSession, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(PgSession { tx })
    }
}

/// One open PostgreSQL transaction
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Session for PgSession {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

type EmployeeRecord = (Uuid, String, String, i64);

fn employee_from_record((id, username, password_hash, balance): EmployeeRecord) -> Employee {
    Employee {
        id,
        username,
        password_hash,
        balance,
    }
}

#[async_trait]
impl EmployeeRepository for PgSession {
    async fn save_employee(&mut self, employee: &Employee) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, username, password_hash, balance)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(employee.id)
        .bind(&employee.username)
        .bind(&employee.password_hash)
        .bind(employee.balance)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_employee_insert)?;

        Ok(())
    }

    async fn find_employee_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Employee>, StoreError> {
        let record: Option<EmployeeRecord> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, balance
            FROM employees
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record.map(employee_from_record))
    }

    async fn update_employee_by_username(
        &mut self,
        username: &str,
        employee: &Employee,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE employees
            SET username = $2, password_hash = $3, balance = $4
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(&employee.username)
        .bind(&employee.password_hash)
        .bind(employee.balance)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn lock_employees(&mut self, usernames: &[&str]) -> Result<(), StoreError> {
        let usernames: Vec<String> = usernames.iter().map(|u| u.to_string()).collect();

        let locked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM employees
            WHERE username = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&usernames)
        .fetch_all(&mut *self.tx)
        .await?;

        tracing::trace!("Locked {} employee rows", locked.len());
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for PgSession {
    async fn find_item_by_name(&mut self, name: &str) -> Result<Option<Item>, StoreError> {
        let record: Option<(Uuid, String, i64)> =
            sqlx::query_as("SELECT id, name, price FROM items WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(record.map(|(id, name, price)| Item { id, name, price }))
    }
}

#[async_trait]
impl InventoryRepository for PgSession {
    async fn save_inventory(&mut self, row: &InventoryRow) -> Result<(), StoreError> {
        // A concurrent first purchase that inserted the same pair wins the
        // insert; this one then folds its amount into that row.
        sqlx::query(
            r#"
            INSERT INTO employee_inventory (id, employee_id, item_id, amount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (employee_id, item_id)
            DO UPDATE SET amount = employee_inventory.amount + EXCLUDED.amount
            "#,
        )
        .bind(row.id)
        .bind(row.employee_id)
        .bind(row.item_id)
        .bind(row.amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_inventory(
        &mut self,
        employee_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryRow>, StoreError> {
        let record: Option<(Uuid, Uuid, Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT id, employee_id, item_id, amount
            FROM employee_inventory
            WHERE employee_id = $1 AND item_id = $2
            FOR UPDATE
            "#,
        )
        .bind(employee_id)
        .bind(item_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record.map(|(id, employee_id, item_id, amount)| InventoryRow {
            id,
            employee_id,
            item_id,
            amount,
        }))
    }

    async fn find_inventory_items(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<InventoryItem>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT i.name, SUM(ei.amount)::BIGINT AS quantity
            FROM employee_inventory ei
            JOIN items i ON i.id = ei.item_id
            WHERE ei.employee_id = $1
            GROUP BY i.name
            ORDER BY i.name
            "#,
        )
        .bind(employee_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
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
        sqlx::query(
            r#"
            UPDATE employee_inventory
            SET employee_id = $2, item_id = $3, amount = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(row.employee_id)
        .bind(row.item_id)
        .bind(row.amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TransferRepository for PgSession {
    async fn save_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transfers (id, from_employee, to_employee, amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(transfer.id)
        .bind(transfer.from_employee)
        .bind(transfer.to_employee)
        .bind(transfer.amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_incoming_grouped_by_sender(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<CoinTransaction>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT e.username, SUM(t.amount)::BIGINT AS amount
            FROM transfers t
            JOIN employees e ON e.id = t.from_employee
            WHERE t.to_employee = $1
            GROUP BY e.username
            ORDER BY e.username
            "#,
        )
        .bind(employee_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(into_transactions(rows))
    }

    async fn find_outgoing_grouped_by_receiver(
        &mut self,
        employee_id: Uuid,
    ) -> Result<Vec<CoinTransaction>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT e.username, SUM(t.amount)::BIGINT AS amount
            FROM transfers t
            JOIN employees e ON e.id = t.to_employee
            WHERE t.from_employee = $1
            GROUP BY e.username
            ORDER BY e.username
            "#,
        )
        .bind(employee_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(into_transactions(rows))
    }
}

fn into_transactions(rows: Vec<(String, i64)>) -> Vec<CoinTransaction> {
    rows.into_iter()
        .map(|(user, amount)| CoinTransaction { user, amount })
        .collect()
}
