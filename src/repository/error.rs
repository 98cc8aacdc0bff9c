//! Store Errors

/// Errors reported by a store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Username already taken
    #[error("employee already exists")]
    EmployeeExists,

    /// The unit of work ran past its deadline and was rolled back
    #[error("operation timed out")]
    Timeout,

    /// Backend unreachable or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Map a unique-constraint violation on insert to `EmployeeExists`
    pub(crate) fn from_employee_insert(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::EmployeeExists
            }
            other => StoreError::Database(other),
        }
    }
}
