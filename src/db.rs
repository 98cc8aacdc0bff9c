//! Database module
//!
//! Connectivity, migrations and startup schema checks.

use sqlx::PgPool;

use crate::repository::StoreError;

/// Tables the shop cannot run without
const REQUIRED_TABLES: &[&str] = &["employees", "items", "employee_inventory", "transfers"];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Check that the required tables exist and the catalog is seeded
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;

    if items == 0 {
        tracing::error!("Item catalog is empty. Please run database migrations.");
        return Ok(false);
    }

    tracing::info!("Schema verified, {} catalog items", items);
    Ok(true)
}
