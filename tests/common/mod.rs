//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use coin_shop::api::{self, AppState};
use coin_shop::auth::{Argon2Hasher, JwtSigner};
use coin_shop::{db, MemoryStore, PgStore, UnitOfWork};

pub const TEST_SIGN_KEY: &[u8] = b"test_key_123";

pub fn test_signer() -> Arc<JwtSigner> {
    Arc::new(JwtSigner::new(TEST_SIGN_KEY, Duration::from_secs(3600)))
}

/// Full application router over a fresh in-memory store with the default
/// catalog
pub fn memory_app() -> (Router, MemoryStore) {
    let store = MemoryStore::with_default_catalog();
    let uow = UnitOfWork::new(store.clone(), Duration::from_secs(5));
    let state = AppState::new(uow, Arc::new(Argon2Hasher::fast()), test_signer());
    (api::build_router(state), store)
}

/// Connect to `DATABASE_URL` and apply migrations.
///
/// Returns `None` when `DATABASE_URL` is not set so database tests can be
/// skipped on machines without PostgreSQL.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Unit of work over PostgreSQL with a generous deadline
pub fn pg_uow(pool: &PgPool) -> UnitOfWork<PgStore> {
    UnitOfWork::new(PgStore::new(pool.clone()), Duration::from_secs(30))
}

/// Username that no other test run will use
pub fn unique_username(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
