//! Load Testing Tool
//!
//! Provisions a batch of employees, fires concurrent transfers and
//! purchases at them through the shop handlers, then checks that no coins
//! were created or lost.
//!
//! Run with: cargo run --bin load_test --release -- --employees 20 --operations 1000

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use sqlx::postgres::PgPoolOptions;

use coin_shop::auth::{Argon2Hasher, JwtSigner};
use coin_shop::domain::INITIAL_BALANCE;
use coin_shop::handlers::{AuthHandler, PurchaseHandler, TransferHandler};
use coin_shop::repository::DEFAULT_CATALOG;
use coin_shop::{db, PgStore, UnitOfWork};

#[derive(Debug, Clone)]
enum Operation {
    Transfer { from: usize, to: usize, amount: i64 },
    Buy { employee: usize, item: &'static str },
}

fn arg(args: &[String], name: &str, default: usize) -> usize {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn plan(employees: usize, operations: usize) -> Vec<Operation> {
    let mut rng = rand::thread_rng();
    (0..operations)
        .map(|_| {
            if rng.gen_bool(0.7) {
                let from = rng.gen_range(0..employees);
                let mut to = rng.gen_range(0..employees);
                if to == from {
                    to = (to + 1) % employees;
                }
                Operation::Transfer {
                    from,
                    to,
                    amount: rng.gen_range(1..=150),
                }
            } else {
                let (item, _) = DEFAULT_CATALOG[rng.gen_range(0..DEFAULT_CATALOG.len())];
                Operation::Buy {
                    employee: rng.gen_range(0..employees),
                    item,
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let employee_count = arg(&args, "--employees", 20).max(2);
    let operation_count = arg(&args, "--operations", 1000);

    let database_url = std::env::var("DATABASE_URL")?;

    println!(
        "Load Test - {} employees, {} operations",
        employee_count, operation_count
    );
    println!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await?;

    if !db::check_schema(&pool).await? {
        anyhow::bail!("Database schema incomplete, run the server once to migrate");
    }

    let uow = UnitOfWork::new(PgStore::new(pool.clone()), Duration::from_secs(30));
    let signer = Arc::new(JwtSigner::new(b"load-test", Duration::from_secs(60)));
    let auth = AuthHandler::new(uow.clone(), Arc::new(Argon2Hasher::fast()), signer);
    let transfer = TransferHandler::new(uow.clone());
    let purchase = PurchaseHandler::new(uow);

    let prefix = format!("load-{}-", uuid::Uuid::new_v4().simple());
    let usernames: Arc<Vec<String>> = Arc::new(
        (0..employee_count)
            .map(|i| format!("{}{}", prefix, i))
            .collect(),
    );

    for username in usernames.iter() {
        auth.authorize(username, "password").await?;
    }
    println!("Provisioned {} employees", employee_count);

    let start = Instant::now();
    let mut tasks = Vec::with_capacity(operation_count);

    for operation in plan(employee_count, operation_count) {
        let usernames = Arc::clone(&usernames);
        let transfer = transfer.clone();
        let purchase = purchase.clone();

        tasks.push(tokio::spawn(async move {
            match operation {
                Operation::Transfer { from, to, amount } => transfer
                    .send_coins(&usernames[from], &usernames[to], amount)
                    .await
                    .map_err(|e| e.is_client_error()),
                Operation::Buy { employee, item } => purchase
                    .buy(item, &usernames[employee])
                    .await
                    .map_err(|e| e.is_client_error()),
            }
        }));
    }

    let mut succeeded = 0u64;
    let mut rejected = 0u64;
    let mut failed = 0u64;
    for task in tasks {
        match task.await? {
            Ok(()) => succeeded += 1,
            Err(true) => rejected += 1,
            Err(false) => failed += 1,
        }
    }

    let elapsed = start.elapsed();

    let pattern = format!("{}%", prefix);
    let balances: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(balance), 0)::BIGINT FROM employees WHERE username LIKE $1",
    )
    .bind(&pattern)
    .fetch_one(&pool)
    .await?;
    let inventory_value: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(ei.amount * i.price), 0)::BIGINT
        FROM employee_inventory ei
        JOIN items i ON i.id = ei.item_id
        JOIN employees e ON e.id = ei.employee_id
        WHERE e.username LIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(&pool)
    .await?;

    let expected = employee_count as i64 * INITIAL_BALANCE;

    println!("\n=== Load Test Results ===");
    println!("Operations: {}", operation_count);
    println!("Succeeded: {}", succeeded);
    println!("Rejected: {}", rejected);
    println!("Failed: {}", failed);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!(
        "Rate: {:.0} ops/sec",
        operation_count as f64 / elapsed.as_secs_f64()
    );
    println!(
        "Coins: {} in balances + {} in inventory = {} (expected {})",
        balances,
        inventory_value,
        balances + inventory_value,
        expected
    );

    pool.close().await;

    if balances + inventory_value != expected {
        anyhow::bail!("coin conservation violated");
    }
    println!("Conservation check passed");

    Ok(())
}
