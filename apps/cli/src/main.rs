//! # USMS Terminal Shell
//!
//! The `usms` binary: a menu-driven terminal front end over the usms-db
//! repositories.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main()                                                                 │
//! │    ├── tracing-subscriber (RUST_LOG / EnvFilter)                        │
//! │    ├── AppArgs::parse()  (flags + USMS_DATABASE / USMS_RECEIPT_DIR)     │
//! │    ├── Database::new()   (pool + embedded migrations)                   │
//! │    ├── expire_stale()    (yesterday's pending quotations)               │
//! │    ├── bootstrap admin   (first run only)                               │
//! │    └── guest menu loop until exit                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod receipt;
mod screens;
mod session;
mod ui;

use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usms_core::Role;
use usms_db::{Database, DbConfig};

use crate::config::AppArgs;
use crate::ui::Console;

/// Seeded on an empty database so the first operator can log in and
/// create real accounts. The shell nags until the password is changed.
const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let args = AppArgs::parse();
    info!(
        database = %args.database.display(),
        receipt_dir = %args.receipt_dir.display(),
        "Starting USMS"
    );

    std::fs::create_dir_all(&args.receipt_dir)?;

    let db = Database::new(DbConfig::new(&args.database)).await?;

    let expired = db.quotations().expire_stale(Utc::now()).await?;
    if expired > 0 {
        info!(expired, "Expired stale quotations at startup");
    }

    let mut con = Console::stdio();

    if db.users().list().await?.is_empty() {
        db.users()
            .register(BOOTSTRAP_ADMIN_USERNAME, BOOTSTRAP_ADMIN_PASSWORD, Role::Admin)
            .await?;
        con.warn(format!(
            "First run: created admin account '{BOOTSTRAP_ADMIN_USERNAME}' with password \
             '{BOOTSTRAP_ADMIN_PASSWORD}'. Change it immediately."
        ))?;
    }

    screens::guest::run(&db, &mut con, &args.receipt_dir).await?;

    db.close().await;
    info!("USMS shut down");
    Ok(())
}
