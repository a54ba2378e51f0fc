//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! glamdesk-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GLAMDESK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/server/migrations/`

use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `MigrationError` if no database URL is set, the connection fails,
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("GLAMDESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("GLAMDESK_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
