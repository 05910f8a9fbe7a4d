//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sylera-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migration files live in `crates/api/migrations/` and are embedded into
//! the binary at compile time.

use tracing::info;

use super::CommandError;

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    info!("Connecting to database...");
    let pool = super::connect().await?;

    info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
