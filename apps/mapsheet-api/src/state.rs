//! Application state for the map sheet API

use anyhow::Result;
use mapsheet_core::SheetGenerator;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;

pub struct AppState {
    pub db: SqlitePool,
    pub generator: SheetGenerator,
    /// Shared secret for plan changes; `None` disables them
    pub billing_secret: Option<String>,
}

impl AppState {
    pub fn new(db: SqlitePool, generator: SheetGenerator) -> Self {
        Self {
            db,
            generator,
            billing_secret: None,
        }
    }

    pub fn with_billing_secret(mut self, secret: Option<String>) -> Self {
        self.billing_secret = secret.filter(|s| !s.is_empty());
        self
    }
}

/// `sqlite:` URL under the platform data directory
pub fn default_database_url() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapsheet-api");
    std::fs::create_dir_all(&data_dir).ok();
    format!("sqlite:{}/mapsheet.db?mode=rwc", data_dir.display())
}

/// Open the pool and create the schema
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    tracing::info!("Connecting to database: {}", database_url);

    // every in-memory connection is its own database
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            plan TEXT NOT NULL DEFAULT 'demo',
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS usage_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_usage_logs_account_created
            ON usage_logs(account_id, created_at)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Migrations complete");
    Ok(())
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
