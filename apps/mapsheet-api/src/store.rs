//! SQLite persistence for accounts and usage records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mapsheet_core::{Plan, SheetError, UsageStore};
use sqlx::SqlitePool;

/// Usage log backed by the `usage_logs` table
pub struct SqliteUsageStore {
    pool: SqlitePool,
}

impl SqliteUsageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn storage_error(e: sqlx::Error) -> SheetError {
    tracing::error!("Usage store error: {}", e);
    SheetError::Storage(e.to_string())
}

#[async_trait]
impl UsageStore for SqliteUsageStore {
    async fn count_since(&self, account_id: &str, since: DateTime<Utc>) -> Result<u32, SheetError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM usage_logs WHERE account_id = ? AND created_at >= ?",
        )
        .bind(account_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn append(&self, account_id: &str, at: DateTime<Utc>) -> Result<(), SheetError> {
        sqlx::query("INSERT INTO usage_logs (account_id, created_at) VALUES (?, ?)")
            .bind(account_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

/// Current plan of an account; accounts without a row are on the default plan
pub async fn plan_for(pool: &SqlitePool, account_id: &str) -> Result<Plan, sqlx::Error> {
    let name: Option<String> = sqlx::query_scalar("SELECT plan FROM accounts WHERE id = ?")
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

    Ok(name.map(|n| Plan::from_name(&n)).unwrap_or_default())
}

pub async fn set_plan(pool: &SqlitePool, account_id: &str, plan: Plan) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, plan, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET plan = excluded.plan, updated_at = excluded.updated_at
        "#,
    )
    .bind(account_id)
    .bind(plan.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}
