//! Usage/Plan Gate
//!
//! Counts an account's generations since the start of the current UTC
//! calendar month and compares the count with its plan ceiling. The check is
//! best effort: concurrent requests may both pass a read-then-append race.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SheetError;
use crate::plan::Plan;

/// Authenticated caller as supplied by the session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub plan: Plan,
}

impl Account {
    pub fn new(id: impl Into<String>, plan: Plan) -> Self {
        Self {
            id: id.into(),
            plan,
        }
    }
}

/// Append-only log of successful generations
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn count_since(&self, account_id: &str, since: DateTime<Utc>) -> Result<u32, SheetError>;
    async fn append(&self, account_id: &str, at: DateTime<Utc>) -> Result<(), SheetError>;
}

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Authorization {
    Allowed { remaining: u32 },
    Denied { limit: u32 },
}

/// Snapshot of an account's monthly usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
}

/// First instant of the UTC calendar month containing `now`
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(Clone)]
pub struct UsageGate {
    store: Arc<dyn UsageStore>,
}

impl UsageGate {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, account: &Account, now: DateTime<Utc>) -> Result<UsageSummary, SheetError> {
        let limit = account.plan.limit().monthly_limit;
        let used = self.store.count_since(&account.id, month_start(now)).await?;
        Ok(UsageSummary {
            limit,
            used,
            remaining: limit.saturating_sub(used),
        })
    }

    pub async fn authorize(&self, account: &Account, now: DateTime<Utc>) -> Result<Authorization, SheetError> {
        let summary = self.summary(account, now).await?;
        debug!(
            "Usage for {}: {}/{} ({})",
            account.id, summary.used, summary.limit, account.plan
        );

        if summary.remaining == 0 {
            info!("Account {} reached its monthly limit of {}", account.id, summary.limit);
            Ok(Authorization::Denied {
                limit: summary.limit,
            })
        } else {
            Ok(Authorization::Allowed {
                remaining: summary.remaining,
            })
        }
    }

    /// Append one usage record. Call only after a document was composed.
    pub async fn record(&self, account: &Account, at: DateTime<Utc>) -> Result<(), SheetError> {
        self.store.append(&account.id, at).await
    }
}

/// Process-local usage store
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    records: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn count_since(&self, account_id: &str, since: DateTime<Utc>) -> Result<u32, SheetError> {
        let records = self
            .records
            .lock()
            .map_err(|e| SheetError::Storage(e.to_string()))?;
        Ok(records
            .iter()
            .filter(|(id, at)| id == account_id && *at >= since)
            .count() as u32)
    }

    async fn append(&self, account_id: &str, at: DateTime<Utc>) -> Result<(), SheetError> {
        self.records
            .lock()
            .map_err(|e| SheetError::Storage(e.to_string()))?
            .push((account_id.to_string(), at));
        Ok(())
    }
}
