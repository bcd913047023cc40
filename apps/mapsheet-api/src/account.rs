//! Caller identity
//!
//! The fronting session proxy authenticates the user and forwards the
//! account id in a trusted header. The plan comes from the `accounts` table.
//!
//! Plan changes come from the billing side and carry a shared secret instead.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use mapsheet_core::Account;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store;

pub const ACCOUNT_HEADER: &str = "x-account-id";
pub const BILLING_SECRET_HEADER: &str = "x-billing-secret";

/// Authenticated account of the current request
pub struct Caller(pub Account);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACCOUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let plan = store::plan_for(&state.db, id).await?;
        Ok(Caller(Account::new(id, plan)))
    }
}

/// Request signed with the billing shared secret
pub struct BillingHook;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for BillingHook {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.billing_secret.as_deref() else {
            warn!("Plan change rejected: no billing secret configured");
            return Err(ApiError::Unauthorized);
        };

        let presented = parts
            .headers
            .get(BILLING_SECRET_HEADER)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if secrets_match(presented, expected.as_bytes()) {
            Ok(BillingHook)
        } else {
            warn!("Plan change rejected: bad billing secret");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Compare without short-circuiting on the first differing byte
fn secrets_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
