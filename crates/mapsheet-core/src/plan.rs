//! Subscription plans and their limits

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Zoom levels for the wide-area and detail views
pub const WIDE_ZOOM: u8 = 14;
pub const DETAIL_ZOOM: u8 = 17;

/// Subscription tier, ordered by monthly ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Demo,
    Lite,
    Standard,
}

/// What a plan allows per calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimit {
    pub monthly_limit: u32,
    pub watermark: bool,
    /// Map views per sheet: 2 for wide + detail, 1 for detail only
    pub map_views: u8,
    /// Monthly price in JPY
    pub price_jpy: u32,
}

impl Plan {
    /// Plan applied to accounts whose plan name is missing or unrecognized
    pub const DEFAULT: Plan = Plan::Demo;

    pub const ALL: [Plan; 3] = [Plan::Demo, Plan::Lite, Plan::Standard];

    pub fn limit(self) -> PlanLimit {
        match self {
            Plan::Demo => PlanLimit {
                monthly_limit: 5,
                watermark: true,
                map_views: 2,
                price_jpy: 0,
            },
            Plan::Lite => PlanLimit {
                monthly_limit: 20,
                watermark: false,
                map_views: 2,
                price_jpy: 500,
            },
            Plan::Standard => PlanLimit {
                monthly_limit: 50,
                watermark: false,
                map_views: 2,
                price_jpy: 980,
            },
        }
    }

    /// Total lookup: unknown names fall back to [`Plan::DEFAULT`]
    pub fn from_name(name: &str) -> Plan {
        name.parse().unwrap_or(Plan::DEFAULT)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Demo => "demo",
            Plan::Lite => "lite",
            Plan::Standard => "standard",
        }
    }

    /// Name shown to users
    pub fn display_name(self) -> &'static str {
        match self {
            Plan::Demo => "DEMO",
            Plan::Lite => "ライト",
            Plan::Standard => "スタンダード",
        }
    }

    /// Self-service checkout only moves up the order
    pub fn is_upgrade_to(self, target: Plan) -> bool {
        target > self
    }
}

impl PlanLimit {
    /// Zoom levels to fetch, wide view first
    pub fn zooms(&self) -> &'static [u8] {
        if self.map_views >= 2 {
            &[WIDE_ZOOM, DETAIL_ZOOM]
        } else {
            &[DETAIL_ZOOM]
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan::DEFAULT
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized plan name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown plan: {0}")]
pub struct UnknownPlan(pub String);

impl FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Plan::Demo),
            "lite" => Ok(Plan::Lite),
            "standard" => Ok(Plan::Standard),
            _ => Err(UnknownPlan(s.to_string())),
        }
    }
}
