//! Request and response bodies

use mapsheet_core::{Coordinates, Plan};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoordinatesQuery {
    pub address: String,
    pub coordinates: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MapsUrlQuery {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QrCodeQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for LatLng {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.latitude(),
            lng: c.longitude(),
        }
    }
}

#[derive(Serialize)]
pub struct QrCodeResponse {
    /// `data:image/png;base64,...`
    pub qrcode: String,
    pub maps_url: String,
}

#[derive(Serialize)]
pub struct UsageResponse {
    pub plan: Plan,
    pub plan_name: &'static str,
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub watermark: bool,
}

#[derive(Serialize)]
pub struct PlanInfo {
    pub name: Plan,
    pub display_name: &'static str,
    pub price_jpy: u32,
    pub monthly_limit: u32,
    pub watermark: bool,
}

impl From<Plan> for PlanInfo {
    fn from(plan: Plan) -> Self {
        let limit = plan.limit();
        Self {
            name: plan,
            display_name: plan.display_name(),
            price_jpy: limit.price_jpy,
            monthly_limit: limit.monthly_limit,
            watermark: limit.watermark,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetPlanRequest {
    pub plan: String,
}

#[derive(Serialize)]
pub struct SetPlanResponse {
    pub success: bool,
    pub account_id: String,
    pub plan: Plan,
}
