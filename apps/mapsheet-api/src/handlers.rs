//! API handlers for the map sheet service
//!
//! - `POST /api/generate`: the PDF sheet, gated by the caller's plan
//! - lookup helpers used by the form preview (coordinates, map links, QR)
//! - usage and plan catalogue
//! - plan updates from the billing side

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Form, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use mapsheet_core::compose::render_qr_png;
use mapsheet_core::filename::content_disposition;
use mapsheet_core::{Coordinates, GenerationRequest, Plan};
use tracing::{debug, info};

use crate::account::{BillingHook, Caller};
use crate::error::ApiError;
use crate::models::{
    CoordinatesQuery, HealthResponse, LatLng, MapsUrlQuery, PlanInfo, QrCodeQuery, QrCodeResponse,
    SetPlanRequest, SetPlanResponse, UsageResponse,
};
use crate::state::AppState;
use crate::store;

pub const REMAINING_HEADER: &str = "x-generations-remaining";

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "mapsheet-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Caller(account): Caller,
    form: Result<Form<GenerationRequest>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(request) = form?;
    info!("Generation requested by {} ({})", account.id, account.plan);

    let sheet = state.generator.generate(&account, &request).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&sheet.filename)),
        (
            HeaderName::from_static(REMAINING_HEADER),
            sheet.remaining.to_string(),
        ),
    ];
    Ok((headers, sheet.pdf).into_response())
}

/// Handler: GET /api/coordinates
pub async fn coordinates(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<Json<LatLng>, ApiError> {
    let Query(query) = query?;
    let at = state
        .generator
        .resolver()
        .resolve(&query.coordinates, &query.address)
        .await?;
    Ok(Json(at.into()))
}

/// Handler: GET /api/parse-maps-url
pub async fn parse_maps_url(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MapsUrlQuery>, QueryRejection>,
) -> Result<Json<LatLng>, ApiError> {
    let Query(query) = query?;
    let url = query.url.trim();
    if url.is_empty() {
        return Err(ApiError::InvalidRequest("Enter a map URL".to_string()));
    }
    let at = state.generator.resolver().resolve_map_link(url).await?;
    Ok(Json(at.into()))
}

/// Handler: GET /api/qrcode
pub async fn qrcode(
    query: Result<Query<QrCodeQuery>, QueryRejection>,
) -> Result<Json<QrCodeResponse>, ApiError> {
    let Query(query) = query?;
    if query.lat == 0.0 && query.lng == 0.0 {
        return Err(ApiError::InvalidRequest("Specify coordinates".to_string()));
    }
    let at = Coordinates::new(query.lat, query.lng).ok_or_else(|| {
        ApiError::InvalidRequest(format!("Coordinates out of range: {},{}", query.lat, query.lng))
    })?;

    let maps_url = at.maps_link();
    let png = render_qr_png(&maps_url)?;
    debug!("QR preview for {} ({} bytes)", maps_url, png.len());

    Ok(Json(QrCodeResponse {
        qrcode: format!("data:image/png;base64,{}", STANDARD.encode(png)),
        maps_url,
    }))
}

/// Handler: GET /api/usage
pub async fn usage(
    State(state): State<Arc<AppState>>,
    Caller(account): Caller,
) -> Result<Json<UsageResponse>, ApiError> {
    let summary = state.generator.gate().summary(&account, Utc::now()).await?;
    Ok(Json(UsageResponse {
        plan: account.plan,
        plan_name: account.plan.display_name(),
        limit: summary.limit,
        used: summary.used,
        remaining: summary.remaining,
        watermark: account.plan.limit().watermark,
    }))
}

/// Handler: GET /api/plans
pub async fn plans() -> Json<Vec<PlanInfo>> {
    Json(Plan::ALL.into_iter().map(PlanInfo::from).collect())
}

/// Handler: PUT /api/accounts/:id/plan
///
/// Called by the billing side; requires the shared billing secret.
pub async fn set_plan(
    State(state): State<Arc<AppState>>,
    _hook: BillingHook,
    Path(account_id): Path<String>,
    body: Result<Json<SetPlanRequest>, JsonRejection>,
) -> Result<Json<SetPlanResponse>, ApiError> {
    let Json(body) = body?;
    let plan: Plan = body
        .plan
        .parse()
        .map_err(|e: mapsheet_core::plan::UnknownPlan| ApiError::InvalidRequest(e.to_string()))?;

    store::set_plan(&state.db, &account_id, plan).await?;
    info!("Account {} is now on plan {}", account_id, plan);

    Ok(Json(SetPlanResponse {
        success: true,
        account_id,
        plan,
    }))
}
