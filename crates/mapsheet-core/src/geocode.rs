//! Address geocoding

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::coords::Coordinates;
use crate::error::{provider_detail, SheetError};

const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Converts free-text addresses into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Location of the first result. Every failure is `GeocodingFailed`.
    async fn geocode(&self, address: &str) -> Result<Coordinates, SheetError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Google Geocoding API client
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    language: String,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(GEOCODE_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
            endpoint: GEOCODE_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (staging proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, SheetError> {
        debug!("Geocoding address: {}", address);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("address", address),
                ("key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                let detail = provider_detail(e);
                warn!("Geocoding request failed: {}", detail);
                SheetError::GeocodingFailed(detail)
            })?;

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            SheetError::GeocodingFailed(format!("unreadable response: {}", provider_detail(e)))
        })?;

        location_from_response(body)
    }
}

fn location_from_response(body: GeocodeResponse) -> Result<Coordinates, SheetError> {
    if body.status != "OK" {
        let detail = match body.error_message {
            Some(message) if !message.is_empty() => message,
            _ => format!("status {}", body.status),
        };
        return Err(SheetError::GeocodingFailed(detail));
    }

    let location = body
        .results
        .into_iter()
        .next()
        .and_then(|r| r.geometry)
        .and_then(|g| g.location)
        .ok_or_else(|| SheetError::GeocodingFailed("no results".to_string()))?;

    Coordinates::new(location.lat, location.lng).ok_or_else(|| {
        SheetError::GeocodingFailed(format!(
            "location out of range: {},{}",
            location.lat, location.lng
        ))
    })
}
