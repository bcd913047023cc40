//! Latitude/longitude pairs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SheetError;

/// Host used for QR deep links
pub const MAPS_LINK_BASE: &str = "https://www.google.com/maps";

/// A resolved location. Both values are always inside the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Build a pair, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    pub fn latitude(&self) -> f64 {
        self.lat
    }

    pub fn longitude(&self) -> f64 {
        self.lng
    }

    /// Parse free-text `"lat,lng"`: exactly two comma-separated decimal numbers
    pub fn parse_pair(text: &str) -> Result<Self, SheetError> {
        let invalid = || SheetError::InvalidCoordinateFormat(text.to_string());

        let mut parts = text.split(',');
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let lat = parse_decimal(lat).ok_or_else(invalid)?;
        let lng = parse_decimal(lng).ok_or_else(invalid)?;

        Self::new(lat, lng).ok_or_else(invalid)
    }

    /// Deep link opened by the QR code: `https://www.google.com/maps?q=lat,lng`
    pub fn maps_link(&self) -> String {
        format!("{}?q={}", MAPS_LINK_BASE, self)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Decimal float with optional sign; rejects `inf`, `NaN` and exponents
fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    raw.parse().ok()
}
