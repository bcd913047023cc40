//! Coordinate Resolver
//!
//! Priority order for a request:
//!
//! 1. coordinate text that is a URL: expand short links, run the
//!    [`maplink`](crate::maplink) pattern cascade, then geocode a place-name
//!    `q` parameter as a last resort
//! 2. coordinate text that is not a URL: strict `lat,lng`
//! 3. the address, through the [`Geocoder`]
//! 4. nothing usable: [`SheetError::NoLocationProvided`]

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::coords::Coordinates;
use crate::error::SheetError;
use crate::geocode::Geocoder;
use crate::maplink::{address_query, extract_coordinates, looks_like_url};
use crate::shortlink::{is_short_link, LinkExpander};

/// Resolves user input to a single coordinate pair
#[derive(Clone)]
pub struct CoordinateResolver {
    geocoder: Arc<dyn Geocoder>,
    expander: Arc<dyn LinkExpander>,
}

impl CoordinateResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, expander: Arc<dyn LinkExpander>) -> Self {
        Self { geocoder, expander }
    }

    /// Resolve coordinate text (raw pair or map link) or, failing that, an address.
    /// Coordinate text takes precedence when both are given.
    pub async fn resolve(
        &self,
        coordinate_text: &str,
        address_text: &str,
    ) -> Result<Coordinates, SheetError> {
        let coordinate_text = coordinate_text.trim();
        if !coordinate_text.is_empty() {
            if looks_like_url(coordinate_text) {
                return self.resolve_map_link(coordinate_text).await;
            }
            return Coordinates::parse_pair(coordinate_text);
        }

        let address = address_text.trim();
        if !address.is_empty() {
            let coordinates = self.geocoder.geocode(address).await?;
            info!("Geocoded address to {}", coordinates);
            return Ok(coordinates);
        }

        Err(SheetError::NoLocationProvided)
    }

    /// Resolve a map link. Every failure is `UrlResolutionFailed`.
    pub async fn resolve_map_link(&self, url: &str) -> Result<Coordinates, SheetError> {
        let url = url.trim();

        let expanded = if is_short_link(url) {
            self.expander.expand(url).await?
        } else {
            url.to_string()
        };

        if let Some((pattern, coordinates)) = extract_coordinates(&expanded) {
            debug!("Map link matched {:?}: {}", pattern, coordinates);
            return Ok(coordinates);
        }

        if let Some(place) = address_query(&expanded) {
            debug!("Map link carries a place name, geocoding: {}", place);
            return match self.geocoder.geocode(&place).await {
                Ok(coordinates) => Ok(coordinates),
                Err(e) => {
                    warn!("Geocoding map link query failed: {}", e);
                    Err(SheetError::UrlResolutionFailed)
                }
            };
        }

        warn!("No coordinates found in map link: {}", expanded);
        Err(SheetError::UrlResolutionFailed)
    }
}
