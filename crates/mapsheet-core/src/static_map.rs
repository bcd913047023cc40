//! Map Image Fetcher
//!
//! Retrieves rendered map tiles centred on a location with a marker on it.
//! Tiles come back as RGB: the PDF page has no transparency, so any alpha
//! channel is composited onto white first.

use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, warn};

use crate::coords::Coordinates;
use crate::error::{provider_detail, SheetError};

const STATIC_MAP_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Requested tile size in logical pixels (portrait)
pub const TILE_SIZE: (u32, u32) = (400, 800);
/// Device scale factor; the returned image is twice [`TILE_SIZE`]
pub const TILE_SCALE: u32 = 2;

/// Source of rendered map tiles
#[async_trait]
pub trait MapImageSource: Send + Sync {
    /// Tile centred on `at`. Every failure is `ImageFetchFailed { zoom }`.
    async fn fetch(&self, at: Coordinates, zoom: u8) -> Result<RgbImage, SheetError>;
}

/// Google Static Maps client
pub struct StaticMapClient {
    client: reqwest::Client,
    api_key: String,
    language: String,
    endpoint: String,
}

impl StaticMapClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
            endpoint: STATIC_MAP_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (staging proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn query(&self, at: Coordinates, zoom: u8) -> Vec<(&'static str, String)> {
        vec![
            ("center", at.to_string()),
            ("zoom", zoom.to_string()),
            ("size", format!("{}x{}", TILE_SIZE.0, TILE_SIZE.1)),
            ("scale", TILE_SCALE.to_string()),
            ("format", "png32".to_string()),
            ("maptype", "roadmap".to_string()),
            ("markers", format!("color:red|{}", at)),
            ("key", self.api_key.clone()),
            ("language", self.language.clone()),
        ]
    }
}

#[async_trait]
impl MapImageSource for StaticMapClient {
    async fn fetch(&self, at: Coordinates, zoom: u8) -> Result<RgbImage, SheetError> {
        let failed = |detail: String| {
            warn!("Map image fetch failed at zoom {}: {}", zoom, detail);
            SheetError::ImageFetchFailed { zoom, detail }
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(at, zoom))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(provider_detail(e)))?;

        let bytes = response.bytes().await.map_err(|e| failed(provider_detail(e)))?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| failed(e.to_string()))?;

        debug!(
            "Fetched map tile at zoom {}: {}x{}",
            zoom,
            decoded.width(),
            decoded.height()
        );
        Ok(flatten_onto_white(decoded))
    }
}

/// Alpha-blend onto opaque white, then drop the alpha channel
pub fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let blend = |c: u8| -> u8 {
            let a = a as u32;
            ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8
        };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
