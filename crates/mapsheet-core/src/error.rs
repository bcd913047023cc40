use thiserror::Error;

/// Everything that can reject a sheet generation request.
///
/// None of these are fatal to the serving process; each one ends a single
/// request with a message the user can act on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinateFormat(String),

    #[error("Could not read coordinates from the map URL")]
    UrlResolutionFailed,

    #[error("Could not find a location for the address: {0}")]
    GeocodingFailed(String),

    #[error("Enter an address or coordinates")]
    NoLocationProvided,

    #[error("Failed to fetch map image (zoom {zoom}): {detail}")]
    ImageFetchFailed { zoom: u8, detail: String },

    #[error("Monthly limit of {limit} sheets reached")]
    QuotaExceeded { limit: u32 },

    #[error("Usage store error: {0}")]
    Storage(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl SheetError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            SheetError::InvalidCoordinateFormat(_) => "INVALID_COORDINATE_FORMAT",
            SheetError::UrlResolutionFailed => "URL_RESOLUTION_FAILED",
            SheetError::GeocodingFailed(_) => "GEOCODING_FAILED",
            SheetError::NoLocationProvided => "NO_LOCATION_PROVIDED",
            SheetError::ImageFetchFailed { .. } => "IMAGE_FETCH_FAILED",
            SheetError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            SheetError::Storage(_) => "STORAGE_ERROR",
            SheetError::Render(_) => "RENDER_ERROR",
        }
    }

    /// True when the user's input (not a provider or the server) is at fault
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SheetError::InvalidCoordinateFormat(_)
                | SheetError::UrlResolutionFailed
                | SheetError::GeocodingFailed(_)
                | SheetError::NoLocationProvided
        )
    }
}

/// Provider error text without the request URL, which carries the API key
pub(crate) fn provider_detail(err: reqwest::Error) -> String {
    err.without_url().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_fetch_message_names_zoom() {
        let err = SheetError::ImageFetchFailed {
            zoom: 17,
            detail: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch map image (zoom 17): timeout"
        );
        assert_eq!(err.code(), "IMAGE_FETCH_FAILED");
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_resolver_failures_are_input_errors() {
        assert!(SheetError::NoLocationProvided.is_input_error());
        assert!(SheetError::UrlResolutionFailed.is_input_error());
        assert!(!SheetError::QuotaExceeded { limit: 5 }.is_input_error());
    }
}
