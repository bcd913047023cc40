//! HTTP provider clients against local stub servers

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, Rgba, RgbaImage};
use mapsheet_core::maplink::extract_coordinates;
use mapsheet_core::{
    Coordinates, Geocoder, GoogleGeocoder, HttpLinkExpander, LinkExpander, MapImageSource,
    SheetError, StaticMapClient,
};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

const API_KEY: &str = "secret-maps-key-0123";

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Address nothing is listening on
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn tokyo() -> Coordinates {
    Coordinates::new(35.681236, 139.767125).unwrap()
}

fn transparent_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(4, 8, Rgba([0, 0, 0, 0]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

async fn record(State(seen): State<Seen>, Query(query): Query<HashMap<String, String>>) {
    seen.lock().unwrap().push(query);
}

fn assert_no_key(err: &SheetError) {
    assert!(!err.to_string().contains(API_KEY), "key leaked: {}", err);
    assert!(!format!("{:?}", err).contains(API_KEY), "key leaked: {:?}", err);
}

// Static map tiles

#[tokio::test]
async fn test_static_map_decodes_and_flattens_tile() {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/staticmap",
            get(|state: State<Seen>, query: Query<HashMap<String, String>>| async move {
                record(state, query).await;
                ([(header::CONTENT_TYPE, "image/png")], transparent_png())
            }),
        )
        .with_state(seen.clone());
    let addr = serve(app).await;

    let client = StaticMapClient::new(API_KEY, "ja")
        .unwrap()
        .with_endpoint(format!("http://{}/staticmap", addr));
    let tile = client.fetch(tokyo(), 17).await.unwrap();

    assert_eq!(tile.dimensions(), (4, 8));
    assert_eq!(tile.get_pixel(0, 0), &Rgb([255, 255, 255]));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["zoom"], "17");
    assert_eq!(seen[0]["center"], "35.681236,139.767125");
    assert_eq!(seen[0]["key"], API_KEY);
    assert_eq!(seen[0]["language"], "ja");
}

#[tokio::test]
async fn test_static_map_server_error_hides_key() {
    let app = Router::new().route(
        "/staticmap",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;

    let client = StaticMapClient::new(API_KEY, "ja")
        .unwrap()
        .with_endpoint(format!("http://{}/staticmap", addr));
    let err = client.fetch(tokyo(), 17).await.unwrap_err();

    assert!(matches!(err, SheetError::ImageFetchFailed { zoom: 17, .. }), "{:?}", err);
    assert!(err.to_string().contains("500"));
    assert_no_key(&err);
}

#[tokio::test]
async fn test_static_map_rejects_non_image_body() {
    let app = Router::new().route(
        "/staticmap",
        get(|| async { ([(header::CONTENT_TYPE, "image/png")], "quota exceeded") }),
    );
    let addr = serve(app).await;

    let client = StaticMapClient::new(API_KEY, "ja")
        .unwrap()
        .with_endpoint(format!("http://{}/staticmap", addr));
    let err = client.fetch(tokyo(), 14).await.unwrap_err();

    assert!(matches!(err, SheetError::ImageFetchFailed { zoom: 14, .. }), "{:?}", err);
    assert_no_key(&err);
}

#[tokio::test]
async fn test_static_map_unreachable_hides_key() {
    let addr = closed_addr().await;
    let client = StaticMapClient::new(API_KEY, "ja")
        .unwrap()
        .with_endpoint(format!("http://{}/staticmap", addr));
    let err = client.fetch(tokyo(), 14).await.unwrap_err();

    assert!(matches!(err, SheetError::ImageFetchFailed { zoom: 14, .. }), "{:?}", err);
    assert_no_key(&err);
}

// Geocoding

fn geocoder(addr: SocketAddr) -> GoogleGeocoder {
    GoogleGeocoder::new(API_KEY, "ja")
        .unwrap()
        .with_endpoint(format!("http://{}/geocode/json", addr))
}

#[tokio::test]
async fn test_geocoder_reads_first_result() {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/geocode/json",
            get(|state: State<Seen>, query: Query<HashMap<String, String>>| async move {
                record(state, query).await;
                axum::Json(serde_json::json!({
                    "status": "OK",
                    "results": [{"geometry": {"location": {"lat": 35.681236, "lng": 139.767125}}}]
                }))
            }),
        )
        .with_state(seen.clone());
    let addr = serve(app).await;

    let at = geocoder(addr).geocode("東京駅").await.unwrap();
    assert_eq!(at, tokyo());
    assert_eq!(seen.lock().unwrap()[0]["address"], "東京駅");
}

#[tokio::test]
async fn test_geocoder_server_error_hides_key() {
    let app = Router::new().route(
        "/geocode/json",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let addr = serve(app).await;

    let err = geocoder(addr).geocode("東京駅").await.unwrap_err();
    assert!(matches!(err, SheetError::GeocodingFailed(_)), "{:?}", err);
    assert_no_key(&err);
}

#[tokio::test]
async fn test_geocoder_malformed_json() {
    let app = Router::new().route("/geocode/json", get(|| async { "{\"status\": " }));
    let addr = serve(app).await;

    let err = geocoder(addr).geocode("東京駅").await.unwrap_err();
    assert!(matches!(err, SheetError::GeocodingFailed(_)), "{:?}", err);
    assert_no_key(&err);
}

#[tokio::test]
async fn test_geocoder_denied_status() {
    let app = Router::new().route(
        "/geocode/json",
        get(|| async {
            axum::Json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            }))
        }),
    );
    let addr = serve(app).await;

    let err = geocoder(addr).geocode("東京駅").await.unwrap_err();
    assert_eq!(
        err,
        SheetError::GeocodingFailed("The provided API key is invalid.".into())
    );
}

#[tokio::test]
async fn test_geocoder_unreachable() {
    let addr = closed_addr().await;
    let err = geocoder(addr).geocode("東京駅").await.unwrap_err();
    assert!(matches!(err, SheetError::GeocodingFailed(_)), "{:?}", err);
    assert_no_key(&err);
}

// Short link expansion

#[tokio::test]
async fn test_expander_follows_redirects_to_final_url() {
    let app = Router::new()
        .route("/s/abc", get(|| async { Redirect::temporary("/hop") }))
        .route(
            "/hop",
            get(|| async { Redirect::permanent("/maps/place/Nagoya/@35.170915,136.881537,17z") }),
        )
        .route("/maps/place/*rest", get(|| async { "map page" }));
    let addr = serve(app).await;

    let expander = HttpLinkExpander::new().unwrap();
    let expanded = expander
        .expand(&format!("http://{}/s/abc", addr))
        .await
        .unwrap();

    assert!(
        expanded.ends_with("/maps/place/Nagoya/@35.170915,136.881537,17z"),
        "{}",
        expanded
    );
    let (_, at) = extract_coordinates(&expanded).unwrap();
    assert_eq!(at, Coordinates::new(35.170915, 136.881537).unwrap());
}

#[tokio::test]
async fn test_expander_keeps_final_url_on_error_status() {
    let app = Router::new()
        .route("/s/gone", get(|| async { Redirect::temporary("/maps/@34.7,135.5,15z") }))
        .route("/maps/*rest", get(|| async { StatusCode::NOT_FOUND.into_response() }));
    let addr = serve(app).await;

    let expanded = HttpLinkExpander::new()
        .unwrap()
        .expand(&format!("http://{}/s/gone", addr))
        .await
        .unwrap();
    assert!(expanded.ends_with("/maps/@34.7,135.5,15z"), "{}", expanded);
}

#[tokio::test]
async fn test_expander_unreachable() {
    let addr = closed_addr().await;
    let err = HttpLinkExpander::new()
        .unwrap()
        .expand(&format!("http://{}/s/abc", addr))
        .await
        .unwrap_err();
    assert_eq!(err, SheetError::UrlResolutionFailed);
}
