//! Map Sheet API Server
//!
//! Turns an address, a `lat,lng` pair or a map link into a printable A4 map
//! sheet. Provides REST endpoints for:
//!
//! - Sheet generation (PDF), limited per account by plan
//! - Coordinate lookup, map link parsing and QR previews
//! - Usage and plan information
//!
//! Authentication is handled by the fronting proxy, which forwards the
//! account id in the `X-Account-Id` header. Plan changes from the billing
//! side carry the shared secret in `X-Billing-Secret`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use mapsheet_core::{
    CoordinateResolver, DocumentComposer, FontRenderer, GoogleGeocoder, HttpLinkExpander,
    SheetGenerator, StaticMapClient, UsageGate,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod account;
mod error;
mod handlers;
mod models;
mod state;
mod store;

use state::AppState;
use store::SqliteUsageStore;

/// Command-line arguments for the map sheet server
#[derive(Parser, Debug)]
#[command(name = "mapsheet-api")]
#[command(about = "Map sheet PDF generation server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite URL; defaults to a file under the platform data directory
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Key for the geocoding and static map providers
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    google_maps_api_key: String,

    /// TrueType font (or collection) with Japanese glyphs
    #[arg(long, env = "MAPSHEET_FONT_PATH", default_value = "fonts/msgothic.ttc")]
    font_path: PathBuf,

    /// Language hint for provider responses
    #[arg(long, env = "MAPSHEET_LANGUAGE", default_value_t = mapsheet_core::DEFAULT_LANGUAGE.to_string())]
    language: String,

    /// Shared secret the billing side sends with plan changes; unset disables them
    #[arg(long, env = "BILLING_HOOK_SECRET", hide_env_values = true)]
    billing_hook_secret: Option<String>,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Routes and shared middleware, without the per-IP limiter
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Sheet generation
        .route("/api/generate", post(handlers::generate))
        // Lookup helpers
        .route("/api/coordinates", get(handlers::coordinates))
        .route("/api/parse-maps-url", get(handlers::parse_maps_url))
        .route("/api/qrcode", get(handlers::qrcode))
        // Plans and usage
        .route("/api/usage", get(handlers::usage))
        .route("/api/plans", get(handlers::plans))
        .route("/api/accounts/:id/plan", put(handlers::set_plan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_generator(args: &Args, db: sqlx::SqlitePool) -> anyhow::Result<SheetGenerator> {
    let key = args.google_maps_api_key.as_str();

    let resolver = CoordinateResolver::new(
        Arc::new(GoogleGeocoder::new(key, args.language.as_str())?),
        Arc::new(HttpLinkExpander::new()?),
    );
    let maps = Arc::new(StaticMapClient::new(key, args.language.as_str())?);

    let renderer = FontRenderer::from_file(&args.font_path)?;
    info!("Loaded font {}", args.font_path.display());

    Ok(SheetGenerator::new(
        resolver,
        maps,
        UsageGate::new(Arc::new(SqliteUsageStore::new(db))),
        Arc::new(DocumentComposer::new(Arc::new(renderer))),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting map sheet server on {}:{}", args.host, args.port);

    let database_url = args
        .database_url
        .clone()
        .unwrap_or_else(state::default_database_url);
    let db = state::connect(&database_url).await?;

    let generator = build_generator(&args, db.clone())?;
    if args.billing_hook_secret.is_none() {
        warn!("BILLING_HOOK_SECRET is not set; plan changes are disabled");
    }
    let state = Arc::new(
        AppState::new(db, generator).with_billing_secret(args.billing_hook_secret.clone()),
    );

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let app = router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
