//! Entry point for the tangent retrieval engine's HTTP server.
//!
//! Loads configuration, constructs every vendor client and pipeline
//! component once, and publishes the axum router with the ambient
//! concerns SPEC_FULL.md §A.5 specifies: tracing, compression, permissive
//! CORS, per-IP rate limiting, and a `/metrics` counter.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use axum::middleware::from_fn;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use tangent_server::config::Config;
use tangent_server::metrics::track_http_requests;
use tangent_server::middleware::rate_limit::RateLimitLayer;
use tangent_server::state::AppState;
use tangent_server::{build_router, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    info!("initializing tangent retrieval engine");

    let config = Config::from_env()?;
    let host = config.host.clone();
    let port = config.port;
    let rate_limit_per_minute = config.rate_limit_requests_per_minute;

    let state = AppState::new(config);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let rate_limit = NonZeroU32::new(rate_limit_per_minute).expect("rate limit requests must be greater than zero");
    let rate_period = Duration::from_secs(60);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RateLimitLayer::new(rate_limit, rate_period))
        .layer(from_fn(track_http_requests));

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "tangent server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
