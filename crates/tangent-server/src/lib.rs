//! Axum HTTP surface and `AnalyzeController` orchestration for the
//! tangent retrieval engine (spec §6, expanded in SPEC_FULL.md §A).

pub mod config;
pub mod controller;
pub mod dto;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;

/// Initializes the global `tracing` subscriber once, the way
/// `beagle-server::init_tracing` does: an `EnvFilter` read from
/// `RUST_LOG`, falling back to a crate-scoped default.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tangent_server=info,tangent_router=info,tower_http=info"));

    let fmt_layer = fmt::layer().with_target(true).with_line_number(true).with_level(true);

    let registry = Registry::default().with(env_filter).with(fmt_layer);

    let _ = tracing::subscriber::set_global_default(registry);
}
