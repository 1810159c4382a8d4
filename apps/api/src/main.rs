mod config;
mod errors;
mod packing;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::packing::store::InMemoryPackSizeStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},tower_http={level}",
                env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting order packs API v{}", env!("CARGO_PKG_VERSION"));

    for entry in &config.skipped_pack_sizes {
        warn!("Skipping invalid pack size from PACK_SIZES: '{entry}'");
    }
    info!("Initial pack sizes: {:?}", config.pack_sizes);
    info!("Maximum order quantity: {}", config.max_order_quantity);

    let store = Arc::new(InMemoryPackSizeStore::new(config.pack_sizes.clone()));

    let cors = build_cors_layer(&config)?;

    // Build app state
    let state = AppState {
        config: config.clone(),
        pack_sizes: store,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Restricts CORS to `CORS_ALLOWED_ORIGINS` when set; permissive otherwise.
fn build_cors_layer(config: &Config) -> Result<CorsLayer> {
    let Some(origins) = &config.cors_allowed_origins else {
        return Ok(CorsLayer::permissive());
    };

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    info!("CORS restricted to {} origin(s)", origins.len());

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86_400)))
}
