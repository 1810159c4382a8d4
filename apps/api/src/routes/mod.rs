pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::packing::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/calculate", post(handlers::handle_calculate))
        .route(
            "/api/pack-sizes",
            get(handlers::handle_get_pack_sizes).post(handlers::handle_update_pack_sizes),
        )
        .fallback(not_found)
        .with_state(state)
}
