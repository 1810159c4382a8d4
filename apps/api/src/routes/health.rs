use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Reports service version, how many pack sizes are configured, and the order ceiling.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let pack_sizes = state.pack_sizes.pack_sizes().await?;
    let status = if pack_sizes.iter().any(|&s| s > 0) {
        "ok"
    } else {
        "no_pack_sizes"
    };

    Ok(Json(json!({
        "status": status,
        "service": "order-packs-api",
        "version": env!("CARGO_PKG_VERSION"),
        "packSizeCount": pack_sizes.len(),
        "maxOrderQuantity": state.config.max_order_quantity
    })))
}
