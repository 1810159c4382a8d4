//! Axum route handlers for the pack calculation API.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::packing::optimizer::optimize;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub order_amount: i64,
    /// Overrides the stored pack sizes for this request only.
    #[serde(default)]
    pub pack_sizes: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub packs: BTreeMap<u64, u64>,
    pub total_items: u64,
    pub total_packs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackSizesRequest {
    pub pack_sizes: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackSizesResponse {
    pub pack_sizes: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackSizesResponse {
    pub message: String,
    pub pack_sizes: Vec<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/calculate
///
/// Runs the optimizer against the stored pack sizes, or against `packSizes`
/// from the request body when present. Either source must respect the order
/// ceiling, since the search table spans order + largest pack.
pub async fn handle_calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, AppError> {
    info!("Received request to calculate packs for {}", request.order_amount);

    let max = state.config.max_order_quantity;
    if request.order_amount > max {
        return Err(AppError::Validation(format!(
            "orderAmount must not exceed {max}"
        )));
    }

    let pack_sizes = match request.pack_sizes {
        Some(sizes) => sizes,
        None => state.pack_sizes.pack_sizes().await?,
    };
    check_pack_size_ceiling(&pack_sizes, max)?;

    // CPU-bound search — spawn_blocking to avoid blocking the async executor.
    let order_amount = request.order_amount;
    let plan = tokio::task::spawn_blocking(move || optimize(&pack_sizes, order_amount))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in pack calculation: {e}"))
        })??;

    info!(
        "Calculated {} pack(s) shipping {} items (overshoot {})",
        plan.total_packs(),
        plan.shipped_total,
        plan.overshoot(order_amount.unsigned_abs())
    );
    Ok(Json(CalculateResponse {
        total_packs: plan.total_packs(),
        total_items: plan.shipped_total,
        packs: plan.packs,
    }))
}

/// GET /api/pack-sizes
pub async fn handle_get_pack_sizes(
    State(state): State<AppState>,
) -> Result<Json<PackSizesResponse>, AppError> {
    let pack_sizes = state.pack_sizes.pack_sizes().await?;
    Ok(Json(PackSizesResponse { pack_sizes }))
}

/// POST /api/pack-sizes
///
/// Replaces the stored pack sizes. The list must be non-empty and every size
/// positive; it is stored sorted and de-duplicated.
pub async fn handle_update_pack_sizes(
    State(state): State<AppState>,
    Json(request): Json<UpdatePackSizesRequest>,
) -> Result<Json<UpdatePackSizesResponse>, AppError> {
    let mut sizes = request.pack_sizes;
    if sizes.is_empty() {
        return Err(AppError::Validation(
            "packSizes cannot be empty".to_string(),
        ));
    }
    if let Some(bad) = sizes.iter().find(|&&s| s <= 0) {
        return Err(AppError::Validation(format!(
            "pack sizes must be positive, got {bad}"
        )));
    }
    check_pack_size_ceiling(&sizes, state.config.max_order_quantity)?;

    sizes.sort_unstable();
    sizes.dedup();
    state.pack_sizes.replace_pack_sizes(sizes.clone()).await?;

    info!("Pack sizes updated to {:?}", sizes);
    Ok(Json(UpdatePackSizesResponse {
        message: "Pack sizes updated successfully".to_string(),
        pack_sizes: sizes,
    }))
}

/// Pack sizes feed the DP table bound, so they share the order ceiling.
fn check_pack_size_ceiling(sizes: &[i64], max: i64) -> Result<(), AppError> {
    match sizes.iter().find(|&&s| s > max) {
        Some(too_big) => Err(AppError::Validation(format!(
            "pack size {too_big} exceeds the maximum of {max}"
        ))),
        None => Ok(()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::{Config, DEFAULT_PACK_SIZES};
    use crate::packing::store::{InMemoryPackSizeStore, PackSizeStore};
    use crate::routes::build_router;
    use crate::state::AppState;

    fn make_config() -> Config {
        Config {
            port: 3000,
            pack_sizes: DEFAULT_PACK_SIZES.to_vec(),
            skipped_pack_sizes: vec![],
            max_order_quantity: 1_000_000,
            cors_allowed_origins: None,
            rust_log: "info".to_string(),
        }
    }

    fn make_app(store: Arc<InMemoryPackSizeStore>) -> Router {
        build_router(AppState {
            config: make_config(),
            pack_sizes: store,
        })
    }

    fn default_store() -> Arc<InMemoryPackSizeStore> {
        Arc::new(InMemoryPackSizeStore::new(DEFAULT_PACK_SIZES.to_vec()))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    // ── /api/calculate ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_calculate_uses_stored_pack_sizes() {
        let (status, body) = send(
            make_app(default_store()),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 263 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["packs"], json!({ "500": 1 }));
        assert_eq!(body["totalItems"], 500);
        assert_eq!(body["totalPacks"], 1);
    }

    #[tokio::test]
    async fn test_calculate_with_request_pack_sizes() {
        let (status, body) = send(
            make_app(default_store()),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 500000, "packSizes": [23, 31, 53] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["packs"], json!({ "23": 2, "31": 7, "53": 9429 }));
        assert_eq!(body["totalItems"], 500000);
    }

    #[tokio::test]
    async fn test_calculate_negative_order_is_bad_request() {
        let (status, body) = send(
            make_app(default_store()),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ORDER_AMOUNT");
        assert_eq!(body["error"]["message"], "order amount cannot be negative");
    }

    #[tokio::test]
    async fn test_calculate_without_usable_sizes_is_unprocessable() {
        let (status, body) = send(
            make_app(default_store()),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 10, "packSizes": [0, -5] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "NO_PACK_SIZES");
    }

    #[tokio::test]
    async fn test_calculate_with_empty_store_is_unprocessable() {
        let store = Arc::new(InMemoryPackSizeStore::default());
        let (status, body) = send(
            make_app(store),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "NO_PACK_SIZES");
    }

    #[tokio::test]
    async fn test_calculate_rejects_orders_above_ceiling() {
        let (status, body) = send(
            make_app(default_store()),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 1_000_001 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_calculate_rejects_oversized_request_pack() {
        let (status, _) = send(
            make_app(default_store()),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 10, "packSizes": [2_000_000] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_calculate_rejects_oversized_stored_pack() {
        let store = Arc::new(InMemoryPackSizeStore::new(vec![250, 5_000_000]));
        let (status, body) = send(
            make_app(store),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "pack size 5000000 exceeds the maximum of 1000000"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_calculations_run_off_the_executor() {
        let store = Arc::new(InMemoryPackSizeStore::new(
            (0..30).map(|i| 997 + 31 * i).collect(),
        ));
        let app = make_app(store);
        let requests = (0..3).map(|_| {
            send(
                app.clone(),
                Method::POST,
                "/api/calculate",
                Some(json!({ "orderAmount": 250_000 })),
            )
        });
        let health = send(app.clone(), Method::GET, "/health", None);

        let (results, (health_status, _)) =
            tokio::join!(spawn_all(requests), health);
        assert_eq!(health_status, StatusCode::OK);
        for (status, body) in results {
            assert_eq!(status, StatusCode::OK);
            assert!(body["totalItems"].as_u64().unwrap() >= 250_000);
        }
    }

    async fn spawn_all<F>(futures: impl Iterator<Item = F>) -> Vec<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handles: Vec<_> = futures.map(tokio::spawn).collect();
        let mut outputs = Vec::with_capacity(handles.len());
        for handle in handles {
            outputs.push(handle.await.unwrap());
        }
        outputs
    }

    #[tokio::test]
    async fn test_calculate_malformed_body_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/calculate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("invalid json"))
            .unwrap();
        let response = make_app(default_store()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ── /api/pack-sizes ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_pack_sizes() {
        let store = Arc::new(InMemoryPackSizeStore::new(vec![10, 20, 50]));
        let (status, body) = send(make_app(store), Method::GET, "/api/pack-sizes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["packSizes"], json!([10, 20, 50]));
    }

    #[tokio::test]
    async fn test_update_pack_sizes_normalizes_and_persists() {
        let store = default_store();
        let (status, body) = send(
            make_app(store.clone()),
            Method::POST,
            "/api/pack-sizes",
            Some(json!({ "packSizes": [53, 23, 31, 23] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Pack sizes updated successfully");
        assert_eq!(body["packSizes"], json!([23, 31, 53]));
        assert_eq!(store.pack_sizes().await.unwrap(), vec![23, 31, 53]);

        let (_, body) = send(
            make_app(store),
            Method::POST,
            "/api/calculate",
            Some(json!({ "orderAmount": 500000 })),
        )
        .await;
        assert_eq!(body["packs"], json!({ "23": 2, "31": 7, "53": 9429 }));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_non_positive_sizes() {
        let store = default_store();
        for payload in [json!({ "packSizes": [] }), json!({ "packSizes": [250, 0] })] {
            let (status, body) =
                send(make_app(store.clone()), Method::POST, "/api/pack-sizes", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
        assert_eq!(
            store.pack_sizes().await.unwrap(),
            DEFAULT_PACK_SIZES.to_vec(),
            "rejected updates must leave the store untouched"
        );
    }

    // ── misc routes ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_health_reports_pack_configuration() {
        let (status, body) = send(make_app(default_store()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["packSizeCount"], 5);
        assert_eq!(body["maxOrderQuantity"], 1_000_000);
    }

    #[tokio::test]
    async fn test_health_flags_empty_store() {
        let store = Arc::new(InMemoryPackSizeStore::default());
        let (status, body) = send(make_app(store), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_pack_sizes");
        assert_eq!(body["packSizeCount"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, body) = send(make_app(default_store()), Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
