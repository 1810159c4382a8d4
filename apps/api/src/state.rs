use std::sync::Arc;

use crate::config::Config;
use crate::packing::store::PackSizeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable pack size source. Default: InMemoryPackSizeStore seeded from PACK_SIZES.
    pub pack_sizes: Arc<dyn PackSizeStore>,
}
