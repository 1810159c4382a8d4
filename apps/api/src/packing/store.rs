//! Pack size store — pluggable source of the currently configured pack sizes.
//!
//! `AppState` holds an `Arc<dyn PackSizeStore>`. The default backend is
//! `InMemoryPackSizeStore`, seeded from `PACK_SIZES` at startup; a persistent
//! backend only has to implement the two trait methods.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::AppError;

/// Read and replace the configured pack sizes.
///
/// The optimizer never talks to a store; handlers read a snapshot and pass it in.
#[async_trait]
pub trait PackSizeStore: Send + Sync {
    async fn pack_sizes(&self) -> Result<Vec<i64>, AppError>;

    async fn replace_pack_sizes(&self, sizes: Vec<i64>) -> Result<(), AppError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryPackSizeStore {
    sizes: RwLock<Vec<i64>>,
}

impl InMemoryPackSizeStore {
    pub fn new(initial: Vec<i64>) -> Self {
        Self {
            sizes: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl PackSizeStore for InMemoryPackSizeStore {
    async fn pack_sizes(&self) -> Result<Vec<i64>, AppError> {
        Ok(self.sizes.read().await.clone())
    }

    async fn replace_pack_sizes(&self, sizes: Vec<i64>) -> Result<(), AppError> {
        let mut guard = self.sizes.write().await;
        debug!("Replacing pack sizes {:?} with {:?}", *guard, sizes);
        *guard = sizes;
        Ok(())
    }
}
