use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::firebase::RealtimeDatabase;
use crate::{config::FirebaseConfig, error::StoreError, models::CoordinateRecord};

/// Hierarchical store that owns key generation for appended children.
#[async_trait]
pub trait CoordinateStore: Send + Sync {
    /// Append `record` as a new child of `path`, returning the key the store generated.
    async fn append_child(
        &self,
        path: &str,
        record: &CoordinateRecord,
    ) -> Result<Option<String>, StoreError>;
}

pub type DynStore = Arc<dyn CoordinateStore>;

static DATABASE: OnceCell<Arc<RealtimeDatabase>> = OnceCell::const_new();

/// Process-wide database client.
///
/// The first call builds the client; concurrent first callers wait on the same
/// initialization and every later call returns the same handle, whatever
/// config it passes.
pub async fn shared_database(config: &FirebaseConfig) -> Result<Arc<RealtimeDatabase>, StoreError> {
    DATABASE
        .get_or_try_init(|| async {
            tracing::info!("Initializing Realtime Database client");
            RealtimeDatabase::new(config).map(Arc::new)
        })
        .await
        .cloned()
}
