use crate::clients::BlobStore;
use crate::config::BLOB_CONN_STR_VAR;
use crate::data::Dataset;
use crate::{AppError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Memoized snapshot of the dashboard table. Loaded on first use and kept
/// until `invalidate` is called. Failed loads are not cached.
pub struct DataCache {
    store: Option<Arc<dyn BlobStore>>,
    container: String,
    blob: String,
    snapshot: RwLock<Option<Arc<Dataset>>>,
}

impl DataCache {
    /// `store` is `None` when no storage credential is configured.
    pub fn new(
        store: Option<Arc<dyn BlobStore>>,
        container: impl Into<String>,
        blob: impl Into<String>,
    ) -> Self {
        Self {
            store,
            container: container.into(),
            blob: blob.into(),
            snapshot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.snapshot.read().await.as_ref() {
            return Ok(dataset.clone());
        }

        let mut guard = self.snapshot.write().await;
        // Another request may have loaded while we waited for the lock.
        if let Some(dataset) = guard.as_ref() {
            return Ok(dataset.clone());
        }

        let dataset = Arc::new(self.load().await?);
        *guard = Some(dataset.clone());
        Ok(dataset)
    }

    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
        tracing::info!("Dashboard data cache invalidated");
    }

    pub async fn reload(&self) -> Result<Arc<Dataset>> {
        self.invalidate().await;
        self.get().await
    }

    async fn load(&self) -> Result<Dataset> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| AppError::MissingConfig(BLOB_CONN_STR_VAR.to_string()))?;

        let bytes = store.fetch(&self.container, &self.blob).await.map_err(|e| {
            tracing::error!("Failed to load data: {}", e);
            e
        })?;

        let dataset = Dataset::from_csv(&bytes).map_err(|e| {
            tracing::error!("Failed to load data: {}", e);
            e
        })?;

        if dataset.is_empty() {
            tracing::warn!("{}/{} contains no rows", self.container, self.blob);
            return Err(AppError::EmptyDataset);
        }

        tracing::info!(
            "Loaded {} rows covering {} items from {}/{}",
            dataset.len(),
            dataset.item_count(),
            self.container,
            self.blob
        );
        Ok(dataset)
    }
}
