pub mod dashboard;
pub mod data;
pub mod explain;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::clients::{AiClient, AzureBlobClient, BlobStore, OpenAiClient};
use crate::config::Settings;
use crate::data::DataCache;
use crate::Result;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub data: Arc<DataCache>,
    pub ai_client: Option<Arc<dyn AiClient>>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let store: Option<Arc<dyn BlobStore>> = match settings.blob_conn_str.as_deref() {
            Some(conn_str) => Some(Arc::new(AzureBlobClient::new(conn_str)?)),
            None => {
                tracing::warn!("AZURE_BLOB_CONN_STR not set; dashboard will show a configuration error");
                None
            }
        };

        let ai_client: Option<Arc<dyn AiClient>> = match settings.openai_api_key.as_deref() {
            Some(key) => Some(Arc::new(OpenAiClient::new(key, settings.openai_model.clone())?)),
            None => {
                tracing::warn!("OPENAI_API_KEY not set; explanations are disabled");
                None
            }
        };

        let data = Arc::new(DataCache::new(
            store,
            settings.container.clone(),
            settings.blob_name.clone(),
        ));

        Ok(Self {
            settings: Arc::new(settings),
            data,
            ai_client,
        })
    }
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard::page))
        .route("/explain", post(dashboard::explain))
        .route("/api/stores", get(data::stores))
        .route("/api/dashboard", get(data::dashboard))
        .route("/api/reload", post(data::reload))
        .route("/api/explain", post(explain::handler))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
