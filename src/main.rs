use retaileye::api::{self, AppState};
use retaileye::config::Settings;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retaileye=debug,tower_http=info".into()),
        )
        .init();

    let settings = Settings::from_env();
    let bind_addr = settings.bind_addr.clone();

    let app_state = Arc::new(AppState::from_settings(settings)?);

    // Warm the cache; failures are shown on the dashboard instead.
    if let Err(e) = app_state.data.get().await {
        tracing::warn!("Initial data load failed: {}", e);
    }

    let app = api::create_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
