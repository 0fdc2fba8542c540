use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::api::AppState;
use crate::data::view::store_options;
use crate::data::DashboardView;
use crate::types::{
    DashboardQuery, DashboardResponse, ReloadResponse, ResponseMetadata, StoresResponse,
};
use crate::Result;

pub async fn stores(State(state): State<Arc<AppState>>) -> Result<Json<StoresResponse>> {
    let dataset = state.data.get().await?;
    Ok(Json(StoresResponse {
        stores: store_options(dataset.rows()),
    }))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>> {
    let start = Instant::now();
    let dataset = state.data.get().await?;

    let view = DashboardView::build(
        &dataset,
        query.store.as_deref(),
        query.recommendation.as_deref(),
        query.item.as_deref(),
    );

    let recommendation = view.filter.recommendation_label().to_string();
    let execution_time = start.elapsed().as_millis() as u64;

    Ok(Json(DashboardResponse {
        store: view.filter.store,
        recommendation,
        stores: view.stores,
        recommendation_options: view.recommendation_options,
        kpis: view.kpis,
        chart: view.chart,
        rows: view.rows,
        products: view.products,
        metadata: ResponseMetadata {
            timestamp: Utc::now().to_rfc3339(),
            execution_time_ms: execution_time,
            model_used: None,
        },
    }))
}

pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>> {
    let start = Instant::now();
    let dataset = state.data.reload().await?;
    let execution_time = start.elapsed().as_millis() as u64;

    Ok(Json(ReloadResponse {
        rows: dataset.len(),
        items: dataset.item_count(),
        metadata: ResponseMetadata {
            timestamp: Utc::now().to_rfc3339(),
            execution_time_ms: execution_time,
            model_used: None,
        },
    }))
}
