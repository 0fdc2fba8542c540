use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::api::AppState;
use crate::clients::ai::prompts::{build_explanation_prompt, explanation_markdown};
use crate::config::OPENAI_API_KEY_VAR;
use crate::data::DashboardView;
use crate::types::{EnrichedRow, ExplainRequest, ExplainResponse, ResponseMetadata};
use crate::{AppError, Result};

pub struct Explanation {
    pub prompt: String,
    pub text: String,
    pub markdown: String,
    pub model: String,
}

/// Formats the prompt for one row and asks the model for a single sentence.
pub async fn explain_row(state: &AppState, row: &EnrichedRow) -> Result<Explanation> {
    let ai_client = state
        .ai_client
        .as_ref()
        .ok_or_else(|| AppError::MissingConfig(OPENAI_API_KEY_VAR.to_string()))?;

    let prompt = build_explanation_prompt(row);
    tracing::debug!("Explanation prompt: {}", prompt);

    let text = ai_client.complete(prompt.clone()).await.map_err(|e| {
        tracing::error!(
            "Explanation failed for {} at {}: {}",
            row.observation.item_name,
            row.observation.store,
            e
        );
        e
    })?;

    Ok(Explanation {
        prompt,
        markdown: explanation_markdown(&text),
        text,
        model: ai_client.model_name().to_string(),
    })
}

pub async fn handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>> {
    let start = Instant::now();

    // Validate request
    if request.item.trim().is_empty() {
        return Err(AppError::Validation("Item is required".to_string()));
    }
    if request.store.trim().is_empty() {
        return Err(AppError::Validation("Store is required".to_string()));
    }

    let dataset = state.data.get().await?;
    let view = DashboardView::build(
        &dataset,
        Some(request.store.as_str()),
        request.recommendation.as_deref(),
        Some(request.item.as_str()),
    );

    if view.filter.store != request.store {
        return Err(AppError::NotFound(format!("Store {}", request.store)));
    }
    let row = view
        .selected_row()
        .filter(|r| r.observation.item_name == request.item)
        .ok_or_else(|| {
            AppError::NotFound(format!("Item {} at {}", request.item, request.store))
        })?;

    let explanation = explain_row(&state, row).await?;
    let execution_time = start.elapsed().as_millis() as u64;

    Ok(Json(ExplainResponse {
        item: row.observation.item_name.clone(),
        store: row.observation.store.clone(),
        prompt: explanation.prompt,
        explanation: explanation.text,
        markdown: explanation.markdown,
        metadata: ResponseMetadata {
            timestamp: Utc::now().to_rfc3339(),
            execution_time_ms: execution_time,
            model_used: Some(explanation.model),
        },
    }))
}
