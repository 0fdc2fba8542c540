use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use std::sync::Arc;

use crate::api::explain::explain_row;
use crate::api::AppState;
use crate::data::DashboardView;
use crate::types::{DashboardQuery, EnrichedRow};
use crate::{AppError, Result};

struct Choice {
    value: String,
    selected: bool,
}

struct Bar {
    label: String,
    count: usize,
    percent: usize,
}

struct TableRow {
    item_name: String,
    store: String,
    unit_price: String,
    rating: String,
    recommendation: String,
    best_store: String,
    best_unit_price: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    store: String,
    recommendation: String,
    stores: Vec<Choice>,
    recommendations: Vec<Choice>,
    total_products: usize,
    overpriced: usize,
    bars: Vec<Bar>,
    rows: Vec<TableRow>,
    products: Vec<Choice>,
    explanation: Option<String>,
    explanation_error: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: String,
}

fn choices(options: &[String], selected: &str) -> Vec<Choice> {
    options
        .iter()
        .map(|o| Choice {
            value: o.clone(),
            selected: o == selected,
        })
        .collect()
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_default()
}

fn table_row(row: &EnrichedRow) -> TableRow {
    let o = &row.observation;
    TableRow {
        item_name: o.item_name.clone(),
        store: o.store.clone(),
        unit_price: cell(o.unit_price, 2),
        rating: cell(o.rating, 1),
        recommendation: o.recommendation.clone(),
        best_store: row.best_store.clone().unwrap_or_default(),
        best_unit_price: cell(row.best_unit_price, 2),
    }
}

impl DashboardTemplate {
    fn new(view: &DashboardView) -> Self {
        let max = view.chart.iter().map(|c| c.count).max().unwrap_or(0).max(1);
        let selected_item = view.selected_item.as_deref().unwrap_or("");

        Self {
            store: view.filter.store.clone(),
            recommendation: view.filter.recommendation_label().to_string(),
            stores: choices(&view.stores, &view.filter.store),
            recommendations: choices(
                &view.recommendation_options,
                view.filter.recommendation_label(),
            ),
            total_products: view.kpis.total_products,
            overpriced: view.kpis.overpriced,
            bars: view
                .chart
                .iter()
                .map(|c| Bar {
                    label: c.recommendation.clone(),
                    count: c.count,
                    percent: c.count * 100 / max,
                })
                .collect(),
            rows: view.rows.iter().map(table_row).collect(),
            products: choices(&view.products, selected_item),
            explanation: None,
            explanation_error: None,
        }
    }
}

fn render<T: Template>(template: &T, status: StatusCode) -> Result<Response> {
    match template.render() {
        Ok(html) => Ok((status, Html(html)).into_response()),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            Err(AppError::Internal(anyhow::Error::new(e)))
        }
    }
}

/// Message shown in place of the dashboard when the table cannot be loaded.
pub fn load_error_message(err: &AppError) -> String {
    match err {
        AppError::MissingConfig(_) => err.to_string(),
        AppError::EmptyDataset => "No product data available.".to_string(),
        other => format!("Failed to load data: {}", other),
    }
}

async fn build_view(state: &AppState, query: &DashboardQuery) -> std::result::Result<DashboardView, Response> {
    match state.data.get().await {
        Ok(dataset) => Ok(DashboardView::build(
            &dataset,
            query.store.as_deref(),
            query.recommendation.as_deref(),
            query.item.as_deref(),
        )),
        Err(e) => {
            let page = ErrorTemplate {
                message: load_error_message(&e),
            };
            Err(render(&page, e.status()).unwrap_or_else(|e| e.into_response()))
        }
    }
}

pub async fn page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response> {
    let view = match build_view(&state, &query).await {
        Ok(view) => view,
        Err(halted) => return Ok(halted),
    };

    render(&DashboardTemplate::new(&view), StatusCode::OK)
}

pub async fn explain(
    State(state): State<Arc<AppState>>,
    Form(query): Form<DashboardQuery>,
) -> Result<Response> {
    let view = match build_view(&state, &query).await {
        Ok(view) => view,
        Err(halted) => return Ok(halted),
    };

    let mut template = DashboardTemplate::new(&view);
    match view.selected_row() {
        Some(row) => match explain_row(&state, row).await {
            Ok(explanation) => template.explanation = Some(explanation.text),
            Err(e) => template.explanation_error = Some(e.to_string()),
        },
        None => {
            template.explanation_error = Some("No product selected.".to_string());
        }
    }

    render(&template, StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::types::ProductObservation;

    fn dataset() -> Dataset {
        let row = |item: &str, store: &str, price: f64, reco: &str, label: u8| ProductObservation {
            item_name: item.to_string(),
            store: store.to_string(),
            unit_price: Some(price),
            rating: Some(4.25),
            recommendation: reco.to_string(),
            predicted_label: label,
        };
        Dataset::new(vec![
            row("Oat <Milk>", "Northside", 3.5, "Overpriced", 1),
            row("Oat <Milk>", "Eastgate", 2.75, "Fair", 0),
            row("Rice", "Northside", 9.99, "Fair", 0),
        ])
    }

    #[test]
    fn load_errors_have_user_facing_messages() {
        assert_eq!(
            load_error_message(&AppError::MissingConfig("AZURE_BLOB_CONN_STR".into())),
            "AZURE_BLOB_CONN_STR not found. Please configure it in Azure App Service."
        );
        assert_eq!(
            load_error_message(&AppError::Storage("Blob service returned 404".into())),
            "Failed to load data: Storage error: Blob service returned 404"
        );
        assert_eq!(
            load_error_message(&AppError::EmptyDataset),
            "No product data available."
        );
    }

    #[test]
    fn dashboard_renders_kpis_table_and_escapes_html() {
        let data = dataset();
        let view = DashboardView::build(&data, Some("Northside"), None, None);
        let html = DashboardTemplate::new(&view).render().unwrap();

        assert!(html.contains("Total Products"));
        assert!(html.contains("Oat &lt;Milk&gt;"));
        assert!(!html.contains("Oat <Milk>"));
        assert!(html.contains("2.75"));
        assert!(html.contains("Eastgate"));
        assert!(html.contains("Explain Recommendation"));
    }

    #[test]
    fn bar_widths_are_relative_to_largest_count() {
        let data = dataset();
        let view = DashboardView::build(&data, Some("Northside"), None, None);
        let template = DashboardTemplate::new(&view);
        let widths: Vec<usize> = template.bars.iter().map(|b| b.percent).collect();
        assert_eq!(widths, vec![100, 100]);
        assert_eq!(template.total_products, 2);
        assert_eq!(template.overpriced, 1);
    }
}
