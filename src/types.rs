use serde::{Deserialize, Deserializer, Serialize};

// Table Types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductObservation {
    #[serde(rename = "itemname")]
    pub item_name: String,
    #[serde(rename = "Store")]
    pub store: String,
    #[serde(rename = "UnitPrice")]
    pub unit_price: Option<f64>,
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,
    pub recommendation: String,
    #[serde(deserialize_with = "deserialize_label")]
    pub predicted_label: u8,
}

impl ProductObservation {
    pub fn is_overpriced(&self) -> bool {
        self.predicted_label == 1
    }
}

fn deserialize_label<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Ok(1),
        "0" | "0.0" | "false" => Ok(0),
        other => Err(serde::de::Error::custom(format!(
            "predicted_label must be 0 or 1, got {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPrice {
    pub unit_price: f64,
    pub store: String,
}

/// A filtered row with the best price across all stores joined on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub observation: ProductObservation,
    pub best_unit_price: Option<f64>,
    pub best_store: Option<String>,
}

// Request Types
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DashboardQuery {
    pub store: Option<String>,
    pub recommendation: Option<String>,
    pub item: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub store: String,
    pub item: String,
    pub recommendation: Option<String>,
}

// Response Types
#[derive(Debug, Serialize)]
pub struct StoresResponse {
    pub stores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_products: usize,
    pub overpriced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCount {
    pub recommendation: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub store: String,
    pub recommendation: String,
    pub stores: Vec<String>,
    pub recommendation_options: Vec<String>,
    pub kpis: Kpis,
    pub chart: Vec<RecommendationCount>,
    pub rows: Vec<EnrichedRow>,
    pub products: Vec<String>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub item: String,
    pub store: String,
    pub prompt: String,
    pub explanation: String,
    pub markdown: String,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub rows: usize,
    pub items: usize,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ResponseMetadata {
    pub timestamp: String,
    pub execution_time_ms: u64,
    pub model_used: Option<String>,
}
