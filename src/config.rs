pub const DATA_BLOB_CONTAINER: &str = "predictions";
pub const DATA_BLOB_FILE: &str = "dashboard_ready.csv";

pub const BLOB_CONN_STR_VAR: &str = "AZURE_BLOB_CONN_STR";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Sampling settings for the explanation call.
pub const EXPLAIN_TEMPERATURE: f64 = 0.5;
pub const EXPLAIN_MAX_TOKENS: u32 = 100;

#[derive(Debug, Clone)]
pub struct Settings {
    pub blob_conn_str: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub bind_addr: String,
    pub container: String,
    pub blob_name: String,
}

impl Settings {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()`
    /// first if a `.env` file should be honored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            blob_conn_str: get(BLOB_CONN_STR_VAR),
            openai_api_key: get(OPENAI_API_KEY_VAR),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            container: DATA_BLOB_CONTAINER.to_string(),
            blob_name: DATA_BLOB_FILE.to_string(),
        }
    }
}
