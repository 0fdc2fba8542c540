use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("{0} not found. Please configure it in Azure App Service.")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("Loaded table is empty")]
    EmptyDataset,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) | AppError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MissingConfig(_) | AppError::InvalidConfig(_) | AppError::EmptyDataset => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Storage(_) | AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(err) => tracing::error!("Internal error: {}", err),
            AppError::Storage(msg) | AppError::ExternalApi(msg) => {
                tracing::warn!("Upstream error: {}", msg)
            }
            _ => {}
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_message_names_the_variable() {
        let err = AppError::MissingConfig("AZURE_BLOB_CONN_STR".to_string());
        assert_eq!(
            err.to_string(),
            "AZURE_BLOB_CONN_STR not found. Please configure it in Azure App Service."
        );
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        assert_eq!(
            AppError::Storage("boom".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::ExternalApi("quota".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
