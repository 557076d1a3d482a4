use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::services::stremium::StremiumError;

/// Errors surfaced by catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Provider selection is empty or matches nothing
    #[error("{0}")]
    Configuration(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] StremiumError),

    #[error("unsupported stream: {0}")]
    UnsupportedStream(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("selection store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn no_providers() -> Self {
        CatalogError::Configuration(
            "No providers selected. Choose at least one provider to merge.".to_string(),
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::Configuration(_) => StatusCode::BAD_REQUEST,
            CatalogError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CatalogError::UnsupportedStream(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Io(_) | CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
