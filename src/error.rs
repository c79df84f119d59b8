use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::features::FeatureError;
use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or uncoercible request fields.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("{0}")]
    Payload(#[from] JsonRejection),
    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Feature(_) => StatusCode::BAD_REQUEST,
            ApiError::Payload(r) => r.status(),
            ApiError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Payload(r) => r.body_text(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::debug!(%status, "rejected request: {}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
