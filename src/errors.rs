use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::mcp::server::RpcServerError;

/// Terminal failure of one adapted call. Every variant is bound to exactly one status code.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("not acceptable: clients must accept application/json")]
    NotAcceptable,
    #[error("unsupported media type: content-type must be application/json")]
    UnsupportedMediaType,
    #[error("unprocessable entity: {message}")]
    UnprocessableEntity { message: String },
    #[error("rpc server failed: {0}")]
    Server(#[source] RpcServerError),
    #[error("failed to encode response body: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AdapterError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Server(_) | Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAcceptable => "not_acceptable",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::UnprocessableEntity { .. } => "unprocessable_entity",
            Self::Server(_) | Self::Encode(_) => "internal_error",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Server(_) | Self::Encode(_))
    }

    /// Client-facing body. Internal failures never leak their detail.
    pub fn to_error_response(&self) -> ErrorResponse {
        let message = if self.is_internal() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        ErrorResponse {
            code: self.code().to_string(),
            message,
            details: json!({}),
        }
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!(error = %self, "request failed with internal error");
        }
        (self.status_code(), Json(self.to_error_response())).into_response()
    }
}
