//! HTTP mapping for [`Error`].

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

impl Error {
    /// Status code this error is reported with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidArgument { .. } | Self::EmptyCart { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Config { .. } | Self::Io(_) | Self::EnvVar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            Self::Validation(fields) => json!({
                "error": "Validation failed",
                "fields": fields,
            }),
            other if status.is_server_error() => {
                error!("Request failed: {}", other);
                json!({ "error": "Internal server error" })
            }
            other => {
                warn!("Request rejected with {}: {}", status, other);
                json!({ "error": other.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
