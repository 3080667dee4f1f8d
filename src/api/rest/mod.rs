//! REST API module for HTTP endpoints
//!
//! - `POST /api/logs` - Ingest one payload or an array of payloads
//! - `GET /api/logs` - Query the buffer
//! - `DELETE /api/logs` - Clear the buffer
//! - `POST /api/logs/save` - Write the buffer to disk now
//! - `GET /api/logs/status` - Unsaved changes and buffer size
//! - `GET /api/logs/stats` - Counts per level
//! - `GET /api/devices` - Emitters merged with aliases
//! - `GET /api/devices/aliases` - Alias mapping
//! - `POST /api/devices/alias` - Set one alias
//! - `POST /api/devices/aliases/batch` - Set many aliases
//! - `DELETE /api/devices/alias/:emitterId` - Remove an alias

pub mod devices;
pub mod logs;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::{PersistenceError, ValidationError};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    /// Match count before truncation (queries only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            total: None,
        }
    }

    pub fn with_total(data: T, total: usize) -> Self {
        Self {
            success: true,
            data,
            total: Some(total),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// API error response: `{"success": false, "error": "..."}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            success: false,
            error: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            success: false,
            error: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "Persistence failure while serving request");
        ApiError::internal(err.to_string())
    }
}

// Extractor failures keep axum's status but use the error envelope

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            success: false,
            error: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            success: false,
            error: rejection.body_text(),
        }
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::with_total(vec![1, 2], 5)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2], "total": 5}));

        let json = serde_json::to_value(ApiResponse::new("x")).unwrap();
        assert!(json.get("total").is_none());
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError = ValidationError::MissingMessage.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"success": false, "error": "log message must be a non-empty string"})
        );
    }

    #[test]
    fn test_persistence_maps_to_500() {
        let err: ApiError = PersistenceError::Corrupted("bad".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
