//! Log endpoints

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::{ApiError, ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::service::ServiceStatus;
use crate::types::{LevelStats, LogEvent, LogQuery};

/// A batch element that was not accepted
#[derive(Debug, Serialize)]
pub struct RejectedPayload {
    pub index: usize,
    pub error: String,
}

/// Response to an array ingestion
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub data: Vec<LogEvent>,
    pub count: usize,
    pub rejected: Vec<RejectedPayload>,
}

/// POST /api/logs - Ingest one payload object or an array of them
///
/// An array is processed element by element; rejected elements are listed
/// with their index and never affect their siblings.
pub async fn ingest_logs(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    match body {
        Value::Array(payloads) => {
            let mut data = Vec::new();
            let mut rejected = Vec::new();
            for (index, result) in state.service.ingest_batch(&payloads).into_iter().enumerate() {
                match result {
                    Ok(event) => data.push(event),
                    Err(e) => rejected.push(RejectedPayload {
                        index,
                        error: e.to_string(),
                    }),
                }
            }

            Ok(Json(BatchResponse {
                success: true,
                count: data.len(),
                data,
                rejected,
            })
            .into_response())
        }
        payload => {
            let event = state.service.ingest_one(&payload)?;
            Ok(ApiResponse::new(event).into_response())
        }
    }
}

/// GET /api/logs - Query with optional level, emitterId, keyword, limit
pub async fn query_logs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> ApiResult<Vec<LogEvent>> {
    let Query(query) = query?;
    let result = state.service.query(&query);
    Ok(ApiResponse::with_total(result.data, result.total))
}

/// DELETE /api/logs - Clear the buffer and write the empty state
pub async fn clear_logs(State(state): State<Arc<AppState>>) -> ApiResult<ServiceStatus> {
    state.service.clear_all().await?;
    Ok(ApiResponse::new(state.service.status()))
}

/// POST /api/logs/save - Write the buffer to disk now
pub async fn save_logs(State(state): State<Arc<AppState>>) -> ApiResult<ServiceStatus> {
    state.service.flush_events().await?;
    Ok(ApiResponse::new(state.service.status()))
}

/// GET /api/logs/status
pub async fn logs_status(State(state): State<Arc<AppState>>) -> ApiResponse<ServiceStatus> {
    ApiResponse::new(state.service.status())
}

/// GET /api/logs/stats - Counts per level, WARN and WARNING merged in `warn`
pub async fn logs_stats(State(state): State<Arc<AppState>>) -> ApiResponse<LevelStats> {
    ApiResponse::new(state.service.level_stats())
}
