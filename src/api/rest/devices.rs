//! Device and alias endpoints

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::error::ValidationError;
use crate::types::{AliasMap, DeviceEntry};

/// Body of POST /api/devices/alias
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAliasRequest {
    #[serde(default, alias = "deviceId")]
    pub emitter_id: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Body of POST /api/devices/aliases/batch
#[derive(Debug, Deserialize)]
pub struct BatchAliasRequest {
    #[serde(default)]
    pub aliases: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAliasResult {
    pub emitter_id: String,
    pub existed: bool,
}

/// GET /api/devices - Buffered emitters and aliased emitters
pub async fn list_devices(State(state): State<Arc<AppState>>) -> ApiResponse<Vec<DeviceEntry>> {
    ApiResponse::new(state.service.devices())
}

/// GET /api/devices/aliases
pub async fn list_aliases(State(state): State<Arc<AppState>>) -> ApiResponse<AliasMap> {
    ApiResponse::new(state.service.aliases())
}

/// POST /api/devices/alias - Set one alias; an empty alias removes it
pub async fn set_alias(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SetAliasRequest>, JsonRejection>,
) -> ApiResult<DeviceEntry> {
    let Json(request) = request?;
    let emitter_id = request.emitter_id.unwrap_or_default();
    let entry = state
        .service
        .set_alias(&emitter_id, request.alias.as_deref())?;
    Ok(ApiResponse::new(entry))
}

/// POST /api/devices/aliases/batch - Set many aliases at once
///
/// `aliases` must be an object whose values are strings or null.
pub async fn set_aliases_batch(
    State(state): State<Arc<AppState>>,
    request: Result<Json<BatchAliasRequest>, JsonRejection>,
) -> ApiResult<AliasMap> {
    let Json(request) = request?;
    let changes = parse_alias_changes(request.aliases)?;
    let mapping = state.service.set_aliases_batch(&changes)?;
    Ok(ApiResponse::new(mapping))
}

/// DELETE /api/devices/alias/:emitterId
pub async fn delete_alias(
    State(state): State<Arc<AppState>>,
    Path(emitter_id): Path<String>,
) -> ApiResponse<DeleteAliasResult> {
    let existed = state.service.delete_alias(&emitter_id);
    ApiResponse::new(DeleteAliasResult { emitter_id, existed })
}

fn parse_alias_changes(raw: Value) -> Result<BTreeMap<String, Option<String>>, ValidationError> {
    let Value::Object(map) = raw else {
        return Err(ValidationError::InvalidAliases(
            "`aliases` must be an object".to_string(),
        ));
    };

    map.into_iter()
        .map(|(emitter_id, alias)| match alias {
            Value::String(s) => Ok((emitter_id, Some(s))),
            Value::Null => Ok((emitter_id, None)),
            other => Err(ValidationError::InvalidAliases(format!(
                "alias for '{}' must be a string or null, got {}",
                emitter_id, other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_alias_changes() {
        let changes = parse_alias_changes(json!({"a": "A", "b": null, "c": ""})).unwrap();
        assert_eq!(changes["a"], Some("A".to_string()));
        assert_eq!(changes["b"], None);
        assert_eq!(changes["c"], Some(String::new()));
    }

    #[test]
    fn test_parse_alias_changes_rejects_bad_shapes() {
        assert!(matches!(
            parse_alias_changes(json!(["a"])),
            Err(ValidationError::InvalidAliases(_))
        ));
        assert!(matches!(
            parse_alias_changes(json!({"a": 5})),
            Err(ValidationError::InvalidAliases(_))
        ));
        assert!(parse_alias_changes(Value::Null).is_err());
    }

    #[test]
    fn test_set_alias_request_accepts_device_id() {
        let req: SetAliasRequest = serde_json::from_value(json!({"deviceId": "d", "alias": "D"})).unwrap();
        assert_eq!(req.emitter_id.as_deref(), Some("d"));
    }
}
