//! Emitter alias types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Full alias mapping, ordered by emitter id
pub type AliasMap = BTreeMap<String, String>;

/// An emitter paired with its alias, if one is set
///
/// Also the result of a single alias mutation: `alias` is `None` when the
/// mutation left no entry behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    #[serde(alias = "deviceId")]
    pub emitter_id: String,
    pub alias: Option<String>,
}

impl DeviceEntry {
    pub fn new(emitter_id: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            emitter_id: emitter_id.into(),
            alias,
        }
    }
}
