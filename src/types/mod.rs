//! Data types for the log hub
//!
//! This module contains the canonical event shape, alias records and the
//! query/statistics types shared by the store, the service and the API.

mod device;
mod log_event;
mod query;

pub use device::{AliasMap, DeviceEntry};
pub use log_event::{LogEvent, LogLevel, UNKNOWN_EMITTER};
pub use query::{LevelStats, LogQuery, QueryResult, DEFAULT_QUERY_LIMIT};
