//! Utility functions and helpers
//!
//! Atomic snapshot writes, timestamp parsing and event id generation.

pub mod atomic;
pub mod id;
pub mod time;

pub use atomic::{atomic_write_with, cleanup_temp_files, temp_path_for, AtomicError};
pub use id::EventIdGenerator;
pub use time::{current_timestamp_ms, from_epoch_millis, now_millis_precision, parse_timestamp};
