//! Event id generation
//!
//! Ids look like `1715000000123-2s-k3j9x0q1m`: epoch milliseconds, a
//! per-generator counter and a random suffix, all base36 after the first
//! dash. The counter keeps ids unique within one process even when many
//! events are created in the same millisecond; the suffix keeps ids from
//! separate runs apart.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use super::time::current_timestamp_ms;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Generates unique event ids
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    counter: AtomicU64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next id
    pub fn next_id(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{}",
            current_timestamp_ms(),
            to_base36(seq),
            random_suffix(SUFFIX_LEN)
        )
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
