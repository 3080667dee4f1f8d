//! Server configuration
//!
//! Everything comes from environment variables (a `.env` file is honoured by
//! the binary). Unset variables take the defaults below; unparsable numbers
//! are ignored with a warning.
//!
//! | Variable               | Default               |
//! |------------------------|-----------------------|
//! | `PORT`                 | 3000                  |
//! | `LOGHUB_DATA_DIR`      | `.`                   |
//! | `LOGHUB_EVENTS_FILE`   | `logs-data.json`      |
//! | `LOGHUB_ALIASES_FILE`  | `device-aliases.json` |
//! | `MAX_LOGS`             | 1000                  |
//! | `WRITE_DELAY_MS`       | 3000                  |
//! | `HISTORY_REPLAY`       | 100                   |
//! | `SUBSCRIBER_QUEUE`     | 1024                  |
//! | `LOGHUB_ENV` / `NODE_ENV` | `development`      |
//! | `SIMULATE_INTERVAL_MS` | 3000                  |
//! | `LOGHUB_SIMULATE`      | on in development     |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::warn;

use crate::persistence::FileSnapshotStore;
use crate::service::EngineConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_EVENTS_FILE: &str = "logs-data.json";
pub const DEFAULT_ALIASES_FILE: &str = "device-aliases.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub events_file: String,
    pub aliases_file: String,
    pub max_logs: usize,
    pub write_delay_ms: u64,
    pub history_replay: usize,
    pub subscriber_queue: usize,
    pub environment: String,
    pub simulate: bool,
    pub simulate_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("."),
            events_file: DEFAULT_EVENTS_FILE.to_string(),
            aliases_file: DEFAULT_ALIASES_FILE.to_string(),
            max_logs: 1000,
            write_delay_ms: 3000,
            history_replay: 100,
            subscriber_queue: 1024,
            environment: "development".to_string(),
            simulate: true,
            simulate_interval_ms: 3000,
        }
    }
}

impl Config {
    /// Read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Read from any key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        maybe_parse(&lookup, "PORT", &mut cfg.port);
        maybe_parse(&lookup, "MAX_LOGS", &mut cfg.max_logs);
        maybe_parse(&lookup, "WRITE_DELAY_MS", &mut cfg.write_delay_ms);
        maybe_parse(&lookup, "HISTORY_REPLAY", &mut cfg.history_replay);
        maybe_parse(&lookup, "SUBSCRIBER_QUEUE", &mut cfg.subscriber_queue);
        maybe_parse(&lookup, "SIMULATE_INTERVAL_MS", &mut cfg.simulate_interval_ms);

        if let Some(dir) = non_empty(&lookup, "LOGHUB_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = non_empty(&lookup, "LOGHUB_EVENTS_FILE") {
            cfg.events_file = file;
        }
        if let Some(file) = non_empty(&lookup, "LOGHUB_ALIASES_FILE") {
            cfg.aliases_file = file;
        }
        if let Some(environment) =
            non_empty(&lookup, "LOGHUB_ENV").or_else(|| non_empty(&lookup, "NODE_ENV"))
        {
            cfg.environment = environment;
        }

        cfg.simulate = cfg.is_development();
        if let Some(raw) = non_empty(&lookup, "LOGHUB_SIMULATE") {
            match parse_flag(&raw) {
                Some(flag) => cfg.simulate = flag,
                None => warn!(key = "LOGHUB_SIMULATE", value = %raw, "Ignoring invalid flag"),
            }
        }

        validate(&cfg)?;
        Ok(cfg)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn simulate_interval(&self) -> Duration {
        Duration::from_millis(self.simulate_interval_ms)
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(&self.events_file)
    }

    pub fn aliases_path(&self) -> PathBuf {
        self.data_dir.join(&self.aliases_file)
    }

    /// The subset the ingestion engine needs
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_capacity: self.max_logs,
            history_replay: self.history_replay,
            subscriber_queue: self.subscriber_queue,
            write_delay: self.write_delay(),
        }
    }

    pub fn snapshot_store(&self) -> FileSnapshotStore {
        FileSnapshotStore::new(self.events_path(), self.aliases_path())
    }
}

fn validate(cfg: &Config) -> Result<()> {
    if cfg.max_logs == 0 {
        bail!("MAX_LOGS must be at least 1");
    }
    if cfg.subscriber_queue < 2 {
        bail!("SUBSCRIBER_QUEUE must be at least 2");
    }
    if cfg.simulate && cfg.simulate_interval_ms == 0 {
        bail!("SIMULATE_INTERVAL_MS must be positive when the simulator is on");
    }
    Ok(())
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn maybe_parse<F, T>(lookup: &F, key: &str, val: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = non_empty(lookup, key) {
        match raw.parse::<T>() {
            Ok(parsed) => *val = parsed,
            Err(_) => warn!(key, value = %raw, "Ignoring unparsable value"),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.events_path(), PathBuf::from("./logs-data.json"));
        assert!(cfg.simulate);
    }

    #[test]
    fn test_overrides() {
        let cfg = load(&[
            ("PORT", "8080"),
            ("MAX_LOGS", "50"),
            ("WRITE_DELAY_MS", "300000"),
            ("LOGHUB_DATA_DIR", "/var/lib/loghub"),
            ("NODE_ENV", "production"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.engine().max_capacity, 50);
        assert_eq!(cfg.write_delay(), Duration::from_secs(300));
        assert_eq!(cfg.aliases_path(), PathBuf::from("/var/lib/loghub/device-aliases.json"));
        assert!(!cfg.simulate);
    }

    #[test]
    fn test_loghub_env_wins_over_node_env() {
        let cfg = load(&[("LOGHUB_ENV", "production"), ("NODE_ENV", "development")]).unwrap();
        assert_eq!(cfg.environment, "production");
    }

    #[test]
    fn test_bad_number_keeps_default() {
        let cfg = load(&[("MAX_LOGS", "lots")]).unwrap();
        assert_eq!(cfg.max_logs, 1000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("MAX_LOGS", "0")]).is_err());
        assert!(load(&[("SUBSCRIBER_QUEUE", "1")]).is_err());
    }

    #[test]
    fn test_simulate_flag() {
        let cfg = load(&[("LOGHUB_SIMULATE", "off")]).unwrap();
        assert!(!cfg.simulate);
        let cfg = load(&[("NODE_ENV", "production"), ("LOGHUB_SIMULATE", "yes")]).unwrap();
        assert!(cfg.simulate);
    }
}
