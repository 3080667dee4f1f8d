//! Snapshot documents and the storage backend seam
//!
//! Two independent documents are persisted: the ordered event list and the
//! alias mapping. Each is a plain pretty-printed JSON value with no
//! cross-references, written atomically (temp file + rename).

use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::{PersistenceError, PersistenceResult};
use crate::types::{AliasMap, LogEvent};
use crate::utils::atomic_write_with;

/// Which piece of state a snapshot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Events,
    Aliases,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 2] = [SnapshotKind::Events, SnapshotKind::Aliases];

    pub(crate) fn index(self) -> usize {
        match self {
            SnapshotKind::Events => 0,
            SnapshotKind::Aliases => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Events => "events",
            SnapshotKind::Aliases => "aliases",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time copy of one kind of state
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotData {
    Events(Vec<LogEvent>),
    Aliases(AliasMap),
}

impl SnapshotData {
    pub fn kind(&self) -> SnapshotKind {
        match self {
            SnapshotData::Events(_) => SnapshotKind::Events,
            SnapshotData::Aliases(_) => SnapshotKind::Aliases,
        }
    }

    /// The empty state for a kind
    pub fn empty(kind: SnapshotKind) -> Self {
        match kind {
            SnapshotKind::Events => SnapshotData::Events(Vec::new()),
            SnapshotKind::Aliases => SnapshotData::Aliases(AliasMap::new()),
        }
    }

    /// Number of events or aliases held
    pub fn len(&self) -> usize {
        match self {
            SnapshotData::Events(events) => events.len(),
            SnapshotData::Aliases(aliases) => aliases.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        match self {
            SnapshotData::Events(events) => events,
            SnapshotData::Aliases(_) => Vec::new(),
        }
    }

    pub fn into_aliases(self) -> AliasMap {
        match self {
            SnapshotData::Aliases(aliases) => aliases,
            SnapshotData::Events(_) => AliasMap::new(),
        }
    }
}

/// Durable storage for snapshots
///
/// Implementations are called from blocking contexts and may do synchronous
/// I/O.
pub trait SnapshotBackend: Send + Sync + 'static {
    /// Persist a snapshot, replacing the previous one of the same kind
    fn write(&self, data: &SnapshotData) -> PersistenceResult<()>;

    /// Read the last persisted snapshot; `Ok(None)` when none exists
    fn load(&self, kind: SnapshotKind) -> PersistenceResult<Option<SnapshotData>>;

    /// Where a kind is stored, for status reporting
    fn location(&self, _kind: SnapshotKind) -> Option<PathBuf> {
        None
    }
}

/// File-per-kind backend
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    events_path: PathBuf,
    aliases_path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(events_path: impl Into<PathBuf>, aliases_path: impl Into<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
            aliases_path: aliases_path.into(),
        }
    }

    /// Both files inside one directory
    pub fn in_dir(dir: impl AsRef<Path>, events_file: &str, aliases_file: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(events_file), dir.join(aliases_file))
    }

    pub fn path(&self, kind: SnapshotKind) -> &Path {
        match kind {
            SnapshotKind::Events => &self.events_path,
            SnapshotKind::Aliases => &self.aliases_path,
        }
    }
}

impl SnapshotBackend for FileSnapshotStore {
    fn write(&self, data: &SnapshotData) -> PersistenceResult<()> {
        let path = self.path(data.kind());
        atomic_write_with(path, |file| {
            match data {
                SnapshotData::Events(events) => serde_json::to_writer_pretty(&mut *file, events),
                SnapshotData::Aliases(aliases) => serde_json::to_writer_pretty(&mut *file, aliases),
            }
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
            writeln!(file)
        })?;
        Ok(())
    }

    fn load(&self, kind: SnapshotKind) -> PersistenceResult<Option<SnapshotData>> {
        let path = self.path(kind);
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);

        let data = match kind {
            SnapshotKind::Events => SnapshotData::Events(decode_events(serde_json::from_reader(reader)?)),
            SnapshotKind::Aliases => SnapshotData::Aliases(serde_json::from_reader(reader)?),
        };
        Ok(Some(data))
    }

    fn location(&self, kind: SnapshotKind) -> Option<PathBuf> {
        Some(self.path(kind).to_path_buf())
    }
}

/// Decode stored events one by one
///
/// A record that cannot be read is skipped with a warning so that the rest
/// of the history survives.
fn decode_events(records: Vec<Value>) -> Vec<LogEvent> {
    let total = records.len();
    let events: Vec<LogEvent> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            serde_json::from_value(record)
                .inspect_err(|e| warn!(index, error = %e, "Skipping unreadable stored event"))
                .ok()
        })
        .collect();

    if events.len() < total {
        warn!(kept = events.len(), skipped = total - events.len(), "Events snapshot had unreadable records");
    }
    events
}

/// Reject a snapshot whose kind does not match the slot it was loaded for
pub(crate) fn expect_kind(kind: SnapshotKind, data: SnapshotData) -> PersistenceResult<SnapshotData> {
    if data.kind() == kind {
        Ok(data)
    } else {
        Err(PersistenceError::Corrupted(format!(
            "expected {} snapshot, found {}",
            kind,
            data.kind()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileSnapshotStore {
        FileSnapshotStore::in_dir(dir.path(), "logs-data.json", "device-aliases.json")
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load(SnapshotKind::Events).unwrap().is_none());
    }

    #[test]
    fn test_events_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = store(&dir);
        let mut event = LogEvent::new(
            "1-0-abc".to_string(),
            Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            "dev-1".to_string(),
            LogLevel::Warning,
            "disk low".to_string(),
        );
        event.app = Some("unity".to_string());

        backend.write(&SnapshotData::Events(vec![event.clone()])).unwrap();
        let loaded = backend.load(SnapshotKind::Events).unwrap().unwrap();
        assert_eq!(loaded, SnapshotData::Events(vec![event]));
    }

    #[test]
    fn test_aliases_written_as_plain_object() {
        let dir = TempDir::new().unwrap();
        let backend = store(&dir);
        let mut aliases = AliasMap::new();
        aliases.insert("dev-1".to_string(), "Lobby Kiosk".to_string());

        backend.write(&SnapshotData::Aliases(aliases)).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("device-aliases.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["dev-1"], "Lobby Kiosk");
    }

    #[test]
    fn test_garbage_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("logs-data.json"), "{not json").unwrap();
        let err = store(&dir).load(SnapshotKind::Events).unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
    }

    #[test]
    fn test_unreadable_records_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("logs-data.json"),
            r#"[
                {"id": "a", "timestamp": "2024-05-01T10:00:00.000Z", "emitterId": "d", "level": "INFO", "message": "kept"},
                {"id": "b", "timestamp": "2024-05-01 10:00:05", "deviceId": "d", "level": "ERROR", "message": "legacy"},
                {"id": "c", "level": "INFO"}
            ]"#,
        )
        .unwrap();

        let events = store(&dir).load(SnapshotKind::Events).unwrap().unwrap().into_events();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_expect_kind() {
        let data = SnapshotData::empty(SnapshotKind::Aliases);
        assert!(expect_kind(SnapshotKind::Events, data).is_err());
    }
}
