//! Alias management and the combined device view

use std::collections::BTreeMap;

use tracing::info;

use crate::error::ValidationResult;
use crate::persistence::SnapshotKind;
use crate::types::{AliasMap, DeviceEntry};

use super::IngestionService;

impl IngestionService {
    /// Set one alias; a blank alias removes it
    pub fn set_alias(&self, emitter_id: &str, alias: Option<&str>) -> ValidationResult<DeviceEntry> {
        let entry = {
            let mut aliases = self.state.aliases.write();
            let entry = aliases.set_alias(emitter_id, alias)?;
            self.hub.publish_alias_update(entry.clone());
            entry
        };

        self.schedule_aliases_write();
        match &entry.alias {
            Some(alias) => info!(emitter = %emitter_id, alias = %alias, "Alias set"),
            None => info!(emitter = %emitter_id, "Alias removed"),
        }
        Ok(entry)
    }

    /// Apply several alias changes as one step
    ///
    /// Returns the full mapping afterwards, which is also what subscribers
    /// receive.
    pub fn set_aliases_batch(&self, changes: &BTreeMap<String, Option<String>>) -> ValidationResult<AliasMap> {
        let mapping = {
            let mut aliases = self.state.aliases.write();
            aliases.set_aliases_batch(changes)?;
            let mapping = aliases.all_aliases().clone();
            self.hub.publish_aliases_batch_update(mapping.clone());
            mapping
        };

        self.schedule_aliases_write();
        info!(changed = changes.len(), total = mapping.len(), "Aliases updated in batch");
        Ok(mapping)
    }

    /// Remove an alias; returns whether one existed
    ///
    /// Subscribers are notified and a write is scheduled either way.
    pub fn delete_alias(&self, emitter_id: &str) -> bool {
        let existed = {
            let mut aliases = self.state.aliases.write();
            let existed = aliases.delete_alias(emitter_id);
            self.hub.publish_alias_update(DeviceEntry::new(emitter_id, None));
            existed
        };

        self.schedule_aliases_write();
        info!(emitter = %emitter_id, existed, "Alias deleted");
        existed
    }

    pub fn get_alias(&self, emitter_id: &str) -> Option<String> {
        self.state.aliases.read().get_alias(emitter_id).map(str::to_string)
    }

    pub fn aliases(&self) -> AliasMap {
        self.state.aliases.read().all_aliases().clone()
    }

    /// Emitters in the buffer (first-seen order) with their aliases, then
    /// aliased emitters that have no buffered events
    pub fn devices(&self) -> Vec<DeviceEntry> {
        let store = self.state.store.read();
        let aliases = self.state.aliases.read();
        aliases.combined_device_list(&store.emitters())
    }

    fn schedule_aliases_write(&self) {
        self.scheduler
            .mark_dirty_and_schedule(SnapshotKind::Aliases, self.aliases_provider.clone());
    }
}

#[cfg(test)]
mod tests {
    use crate::broadcast::HubEvent;
    use crate::error::{PersistenceResult, ValidationError};
    use crate::persistence::{SnapshotBackend, SnapshotData, SnapshotKind};
    use crate::service::{EngineConfig, IngestionService};
    use crate::types::DeviceEntry;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct NullBackend;

    impl SnapshotBackend for NullBackend {
        fn write(&self, _data: &SnapshotData) -> PersistenceResult<()> {
            Ok(())
        }

        fn load(&self, _kind: SnapshotKind) -> PersistenceResult<Option<SnapshotData>> {
            Ok(None)
        }
    }

    fn service() -> IngestionService {
        IngestionService::new(EngineConfig::default(), Arc::new(NullBackend))
    }

    #[tokio::test]
    async fn test_empty_alias_equals_delete() {
        let svc = service();
        svc.set_alias("a", Some("A")).unwrap();
        svc.set_alias("b", Some("B")).unwrap();

        svc.set_alias("a", Some("")).unwrap();
        svc.delete_alias("b");

        assert_eq!(svc.get_alias("a"), None);
        assert_eq!(svc.get_alias("b"), None);
    }

    #[tokio::test]
    async fn test_batch_scenario() {
        let svc = service();
        let mut changes = BTreeMap::new();
        changes.insert("dev-1".to_string(), Some("Lobby Kiosk".to_string()));
        changes.insert("dev-2".to_string(), Some(String::new()));

        svc.set_aliases_batch(&changes).unwrap();

        let aliases = svc.aliases();
        assert_eq!(aliases.get("dev-1").map(String::as_str), Some("Lobby Kiosk"));
        assert!(!aliases.contains_key("dev-2"));
    }

    #[tokio::test]
    async fn test_invalid_alias_leaves_state_clean() {
        let svc = service();
        assert_eq!(
            svc.set_alias("", Some("x")).unwrap_err(),
            ValidationError::EmptyEmitterId
        );
        assert!(!svc.scheduler().is_dirty(SnapshotKind::Aliases));
    }

    #[tokio::test]
    async fn test_delete_missing_still_marks_and_publishes() {
        let svc = service();
        let mut sub = svc.subscribe();
        sub.receiver.recv().await.unwrap();
        sub.receiver.recv().await.unwrap();

        assert!(!svc.delete_alias("ghost"));
        assert!(svc.scheduler().is_dirty(SnapshotKind::Aliases));

        let msg = sub.receiver.recv().await.unwrap();
        assert_eq!(msg.event, HubEvent::AliasUpdate(DeviceEntry::new("ghost", None)));
    }

    #[tokio::test]
    async fn test_devices_merge_buffer_and_aliases() {
        let svc = service();
        svc.ingest_one(&json!({"message": "m", "emitterId": "seen"})).unwrap();
        svc.set_alias("offline", Some("Spare")).unwrap();

        assert_eq!(
            svc.devices(),
            vec![
                DeviceEntry::new("seen", None),
                DeviceEntry::new("offline", Some("Spare".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_bootstrap_carries_aliases() {
        let svc = service();
        svc.set_alias("dev", Some("Dev")).unwrap();

        let mut sub = svc.subscribe();
        sub.receiver.recv().await.unwrap();
        let aliases = sub.receiver.recv().await.unwrap();
        assert!(matches!(aliases.event, HubEvent::Aliases(ref map) if map["dev"] == "Dev"));
    }
}
