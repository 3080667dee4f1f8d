//! Emitter alias table
//!
//! Maps emitter ids to human-friendly names. A blank alias is a deletion,
//! so the table never stores an empty name.

use std::collections::BTreeMap;

use crate::error::{ValidationError, ValidationResult};
use crate::types::{AliasMap, DeviceEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: AliasMap,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a loaded snapshot, dropping blank keys and values
    pub fn from_map(map: AliasMap) -> Self {
        let aliases = map
            .into_iter()
            .filter_map(|(id, alias)| {
                let alias = alias.trim().to_string();
                (!id.is_empty() && !alias.is_empty()).then_some((id, alias))
            })
            .collect();
        Self { aliases }
    }

    /// Set or delete one alias
    ///
    /// A missing or whitespace-only alias removes the entry. Returns the
    /// resulting entry; `alias` is `None` when nothing is stored.
    pub fn set_alias(&mut self, emitter_id: &str, alias: Option<&str>) -> ValidationResult<DeviceEntry> {
        check_emitter_id(emitter_id)?;
        Ok(self.apply(emitter_id, alias))
    }

    /// Apply many alias changes at once
    ///
    /// Every key is validated before anything is written, so a bad key
    /// leaves the table untouched.
    pub fn set_aliases_batch(
        &mut self,
        changes: &BTreeMap<String, Option<String>>,
    ) -> ValidationResult<Vec<DeviceEntry>> {
        for emitter_id in changes.keys() {
            check_emitter_id(emitter_id)?;
        }
        Ok(changes
            .iter()
            .map(|(id, alias)| self.apply(id, alias.as_deref()))
            .collect())
    }

    /// Remove an alias; returns whether one existed
    pub fn delete_alias(&mut self, emitter_id: &str) -> bool {
        self.aliases.remove(emitter_id).is_some()
    }

    pub fn get_alias(&self, emitter_id: &str) -> Option<&str> {
        self.aliases.get(emitter_id).map(String::as_str)
    }

    pub fn all_aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Emitters seen in the buffer, then aliased emitters not in the buffer
    ///
    /// `seen` is expected in first-seen order and keeps that order. The
    /// remaining aliased emitters follow in id order.
    pub fn combined_device_list(&self, seen: &[String]) -> Vec<DeviceEntry> {
        let mut devices: Vec<DeviceEntry> = seen
            .iter()
            .map(|id| DeviceEntry::new(id.clone(), self.aliases.get(id).cloned()))
            .collect();

        devices.extend(
            self.aliases
                .iter()
                .filter(|(id, _)| !seen.contains(id))
                .map(|(id, alias)| DeviceEntry::new(id.clone(), Some(alias.clone()))),
        );
        devices
    }

    fn apply(&mut self, emitter_id: &str, alias: Option<&str>) -> DeviceEntry {
        match alias.map(str::trim).filter(|a| !a.is_empty()) {
            Some(alias) => {
                self.aliases.insert(emitter_id.to_string(), alias.to_string());
                DeviceEntry::new(emitter_id, Some(alias.to_string()))
            }
            None => {
                self.aliases.remove(emitter_id);
                DeviceEntry::new(emitter_id, None)
            }
        }
    }
}

fn check_emitter_id(emitter_id: &str) -> ValidationResult<()> {
    if emitter_id.trim().is_empty() {
        return Err(ValidationError::EmptyEmitterId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut table = AliasTable::new();
        let entry = table.set_alias("WIN-PC-12345", Some("  Lobby Kiosk ")).unwrap();

        assert_eq!(entry.alias.as_deref(), Some("Lobby Kiosk"));
        assert_eq!(table.get_alias("WIN-PC-12345"), Some("Lobby Kiosk"));
    }

    #[test]
    fn test_blank_alias_deletes() {
        let mut table = AliasTable::new();
        table.set_alias("dev", Some("name")).unwrap();

        let entry = table.set_alias("dev", Some("   ")).unwrap();
        assert_eq!(entry.alias, None);
        assert!(table.is_empty());

        table.set_alias("dev", Some("name")).unwrap();
        table.set_alias("dev", None).unwrap();
        assert!(table.get_alias("dev").is_none());
    }

    #[test]
    fn test_empty_emitter_rejected() {
        let mut table = AliasTable::new();
        assert_eq!(
            table.set_alias("", Some("x")).unwrap_err(),
            ValidationError::EmptyEmitterId
        );
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut table = AliasTable::new();
        table.set_alias("keep", Some("Kept")).unwrap();

        let mut changes = BTreeMap::new();
        changes.insert("a".to_string(), Some("A".to_string()));
        changes.insert(" ".to_string(), Some("bad".to_string()));

        assert!(table.set_aliases_batch(&changes).is_err());
        assert_eq!(table.len(), 1);
        assert!(table.get_alias("a").is_none());
    }

    #[test]
    fn test_batch_mixes_sets_and_deletes() {
        let mut table = AliasTable::new();
        table.set_alias("old", Some("Old")).unwrap();

        let mut changes = BTreeMap::new();
        changes.insert("new".to_string(), Some("New".to_string()));
        changes.insert("old".to_string(), None);

        let applied = table.set_aliases_batch(&changes).unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(table.get_alias("new"), Some("New"));
        assert!(table.get_alias("old").is_none());
    }

    #[test]
    fn test_delete_reports_existence() {
        let mut table = AliasTable::new();
        table.set_alias("dev", Some("D")).unwrap();
        assert!(table.delete_alias("dev"));
        assert!(!table.delete_alias("dev"));
    }

    #[test]
    fn test_combined_device_list() {
        let mut table = AliasTable::new();
        table.set_alias("b", Some("Bee")).unwrap();
        table.set_alias("offline", Some("Gone")).unwrap();

        let seen = vec!["c".to_string(), "b".to_string()];
        let devices = table.combined_device_list(&seen);

        assert_eq!(
            devices,
            vec![
                DeviceEntry::new("c", None),
                DeviceEntry::new("b", Some("Bee".to_string())),
                DeviceEntry::new("offline", Some("Gone".to_string())),
            ]
        );
    }

    #[test]
    fn test_from_map_drops_blank_entries() {
        let mut map = AliasMap::new();
        map.insert("a".to_string(), " A ".to_string());
        map.insert("b".to_string(), "  ".to_string());
        map.insert(String::new(), "x".to_string());

        let table = AliasTable::from_map(map);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_alias("a"), Some("A"));
    }
}
