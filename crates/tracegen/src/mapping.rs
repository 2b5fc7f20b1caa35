//! Numeric id to identifier table used to interpret capture records.

use crate::artifact::{read_artifact, write_artifact, ArtifactKind};
use crate::identifier::{InternalId, ValueIdentifier};
use crate::result::{TracegenError, TracegenResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

/// `internal id -> identifier` table.
///
/// Persisted as a list of identifiers; the key is each identifier's own id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMapping {
    entries: BTreeMap<InternalId, ValueIdentifier>,
}

impl IdentifierMapping {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from identifiers; duplicate ids are a configuration error.
    pub fn from_identifiers<'a>(
        identifiers: impl IntoIterator<Item = &'a ValueIdentifier>,
    ) -> TracegenResult<Self> {
        let mut mapping = Self::new();
        for identifier in identifiers {
            mapping.insert(identifier.clone())?;
        }
        Ok(mapping)
    }

    /// Add one identifier.
    pub fn insert(&mut self, identifier: ValueIdentifier) -> TracegenResult<()> {
        let id = identifier.internal_id();
        if self.entries.contains_key(&id) {
            return Err(TracegenError::configuration(format!(
                "duplicate identifier id {id}"
            )));
        }
        self.entries.insert(id, identifier);
        Ok(())
    }

    /// Look up an id.
    #[must_use]
    pub fn get(&self, id: InternalId) -> Option<&ValueIdentifier> {
        self.entries.get(&id)
    }

    /// Look up an id that a capture record referenced. Unknown ids mean the
    /// mapping does not belong to the instrumented run.
    pub fn resolve(&self, id: InternalId) -> TracegenResult<&ValueIdentifier> {
        self.get(id).ok_or_else(|| {
            TracegenError::trace_integrity(format!(
                "capture references id {id}, which the identifier mapping does not contain"
            ))
        })
    }

    /// Whether `id` is mapped.
    #[must_use]
    pub fn contains(&self, id: InternalId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ValueIdentifier> {
        self.entries.values()
    }

    /// Argument identifiers sorted by slot.
    #[must_use]
    pub fn arguments(&self) -> Vec<&ValueIdentifier> {
        let mut args: Vec<_> = self
            .iter()
            .filter(|identifier| identifier.argument_slot().is_some())
            .collect();
        args.sort_by_key(|identifier| identifier.argument_slot());
        args
    }

    /// Field identifiers in id order.
    #[must_use]
    pub fn fields(&self) -> Vec<&ValueIdentifier> {
        self.iter().filter(|identifier| identifier.is_field()).collect()
    }

    /// Return value identifiers in id order.
    #[must_use]
    pub fn return_values(&self) -> Vec<&ValueIdentifier> {
        self.iter()
            .filter(|identifier| identifier.requires_after_capture())
            .collect()
    }

    /// Persist as an artifact.
    pub fn save(&self, path: &Path) -> TracegenResult<()> {
        write_artifact(path, ArtifactKind::IdentifierMapping, self)
    }

    /// Load a persisted mapping.
    pub fn load(path: &Path) -> TracegenResult<Self> {
        read_artifact(path, ArtifactKind::IdentifierMapping)
    }
}

impl Serialize for IdentifierMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for IdentifierMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let identifiers = Vec::<ValueIdentifier>::deserialize(deserializer)?;
        Self::from_identifiers(&identifiers).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::identifier::IdAllocator;
    use crate::method::MethodIdentifier;
    use tempfile::TempDir;

    fn sample() -> IdentifierMapping {
        let mut ids = IdAllocator::new();
        let method = MethodIdentifier::parse("com.example.Counter.add(int, int)")
            .unwrap()
            .returning("int")
            .unwrap();
        let identifiers = vec![
            ValueIdentifier::argument(&mut ids, 1, "int").unwrap(),
            ValueIdentifier::argument(&mut ids, 0, "int").unwrap(),
            ValueIdentifier::field(&mut ids, "com.example.Counter", "count", "int", false)
                .unwrap(),
            ValueIdentifier::return_value(&mut ids, &method).unwrap(),
        ];
        IdentifierMapping::from_identifiers(&identifiers).unwrap()
    }

    #[test]
    fn test_resolve_unknown_is_integrity_error() {
        let mapping = sample();
        assert!(mapping.resolve(InternalId::new(1)).is_ok());
        let err = mapping.resolve(InternalId::new(42)).unwrap_err();
        assert!(matches!(err, TracegenError::TraceIntegrity { .. }));
    }

    #[test]
    fn test_role_views() {
        let mapping = sample();
        let slots: Vec<_> = mapping
            .arguments()
            .iter()
            .map(|a| a.argument_slot().unwrap())
            .collect();
        assert_eq!(slots, vec![0, 1]);
        assert_eq!(mapping.fields().len(), 1);
        assert_eq!(mapping.return_values().len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mapping = sample();
        let mut copy = mapping.clone();
        let first = mapping.iter().next().unwrap().clone();
        assert!(copy.insert(first).is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identifiers.json");
        let mapping = sample();
        mapping.save(&path).unwrap();
        let loaded = IdentifierMapping::load(&path).unwrap();
        assert_eq!(loaded, mapping);
        for identifier in mapping.iter() {
            let back = loaded.get(identifier.internal_id()).unwrap();
            assert_eq!(back.value_type(), identifier.value_type());
            assert_eq!(back.type_name(), identifier.type_name());
            assert_eq!(back.name(), identifier.name());
        }
    }
}
