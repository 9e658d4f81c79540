use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::types::PropertyRecord;
use crate::version::{DeploymentFamily, VersionEpoch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectError {
    /// The class does not exist at this epoch. Callers skip the epoch.
    #[error("{urn} is not supported at {epoch} on {family}")]
    EpochUnsupported {
        urn: String,
        epoch: VersionEpoch,
        family: DeploymentFamily,
    },
    /// The schema source cannot be reached at all.
    #[error("introspection source unavailable: {0}")]
    Unavailable(String),
}

/// Source of per-epoch property lists for a class.
///
/// `family` carries both the engine type and the edition to query.
pub trait SchemaIntrospector {
    fn introspect(
        &self,
        urn: &str,
        epoch: VersionEpoch,
        family: DeploymentFamily,
    ) -> Result<Vec<PropertyRecord>, IntrospectError>;
}

impl<T: SchemaIntrospector + ?Sized> SchemaIntrospector for &T {
    fn introspect(
        &self,
        urn: &str,
        epoch: VersionEpoch,
        family: DeploymentFamily,
    ) -> Result<Vec<PropertyRecord>, IntrospectError> {
        (**self).introspect(urn, epoch, family)
    }
}

/// What the schema looked like at one epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSnapshot {
    /// Classes that do not exist at this epoch.
    #[serde(default)]
    pub unsupported: BTreeSet<String>,
    #[serde(default)]
    pub classes: BTreeMap<String, Vec<PropertyRecord>>,
}

impl EpochSnapshot {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }
}

/// Introspector backed by recorded snapshots, one per (family, epoch).
///
/// Epochs with no snapshot answer [`IntrospectError::EpochUnsupported`];
/// a snapshot that does not mention a class answers with no records.
#[derive(Debug, Clone, Default)]
pub struct SnapshotIntrospector {
    snapshots: BTreeMap<(DeploymentFamily, usize), EpochSnapshot>,
}

impl SnapshotIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a snapshot. Returns the epoch position it was filed under,
    /// or `None` when `epoch` is not on the family's timeline.
    pub fn insert(
        &mut self,
        family: DeploymentFamily,
        epoch: VersionEpoch,
        snapshot: EpochSnapshot,
    ) -> Option<usize> {
        let index = family.epoch_index(epoch)?;
        self.snapshots.insert((family, index), snapshot);
        Some(index)
    }

    /// Builder-style helper: records `records` for `urn` at one epoch.
    pub fn with_class(
        mut self,
        family: DeploymentFamily,
        epoch: VersionEpoch,
        urn: &str,
        records: Vec<PropertyRecord>,
    ) -> Self {
        if let Some(index) = family.epoch_index(epoch) {
            self.snapshots
                .entry((family, index))
                .or_default()
                .classes
                .insert(urn.to_string(), records);
        }
        self
    }

    /// Builder-style helper: marks `urn` as absent at one epoch.
    pub fn with_unsupported(
        mut self,
        family: DeploymentFamily,
        epoch: VersionEpoch,
        urn: &str,
    ) -> Self {
        if let Some(index) = family.epoch_index(epoch) {
            self.snapshots
                .entry((family, index))
                .or_default()
                .unsupported
                .insert(urn.to_string());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SchemaIntrospector for SnapshotIntrospector {
    fn introspect(
        &self,
        urn: &str,
        epoch: VersionEpoch,
        family: DeploymentFamily,
    ) -> Result<Vec<PropertyRecord>, IntrospectError> {
        let unsupported = || IntrospectError::EpochUnsupported {
            urn: urn.to_string(),
            epoch,
            family,
        };
        let index = family.epoch_index(epoch).ok_or_else(unsupported)?;
        let snapshot = self.snapshots.get(&(family, index)).ok_or_else(unsupported)?;
        if snapshot.unsupported.contains(urn) {
            return Err(unsupported());
        }
        Ok(snapshot.classes.get(urn).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URN: &str = "Server/Database/Table";

    #[test]
    fn missing_epoch_is_unsupported() {
        let intro = SnapshotIntrospector::new().with_class(
            DeploymentFamily::Standalone,
            VersionEpoch::new(9, 0),
            URN,
            vec![PropertyRecord::new("Owner", "String")],
        );
        let err = intro
            .introspect(URN, VersionEpoch::new(8, 0), DeploymentFamily::Standalone)
            .unwrap_err();
        assert!(matches!(err, IntrospectError::EpochUnsupported { .. }));

        let records = intro
            .introspect(URN, VersionEpoch::new(9, 0), DeploymentFamily::Standalone)
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn families_are_isolated() {
        let intro = SnapshotIntrospector::new().with_class(
            DeploymentFamily::Standalone,
            VersionEpoch::new(10, 0),
            URN,
            vec![PropertyRecord::new("Owner", "String")],
        );
        assert!(intro
            .introspect(URN, VersionEpoch::new(10, 0), DeploymentFamily::Cloud)
            .is_err());
    }

    #[test]
    fn unknown_class_in_known_epoch_is_empty() {
        let intro = SnapshotIntrospector::new().with_class(
            DeploymentFamily::Cloud,
            VersionEpoch::new(11, 0),
            URN,
            vec![],
        );
        let records = intro
            .introspect("Server/Login", VersionEpoch::new(11, 0), DeploymentFamily::Cloud)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn explicit_unsupported_class() {
        let intro = SnapshotIntrospector::new()
            .with_class(DeploymentFamily::Cloud, VersionEpoch::new(10, 0), "Other", vec![])
            .with_unsupported(DeploymentFamily::Cloud, VersionEpoch::new(10, 0), URN);
        assert!(intro
            .introspect(URN, VersionEpoch::new(10, 0), DeploymentFamily::Cloud)
            .is_err());
    }

    #[test]
    fn open_ended_epoch_matches_release_file() {
        let mut intro = SnapshotIntrospector::new();
        let index = intro.insert(
            DeploymentFamily::Standalone,
            VersionEpoch::new(16, 0),
            EpochSnapshot::default(),
        );
        assert_eq!(index, Some(10));
        assert!(intro
            .insert(DeploymentFamily::Cloud, VersionEpoch::new(7, 0), EpochSnapshot::default())
            .is_none());
    }

    #[test]
    fn snapshot_from_yaml() {
        let yaml = r#"
unsupported: [Server/Login]
classes:
  Server/Database/Table:
    - { name: Owner, type: String }
    - { name: RowCount, type: Int64, expensive: true, read_only: true }
    - { name: Internal, type: Int32, request: false }
"#;
        let snapshot = EpochSnapshot::from_yaml_str(yaml).unwrap();
        assert!(snapshot.unsupported.contains("Server/Login"));
        let records = &snapshot.classes[URN];
        assert_eq!(records.len(), 3);
        assert!(records[1].expensive && records[1].read_only);
        assert!(!records[2].request);
        assert!(records[0].request);
    }
}
