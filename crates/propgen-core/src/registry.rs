//! Per-class, per-family property registry.
//!
//! Epochs are walked oldest to newest. Each property is keyed by name, keeps
//! the type it was first seen with, accumulates the set of epochs it appears
//! in, and is given a cumulative index the first time it shows up. Indices
//! are never reused or renumbered, so a property keeps its index across every
//! later release of the family.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::catalogs::is_structurally_implicit;
use crate::context::ExitStatus;
use crate::introspect::{IntrospectError, SchemaIntrospector};
use crate::types::{ClassDecl, PropertyDecl, PropertyMode, PropertyRecord, ReferenceWiring};
use crate::version::{DeploymentFamily, EpochMask, VersionEpoch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(
        "property {property} of {urn} is {expected} since {first_seen} but {found} at {epoch}"
    )]
    TypeConflict {
        urn: String,
        property: String,
        expected: String,
        found: String,
        first_seen: VersionEpoch,
        epoch: VersionEpoch,
    },
    #[error(
        "property {property} of {class} is reported at {epoch} but has no static declaration"
    )]
    UnresolvedProperty {
        class: String,
        property: String,
        epoch: VersionEpoch,
    },
    #[error(transparent)]
    Introspection(#[from] IntrospectError),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::TypeConflict { .. } => "PG-E002",
            RegistryError::UnresolvedProperty { .. } => "PG-E005",
            RegistryError::Introspection(_) => "PG-E001",
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        match self {
            RegistryError::TypeConflict { .. } => ExitStatus::TypeMismatch,
            RegistryError::UnresolvedProperty { .. } => ExitStatus::MissingConfigProperty,
            RegistryError::Introspection(_) => ExitStatus::Failure,
        }
    }
}

/// One property of a class within one family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub expensive: bool,
    pub read_only: bool,
    pub epochs: EpochMask,
    /// Order of first appearance across the family. `None` for properties
    /// that came from static configuration only.
    pub cumulative_index: Option<usize>,
    pub is_intrinsic: bool,
    pub generate: bool,
    pub dmf_ignore: bool,
    pub suppress_attribute: bool,
    pub read_only_after_creation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_index: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub mode: PropertyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceWiring>,
}

impl RegistryEntry {
    fn introspected(record: &PropertyRecord, decl: Option<&PropertyDecl>, epoch: usize) -> Self {
        let mut entry = match decl {
            Some(decl) => Self::declared(decl),
            None => Self::implicit(&record.name),
        };
        entry.type_name = record.declared_type.clone();
        entry.expensive = record.expensive;
        entry.read_only = record.read_only;
        entry.epochs = EpochMask::single(epoch);
        entry
    }

    fn unversioned(decl: &PropertyDecl) -> Self {
        let mut entry = Self::declared(decl);
        entry.type_name = decl.type_name.clone().unwrap_or_default();
        entry.expensive = decl.expensive;
        entry.read_only = decl.read_only;
        entry.generate = decl.generate && !is_structurally_implicit(&decl.name);
        entry.epochs = EpochMask::ALL;
        entry
    }

    fn declared(decl: &PropertyDecl) -> Self {
        Self {
            name: decl.name.clone(),
            type_name: String::new(),
            expensive: false,
            read_only: true,
            epochs: EpochMask::EMPTY,
            cumulative_index: None,
            is_intrinsic: decl.is_intrinsic,
            generate: decl.generate,
            dmf_ignore: decl.dmf_ignore,
            suppress_attribute: decl.suppress_attribute,
            read_only_after_creation: decl.read_only_after_creation,
            key_index: decl.key_index,
            default_value: decl.default.clone(),
            mode: decl.mode,
            reference: decl
                .reference
                .is_declared()
                .then(|| decl.reference.clone()),
        }
    }

    /// Name, schema or urn with no declaration: known to exist, never emitted.
    fn implicit(name: &str) -> Self {
        let mut entry = Self::declared(&PropertyDecl::new(name));
        entry.generate = false;
        entry
    }

    /// Epoch the property first appeared in. Unversioned entries report 0.
    pub fn first_epoch(&self) -> Option<usize> {
        self.epochs.first()
    }

    pub fn is_unversioned(&self) -> bool {
        self.cumulative_index.is_none()
    }
}

/// Frozen registry for one (class, family) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRegistry {
    class_name: String,
    family: DeploymentFamily,
    unversioned: bool,
    entries: BTreeMap<String, RegistryEntry>,
}

impl PropertyRegistry {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn family(&self) -> DeploymentFamily {
        self.family
    }

    /// True when the registry came from static configuration because the
    /// first answered epoch reported nothing.
    pub fn is_unversioned(&self) -> bool {
        self.unversioned
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Versioned entries in index order.
    pub fn by_index(&self) -> Vec<&RegistryEntry> {
        let mut entries: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.cumulative_index.is_some())
            .collect();
        entries.sort_by_key(|e| e.cumulative_index);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct RegistryBuilder<'a> {
    class: &'a ClassDecl,
    family: DeploymentFamily,
    entries: BTreeMap<String, RegistryEntry>,
    first_seen: BTreeMap<String, VersionEpoch>,
    next_index: usize,
}

impl<'a> RegistryBuilder<'a> {
    fn new(class: &'a ClassDecl, family: DeploymentFamily) -> Self {
        Self {
            class,
            family,
            entries: BTreeMap::new(),
            first_seen: BTreeMap::new(),
            next_index: 0,
        }
    }

    /// Folds one epoch's records in. Either every record merges or the
    /// registry is left as it was.
    fn merge_epoch(
        &mut self,
        urn: &str,
        position: usize,
        epoch: VersionEpoch,
        records: Vec<PropertyRecord>,
    ) -> Result<(), RegistryError> {
        let mut records: Vec<_> = records
            .into_iter()
            .filter(|r| r.request && !self.dropped(&r.name))
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        let mut fresh: BTreeMap<String, RegistryEntry> = BTreeMap::new();
        for record in &records {
            let known = self
                .entries
                .get(&record.name)
                .or_else(|| fresh.get(&record.name));
            if let Some(known) = known {
                if known.type_name != record.declared_type {
                    return Err(RegistryError::TypeConflict {
                        urn: urn.to_string(),
                        property: record.name.clone(),
                        expected: known.type_name.clone(),
                        found: record.declared_type.clone(),
                        first_seen: self.first_seen.get(&record.name).copied().unwrap_or(epoch),
                        epoch,
                    });
                }
                continue;
            }

            let decl = self.class.property(&record.name);
            if decl.is_none() && !is_structurally_implicit(&record.name) {
                return Err(RegistryError::UnresolvedProperty {
                    class: self.class.class_name.clone(),
                    property: record.name.clone(),
                    epoch,
                });
            }
            fresh.insert(
                record.name.clone(),
                RegistryEntry::introspected(record, decl, position),
            );
        }

        for record in &records {
            if let Some(entry) = self.entries.get_mut(&record.name) {
                entry.expensive |= record.expensive;
                entry.epochs.insert(position);
            } else if let Some(entry) = fresh.get_mut(&record.name) {
                entry.expensive |= record.expensive;
            }
        }

        // `fresh` iterates in name order, which fixes the index order.
        for (name, mut entry) in fresh {
            entry.cumulative_index = Some(self.next_index);
            self.next_index += 1;
            self.first_seen.insert(name.clone(), epoch);
            self.entries.insert(name, entry);
        }
        Ok(())
    }

    fn dropped(&self, name: &str) -> bool {
        self.class.remove_name && name == "Name"
    }

    /// Populates every declared property as present in all epochs.
    fn fill_from_config(&mut self) {
        for decl in &self.class.properties {
            if self.dropped(&decl.name) {
                continue;
            }
            self.entries
                .entry(decl.name.clone())
                .or_insert_with(|| RegistryEntry::unversioned(decl));
        }
    }

    fn freeze(self, unversioned: bool) -> PropertyRegistry {
        PropertyRegistry {
            class_name: self.class.class_name.clone(),
            family: self.family,
            unversioned,
            entries: self.entries,
        }
    }
}

/// Builds the registry of `class` for `family`.
///
/// Epochs the introspector reports as unsupported are skipped. If the first
/// epoch that answers has no properties at all, the class is treated as
/// unversioned and populated from its static declarations instead.
#[instrument(skip_all, fields(class = %class.class_name, family = %family))]
pub fn build_registry(
    class: &ClassDecl,
    family: DeploymentFamily,
    introspector: &dyn SchemaIntrospector,
) -> Result<PropertyRegistry, RegistryError> {
    let mut builder = RegistryBuilder::new(class, family);

    let Some(urn) = class.urn.as_deref() else {
        debug!("no urn, using static configuration");
        builder.fill_from_config();
        return Ok(builder.freeze(true));
    };

    let mut answered = false;
    for (position, epoch) in family.epochs().iter().copied().enumerate() {
        let records = match introspector.introspect(urn, epoch, family) {
            Ok(records) => records,
            Err(IntrospectError::EpochUnsupported { .. }) => {
                debug!(%epoch, "epoch unsupported, skipping");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if !answered && records.is_empty() {
            debug!(%epoch, "first answered epoch is empty, using static configuration");
            builder.fill_from_config();
            return Ok(builder.freeze(true));
        }
        answered = true;
        builder.merge_epoch(urn, position, epoch, records)?;
    }

    debug!(properties = builder.entries.len(), "registry built");
    Ok(builder.freeze(false))
}
