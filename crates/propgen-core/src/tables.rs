use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{instrument, warn};

use crate::registry::{PropertyRegistry, RegistryEntry};
use crate::types::StaticMetadata;
use crate::version::{DeploymentFamily, VersionEpoch};

/// Version-bucketed view of a registry.
///
/// `metadata` lists properties by epoch of first appearance, so the prefix
/// `metadata[..counts[i]]` is exactly the set of properties visible on a
/// server at epoch `i`. `counts` is non-decreasing and has one slot per
/// declared epoch of the family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionBucketTable {
    family: DeploymentFamily,
    counts: Vec<usize>,
    metadata: Vec<StaticMetadata>,
}

impl VersionBucketTable {
    pub fn family(&self) -> DeploymentFamily {
        self.family
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn metadata(&self) -> &[StaticMetadata] {
        &self.metadata
    }

    pub fn total(&self) -> usize {
        self.metadata.len()
    }

    /// Properties visible at epoch position `epoch`.
    pub fn visible_at(&self, epoch: usize) -> &[StaticMetadata] {
        let count = self.counts.get(epoch).copied().unwrap_or(0);
        &self.metadata[..count]
    }

    /// Number of properties visible on a server reporting `version`, or
    /// `None` when the version is newer than the family's timeline.
    pub fn visible_count(&self, version: VersionEpoch) -> Option<usize> {
        let epoch = self.family.epoch_containing(version)?;
        self.counts.get(epoch).copied()
    }

    /// Position of a property in the metadata table.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.metadata.iter().position(|m| m.name == name)
    }

    /// Name to position pairs in name order, for generated lookups.
    pub fn lookup(&self) -> Vec<(&str, usize)> {
        let mut pairs: Vec<_> = self
            .metadata
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.as_str(), i))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}

/// Buckets a frozen registry by epoch of first appearance.
///
/// Unversioned entries all land in the first bucket, in name order.
#[instrument(skip_all, fields(class = registry.class_name(), family = %registry.family()))]
pub fn build_version_tables(registry: &PropertyRegistry) -> VersionBucketTable {
    let family = registry.family();
    let epoch_count = family.epochs().len();

    let mut buckets: BTreeMap<usize, Vec<&RegistryEntry>> = BTreeMap::new();
    for entry in registry.iter() {
        match entry.first_epoch() {
            Some(first) if first < epoch_count => buckets.entry(first).or_default().push(entry),
            _ => warn!(property = %entry.name, "entry has no epoch on this timeline, skipped"),
        }
    }

    let mut counts = Vec::with_capacity(epoch_count);
    let mut metadata = Vec::with_capacity(registry.len());
    for epoch in 0..epoch_count {
        if let Some(bucket) = buckets.get_mut(&epoch) {
            // Registry iteration is name-ordered, so the stable sort keeps
            // names ordered among unversioned entries.
            bucket.sort_by_key(|e| e.cumulative_index);
            metadata.extend(bucket.iter().map(|e| StaticMetadata {
                name: e.name.clone(),
                type_name: e.type_name.clone(),
                expensive: e.expensive,
                read_only: e.read_only,
            }));
        }
        counts.push(metadata.len());
    }

    VersionBucketTable {
        family,
        counts,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::SnapshotIntrospector;
    use crate::registry::build_registry;
    use crate::types::{ClassDecl, PropertyDecl, PropertyRecord};
    use pretty_assertions::assert_eq;

    const URN: &str = "Server/Database/Table";
    const SA: DeploymentFamily = DeploymentFamily::Standalone;

    fn class(props: &[&str]) -> ClassDecl {
        ClassDecl {
            class_name: "Table".into(),
            urn: Some(URN.into()),
            parent_type: None,
            possible_parents: vec![],
            has_schema: false,
            has_constructors: true,
            gen_metadata: true,
            remove_name: false,
            gen_body: vec![],
            collection_name: None,
            collections: vec![],
            properties: props.iter().map(|p| PropertyDecl::new(*p)).collect(),
        }
    }

    fn names(table: &VersionBucketTable) -> Vec<&str> {
        table.metadata().iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn counts_accumulate_over_timeline() {
        let intro = SnapshotIntrospector::new()
            .with_class(SA, VersionEpoch::new(7, 0), URN, vec![PropertyRecord::new("Bar", "Int32")])
            .with_class(SA, VersionEpoch::new(8, 0), URN, vec![PropertyRecord::new("Bar", "Int32")])
            .with_class(
                SA,
                VersionEpoch::new(9, 0),
                URN,
                vec![
                    PropertyRecord::new("Bar", "Int32"),
                    PropertyRecord::new("Foo", "String"),
                ],
            );
        let registry = build_registry(&class(&["Bar", "Foo"]), SA, &intro).unwrap();
        let table = build_version_tables(&registry);

        assert_eq!(&table.counts()[..3], &[1, 1, 2]);
        assert_eq!(table.counts().len(), SA.epochs().len());
        assert!(table.counts()[3..].iter().all(|&c| c == 2));
        assert_eq!(names(&table), vec!["Bar", "Foo"]);
        assert_eq!(table.visible_at(1).len(), 1);
        assert_eq!(table.visible_count(VersionEpoch::new(8, 0)), Some(1));
        assert_eq!(table.visible_count(VersionEpoch::with_patch(17, 0, 99)), Some(2));
        assert_eq!(table.visible_count(VersionEpoch::new(18, 0)), None);
        assert_eq!(table.position_of("Foo"), Some(1));
    }

    #[test]
    fn unversioned_registry_is_one_bucket_in_name_order() {
        let mut decl = class(&["Owner", "Alpha", "Name"]);
        decl.urn = None;
        let registry = build_registry(&decl, SA, &SnapshotIntrospector::new()).unwrap();
        let table = build_version_tables(&registry);
        assert_eq!(names(&table), vec!["Alpha", "Name", "Owner"]);
        assert!(table.counts().iter().all(|&c| c == 3));
    }

    #[test]
    fn empty_registry_has_zero_counts() {
        let intro = SnapshotIntrospector::new().with_unsupported(SA, VersionEpoch::new(7, 0), URN);
        let registry = build_registry(&class(&[]), SA, &intro).unwrap();
        let table = build_version_tables(&registry);
        assert_eq!(table.total(), 0);
        assert!(table.counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn lookup_is_name_sorted() {
        let intro = SnapshotIntrospector::new()
            .with_class(
                SA,
                VersionEpoch::new(7, 0),
                URN,
                vec![PropertyRecord::new("Zed", "Int32")],
            )
            .with_class(
                SA,
                VersionEpoch::new(8, 0),
                URN,
                vec![PropertyRecord::new("Abe", "Int32")],
            );
        let registry = build_registry(&class(&["Zed", "Abe"]), SA, &intro).unwrap();
        let table = build_version_tables(&registry);
        assert_eq!(names(&table), vec!["Zed", "Abe"]);
        assert_eq!(table.lookup(), vec![("Abe", 1), ("Zed", 0)]);
    }
}
