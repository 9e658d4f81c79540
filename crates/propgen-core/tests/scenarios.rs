use propgen_core::{
    build_registry, build_version_tables, generate, BuildContext, DeploymentFamily, ExitStatus,
    GenerateOptions, PropertyRecord, RegistryError, SnapshotIntrospector, StaticConfig,
    VersionEpoch,
};
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CONFIG: &str = r#"
namespaces:
  - name: Catalog
    classes:
      - class_name: Widget
        urn: Server/Widget
        parent_type: Server
        properties:
          - { name: Bar }
          - { name: Foo }
          - { name: X }
"#;

fn config() -> StaticConfig {
    StaticConfig::from_yaml_str(CONFIG).unwrap()
}

fn standalone(snapshots: &[(u16, u16, Vec<PropertyRecord>)]) -> SnapshotIntrospector {
    snapshots
        .iter()
        .fold(SnapshotIntrospector::new(), |intro, (major, minor, records)| {
            intro.with_class(
                DeploymentFamily::Standalone,
                VersionEpoch::new(*major, *minor),
                "Server/Widget",
                records.clone(),
            )
        })
}

// ===========================================================================
// Growth, conflicts and unresolved properties end to end
// ===========================================================================

#[test]
fn simple_growth() {
    let cfg = config();
    let class = &cfg.namespaces[0].classes[0];
    let intro = standalone(&[
        (7, 0, vec![PropertyRecord::new("Bar", "Int32")]),
        (8, 0, vec![PropertyRecord::new("Bar", "Int32")]),
        (
            9,
            0,
            vec![
                PropertyRecord::new("Bar", "Int32"),
                PropertyRecord::new("Foo", "String"),
            ],
        ),
    ]);

    let registry = build_registry(class, DeploymentFamily::Standalone, &intro).unwrap();
    assert_eq!(registry.get("Bar").unwrap().cumulative_index, Some(0));
    assert_eq!(registry.get("Foo").unwrap().cumulative_index, Some(1));

    let table = build_version_tables(&registry);
    assert_eq!(&table.counts()[..3], &[1, 1, 2]);
    let names: Vec<_> = table.metadata().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Bar", "Foo"]);
}

#[test]
fn conflicting_types_fail_the_run_with_type_mismatch() {
    let cfg = config();
    let intro = standalone(&[
        (7, 0, vec![PropertyRecord::new("X", "int")]),
        (8, 0, vec![PropertyRecord::new("X", "string")]),
    ]);

    let err = build_registry(&cfg.namespaces[0].classes[0], DeploymentFamily::Standalone, &intro)
        .unwrap_err();
    assert!(matches!(err, RegistryError::TypeConflict { .. }));

    let mut ctx = BuildContext::new();
    let outputs = generate(&cfg, &intro, &GenerateOptions::default(), &mut ctx).unwrap();
    assert!(outputs.is_empty());
    assert_eq!(ctx.status(), ExitStatus::TypeMismatch);
    assert_eq!(ctx.status().code(), 2);
}

#[test]
fn unmatched_property_fails_with_missing_config() {
    let cfg = config();
    let intro = standalone(&[(
        7,
        0,
        vec![
            PropertyRecord::new("Bar", "Int32"),
            PropertyRecord::new("Ghost", "Int32"),
        ],
    )]);

    let mut ctx = BuildContext::new();
    let outputs = generate(&cfg, &intro, &GenerateOptions::default(), &mut ctx).unwrap();
    assert!(outputs.is_empty());
    assert_eq!(ctx.status(), ExitStatus::MissingConfigProperty);
    let diag = ctx.errors().next().unwrap();
    assert_eq!(diag.code, "PG-E005");
    assert!(diag.message.contains("Ghost"));
}

#[test]
fn fallback_matches_static_configuration() {
    let cfg = config();
    let class = &cfg.namespaces[0].classes[0];
    let intro = standalone(&[(7, 0, vec![])]);

    let registry = build_registry(class, DeploymentFamily::Standalone, &intro).unwrap();
    assert!(registry.is_unversioned());
    let names: Vec<_> = registry.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Bar", "Foo", "X"]);
    assert!(registry.iter().all(|e| e.cumulative_index.is_none()));
    assert!(registry.iter().all(|e| e.epochs.is_all()));
}

#[test]
fn repeated_runs_are_identical() {
    let cfg = config();
    let intro = standalone(&[
        (7, 0, vec![PropertyRecord::new("Foo", "String")]),
        (10, 50, vec![PropertyRecord::new("Bar", "Int32").expensive()]),
        (16, 0, vec![PropertyRecord::new("X", "Int32")]),
    ]);

    let dump = || {
        let mut ctx = BuildContext::new();
        let outputs = generate(&cfg, &intro, &GenerateOptions::default(), &mut ctx).unwrap();
        serde_json::to_string(&outputs).unwrap()
    };
    assert_eq!(dump(), dump());
}

#[test]
fn open_ended_epoch_covers_later_point_builds() {
    let cfg = config();
    let class = &cfg.namespaces[0].classes[0];
    let intro = standalone(&[
        (7, 0, vec![PropertyRecord::new("Bar", "Int32")]),
        (17, 0, vec![PropertyRecord::new("Foo", "String")]),
    ]);
    let registry = build_registry(class, DeploymentFamily::Standalone, &intro).unwrap();
    let table = build_version_tables(&registry);

    assert_eq!(table.visible_count(VersionEpoch::with_patch(16, 0, 4200)), Some(1));
    assert_eq!(table.visible_count(VersionEpoch::with_patch(17, 0, 1)), Some(2));
    assert_eq!(table.visible_count(VersionEpoch::new(18, 0)), None);
}
