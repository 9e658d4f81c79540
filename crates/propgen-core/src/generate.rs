use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::context::{BuildContext, ExitStatus};
use crate::introspect::{IntrospectError, SchemaIntrospector};
use crate::reference::{parse_reference, ReferenceBinding};
use crate::registry::{build_registry, PropertyRegistry, RegistryEntry, RegistryError};
use crate::tables::{build_version_tables, VersionBucketTable};
use crate::types::{ClassDecl, Diagnostic, NamespaceDecl, StaticConfig};
use crate::validator::validate_parent_references;
use crate::version::DeploymentFamily;

/// Failures that end the whole run rather than one class.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("introspection failed for {class} on {family}: {source}")]
    Introspection {
        class: String,
        family: DeploymentFamily,
        #[source]
        source: IntrospectError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Restrict the run to one class name. Namespace validation still covers
    /// every class.
    pub only_class: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyOutput {
    pub registry: PropertyRegistry,
    pub table: VersionBucketTable,
}

impl FamilyOutput {
    pub fn family(&self) -> DeploymentFamily {
        self.registry.family()
    }
}

/// Everything produced for one class: one registry and table per family,
/// plus the parsed reference bindings of its emitted properties.
#[derive(Debug, Clone, Serialize)]
pub struct ClassOutput<'a> {
    pub namespace: &'a str,
    #[serde(skip)]
    pub class: &'a ClassDecl,
    pub class_name: &'a str,
    pub families: Vec<FamilyOutput>,
    pub references: BTreeMap<String, Vec<ReferenceBinding>>,
}

/// One accessor of the generated class. The entry comes from the first
/// family (in [`DeploymentFamily::ALL`] order) that has the property.
#[derive(Debug, Clone)]
pub struct Accessor<'o> {
    pub entry: &'o RegistryEntry,
    pub families: Vec<DeploymentFamily>,
}

impl Accessor<'_> {
    pub fn exposed_in(&self, family: DeploymentFamily) -> bool {
        self.families.contains(&family)
    }
}

impl<'a> ClassOutput<'a> {
    pub fn family(&self, family: DeploymentFamily) -> Option<&FamilyOutput> {
        self.families.iter().find(|f| f.family() == family)
    }

    /// Properties emitted once per class, Standalone first, then Cloud,
    /// then Cloud-Warehouse; name order within each family.
    pub fn accessors(&self) -> Vec<Accessor<'_>> {
        let mut seen = HashSet::new();
        let mut plan = Vec::new();
        for output in &self.families {
            for entry in output.registry.iter() {
                if !seen.insert(entry.name.as_str()) {
                    continue;
                }
                let families = self
                    .families
                    .iter()
                    .filter(|f| f.registry.contains(&entry.name))
                    .map(FamilyOutput::family)
                    .collect();
                plan.push(Accessor { entry, families });
            }
        }
        plan
    }

    /// Properties that cannot change once the object exists, generated or not.
    pub fn non_alterable(&self) -> Vec<&str> {
        self.accessors()
            .into_iter()
            .filter(|a| a.entry.read_only_after_creation)
            .map(|a| a.entry.name.as_str())
            .collect()
    }

    /// `(name, type, default)` for every property with a declared default.
    pub fn default_values(&self) -> Vec<(&str, &str, &str)> {
        self.accessors()
            .into_iter()
            .filter_map(|a| {
                a.entry.default_value.as_deref().map(|value| {
                    (a.entry.name.as_str(), a.entry.type_name.as_str(), value)
                })
            })
            .collect()
    }

    pub fn references_of(&self, property: &str) -> Option<&[ReferenceBinding]> {
        self.references.get(property).map(Vec::as_slice)
    }
}

fn registry_diagnostic(
    namespace: &str,
    class: &str,
    family: DeploymentFamily,
    err: &RegistryError,
) -> Diagnostic {
    Diagnostic::error(err.code(), namespace, err.to_string())
        .in_class(class)
        .in_family(family)
}

/// Builds every family's registry and table for one class.
///
/// Returns `Ok(None)` when any family failed; the failures are in `ctx` and
/// the class produces no output at all.
pub fn generate_class<'a>(
    namespace: &'a str,
    class: &'a ClassDecl,
    introspector: &dyn SchemaIntrospector,
    ctx: &mut BuildContext,
) -> Result<Option<ClassOutput<'a>>, GenerateError> {
    let mut families = Vec::with_capacity(DeploymentFamily::ALL.len());
    let mut failed = false;

    for family in DeploymentFamily::ALL {
        match build_registry(class, family, introspector) {
            Ok(registry) => {
                let table = build_version_tables(&registry);
                families.push(FamilyOutput { registry, table });
            }
            Err(RegistryError::Introspection(source)) => {
                return Err(GenerateError::Introspection {
                    class: class.class_name.clone(),
                    family,
                    source,
                });
            }
            Err(err) => {
                ctx.fail(
                    registry_diagnostic(namespace, &class.class_name, family, &err),
                    err.exit_status(),
                );
                failed = true;
            }
        }
    }
    if failed {
        return Ok(None);
    }

    let mut output = ClassOutput {
        namespace,
        class,
        class_name: &class.class_name,
        families,
        references: BTreeMap::new(),
    };

    let mut references = BTreeMap::new();
    for accessor in output.accessors() {
        let entry = accessor.entry;
        let Some(wiring) = entry.reference.as_ref() else {
            continue;
        };
        if !entry.generate || entry.suppress_attribute {
            continue;
        }
        match parse_reference(wiring) {
            Ok(bindings) => {
                references.insert(entry.name.clone(), bindings);
            }
            Err(err) => ctx.fail(
                Diagnostic::error(
                    "PG-E004",
                    namespace,
                    format!("property {}: {}", entry.name, err),
                )
                .in_class(&class.class_name),
                ExitStatus::ReferenceWiring,
            ),
        }
    }
    output.references = references;

    info!(
        namespace,
        class = %class.class_name,
        properties = output.accessors().len(),
        "class generated"
    );
    Ok(Some(output))
}

/// Validates a namespace's parent references, then generates its classes.
pub fn generate_namespace<'a>(
    namespace: &'a NamespaceDecl,
    introspector: &dyn SchemaIntrospector,
    options: &GenerateOptions,
    ctx: &mut BuildContext,
) -> Result<Vec<ClassOutput<'a>>, GenerateError> {
    for err in validate_parent_references(namespace) {
        warn!(namespace = %namespace.name, class = %err.class, "{err}");
        ctx.record(err.to_diagnostic(), ExitStatus::InvalidParentReference);
    }

    let mut outputs = Vec::new();
    for class in &namespace.classes {
        if options
            .only_class
            .as_deref()
            .is_some_and(|only| only != class.class_name)
        {
            continue;
        }
        if let Some(output) = generate_class(&namespace.name, class, introspector, ctx)? {
            outputs.push(output);
        }
    }
    Ok(outputs)
}

/// Runs every namespace of `config` in declaration order.
pub fn generate<'a>(
    config: &'a StaticConfig,
    introspector: &dyn SchemaIntrospector,
    options: &GenerateOptions,
    ctx: &mut BuildContext,
) -> Result<Vec<ClassOutput<'a>>, GenerateError> {
    let mut outputs = Vec::new();
    for namespace in &config.namespaces {
        outputs.extend(generate_namespace(namespace, introspector, options, ctx)?);
    }
    Ok(outputs)
}
