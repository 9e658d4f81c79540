use std::collections::HashSet;

use thiserror::Error;

use crate::reference::parse_reference;
use crate::types::{Diagnostic, NamespaceDecl, StaticConfig, ValidateOptions, ValidateResult};

/// A possible-parent name that is not a class of its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("class {class} lists {parent} as a possible parent, but {namespace} declares no such class")]
pub struct ParentReferenceError {
    pub namespace: String,
    pub class: String,
    pub parent: String,
}

impl ParentReferenceError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error("PG-E007", &self.namespace, self.to_string()).in_class(&self.class)
    }
}

/// Checks every possible-parent name against the namespace's class names.
/// Matching is exact and case-sensitive. Errors come back in declaration
/// order.
pub fn validate_parent_references(namespace: &NamespaceDecl) -> Vec<ParentReferenceError> {
    let known = namespace.class_names();
    let mut errors = Vec::new();
    for class in &namespace.classes {
        for parent in &class.possible_parents {
            if !known.contains(parent.as_str()) {
                errors.push(ParentReferenceError {
                    namespace: namespace.name.clone(),
                    class: class.class_name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }
    errors
}

/// Whole-configuration checks, run without introspection.
pub fn validate(config: &StaticConfig, options: &ValidateOptions) -> ValidateResult {
    let mut errors: Vec<Diagnostic> = Vec::new();
    let mut warnings: Vec<Diagnostic> = Vec::new();

    for namespace in &config.namespaces {
        let ns = namespace.name.as_str();

        errors.extend(
            validate_parent_references(namespace)
                .iter()
                .map(ParentReferenceError::to_diagnostic),
        );

        // PG-W001: duplicate class names
        let mut seen_classes = HashSet::new();
        for class in &namespace.classes {
            if !seen_classes.insert(class.class_name.as_str()) {
                warnings.push(
                    Diagnostic::warning(
                        "PG-W001",
                        ns,
                        format!(
                            "class {} is declared more than once; only the first is used for lookups",
                            class.class_name
                        ),
                    )
                    .in_class(&class.class_name),
                );
            }
        }

        for class in &namespace.classes {
            let mut seen_props = HashSet::new();
            for prop in &class.properties {
                // PG-W002: duplicate property declarations
                if !seen_props.insert(prop.name.as_str()) {
                    warnings.push(
                        Diagnostic::warning(
                            "PG-W002",
                            ns,
                            format!(
                                "property {} is declared more than once; the first declaration wins",
                                prop.name
                            ),
                        )
                        .in_class(&class.class_name),
                    );
                }

                // PG-W003: untyped property on a class that can only use static config
                if class.urn.is_none() && prop.type_name.is_none() {
                    warnings.push(
                        Diagnostic::warning(
                            "PG-W003",
                            ns,
                            format!(
                                "property {} has no type and {} has no urn to introspect it from",
                                prop.name, class.class_name
                            ),
                        )
                        .in_class(&class.class_name),
                    );
                }

                if let Err(err) = parse_reference(&prop.reference) {
                    let message = format!("property {}: {}", prop.name, err);
                    if options.strict {
                        errors.push(
                            Diagnostic::error("PG-E004", ns, message).in_class(&class.class_name),
                        );
                    } else {
                        warnings.push(
                            Diagnostic::warning("PG-E004", ns, message).in_class(&class.class_name),
                        );
                    }
                }
            }
        }
    }

    ValidateResult { errors, warnings }
}
