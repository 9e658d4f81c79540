//! Reference wiring: links from a property to the object it names.
//!
//! A property may reference several targets. Each of the four attributes is
//! a `;`-separated list and the n-th segments of all lists describe the n-th
//! reference. Templates and types drop empty segments; keys and parameters
//! keep them, since an empty slot is how one reference opts out of keys.

use serde::Serialize;
use thiserror::Error;

use crate::types::ReferenceWiring;

const RESOLVER_PREFIX: &str = "resolver:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error(
        "reference lists do not line up: {templates} templates, {types} types, \
         {keys} keys, {parameters} parameter sets"
    )]
    ArityMismatch {
        templates: usize,
        types: usize,
        keys: String,
        parameters: String,
    },
    #[error("reference_keys for template {segment} names no keys")]
    EmptyKeys { segment: usize },
    #[error("reference_template_parameters for template {segment} names no parameters")]
    MissingParameters { segment: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ReferenceTarget {
    /// Path template with positional placeholders.
    Template(String),
    /// Name of a custom resolver type.
    Resolver(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceBinding {
    pub target_type: String,
    pub target: ReferenceTarget,
    /// Present only for multi-key references.
    pub keys: Vec<String>,
    pub parameters: Vec<String>,
}

fn split_dense(list: &str) -> Vec<&str> {
    list.split(';').filter(|s| !s.is_empty()).collect()
}

fn split_sparse(list: Option<&str>) -> Option<Vec<&str>> {
    list.filter(|s| !s.is_empty())
        .map(|s| s.split(';').collect())
}

fn split_commas(segment: &str) -> Vec<String> {
    segment
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses the wiring of one property. A property without a template has no
/// bindings.
pub fn parse_reference(wiring: &ReferenceWiring) -> Result<Vec<ReferenceBinding>, ReferenceError> {
    let Some(templates) = wiring.reference_template.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(Vec::new());
    };
    let templates = split_dense(templates);
    let types = split_dense(wiring.reference_type.as_deref().unwrap_or_default());
    let keys = split_sparse(wiring.reference_keys.as_deref());
    let parameters = split_sparse(wiring.reference_template_parameters.as_deref());

    let n = templates.len();
    let lines_up = |list: &Option<Vec<&str>>| list.as_ref().map_or(true, |l| l.len() == n);
    if types.len() != n || !lines_up(&keys) || !lines_up(&parameters) {
        let count = |list: &Option<Vec<&str>>| {
            list.as_ref()
                .map_or_else(|| "no".to_string(), |l| l.len().to_string())
        };
        return Err(ReferenceError::ArityMismatch {
            templates: n,
            types: types.len(),
            keys: count(&keys),
            parameters: count(&parameters),
        });
    }

    let mut bindings = Vec::with_capacity(n);
    for (segment, (template, target_type)) in templates.iter().zip(&types).enumerate() {
        let segment_keys = match keys.as_ref().map(|k| k[segment]) {
            Some(raw) if !raw.is_empty() => {
                let parsed = split_commas(raw);
                if parsed.is_empty() {
                    return Err(ReferenceError::EmptyKeys { segment });
                }
                parsed
            }
            _ => Vec::new(),
        };

        let segment_parameters = parameters
            .as_ref()
            .map(|p| split_commas(p[segment]))
            .unwrap_or_default();

        let target = match template.strip_prefix(RESOLVER_PREFIX) {
            Some(resolver) => ReferenceTarget::Resolver(resolver.to_string()),
            None => {
                if segment_parameters.is_empty() {
                    return Err(ReferenceError::MissingParameters { segment });
                }
                ReferenceTarget::Template(template.to_string())
            }
        };

        bindings.push(ReferenceBinding {
            target_type: target_type.to_string(),
            target,
            keys: segment_keys,
            parameters: segment_parameters,
        });
    }
    Ok(bindings)
}
