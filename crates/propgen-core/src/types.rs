use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::version::DeploymentFamily;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Introspection records
// ---------------------------------------------------------------------------

/// One property as reported by the live schema for a class at one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Whether the property is part of the request being generated for.
    /// Records that are not are dropped before merging.
    #[serde(default = "default_true")]
    pub request: bool,
    #[serde(default)]
    pub expensive: bool,
    #[serde(default)]
    pub read_only: bool,
}

impl PropertyRecord {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            request: true,
            expensive: false,
            read_only: false,
        }
    }

    pub fn expensive(mut self) -> Self {
        self.expensive = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn not_requested(mut self) -> Self {
        self.request = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Property modes
// ---------------------------------------------------------------------------

bitflags! {
    /// Lifecycle modes a property participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PropertyMode: u8 {
        /// Offline object design.
        const DESIGN = 0b0000_0001;
        /// Deployment to a live engine.
        const DEPLOY = 0b0000_0010;
        const ALL = Self::DESIGN.bits() | Self::DEPLOY.bits();
    }
}

impl PropertyMode {
    /// Reads a declared mode tag by case-insensitive substring match, so
    /// `design|deploy` and `DesignOnly` both work. A tag naming neither mode
    /// (or no tag) means every mode.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag.map(str::to_ascii_lowercase) else {
            return PropertyMode::ALL;
        };
        if tag.contains("all") {
            return PropertyMode::ALL;
        }
        let mut mode = PropertyMode::empty();
        if tag.contains("design") {
            mode |= PropertyMode::DESIGN;
        }
        if tag.contains("deploy") {
            mode |= PropertyMode::DEPLOY;
        }
        if mode.is_empty() {
            PropertyMode::ALL
        } else {
            mode
        }
    }
}

impl Default for PropertyMode {
    fn default() -> Self {
        PropertyMode::ALL
    }
}

// ---------------------------------------------------------------------------
// Static configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub namespaces: Vec<NamespaceDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub class_name: String,
    /// Identifier used to query introspection. Classes without one always
    /// take the unversioned path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(default)]
    pub possible_parents: Vec<String>,
    #[serde(default)]
    pub has_schema: bool,
    #[serde(default = "default_true")]
    pub has_constructors: bool,
    #[serde(default = "default_true")]
    pub gen_metadata: bool,
    /// Drop `Name` from the class's registry and tables.
    #[serde(default)]
    pub remove_name: bool,
    /// Names of verbatim body fragments appended to the generated class.
    #[serde(default)]
    pub gen_body: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Child collections exposed by the class (projection only).
    #[serde(default)]
    pub collections: Vec<CollectionDecl>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDecl {
    pub name: String,
    pub element_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Only consulted on the unversioned path; introspection reports its own.
    #[serde(default = "default_true")]
    pub read_only: bool,
    #[serde(default)]
    pub expensive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_index: Option<u16>,
    #[serde(default, deserialize_with = "crate::config::deserialize_mode")]
    pub mode: PropertyMode,
    #[serde(default = "default_true")]
    pub generate: bool,
    #[serde(default = "default_true")]
    pub is_intrinsic: bool,
    #[serde(default)]
    pub dmf_ignore: bool,
    #[serde(default)]
    pub read_only_after_creation: bool,
    #[serde(default)]
    pub suppress_attribute: bool,
    #[serde(flatten)]
    pub reference: ReferenceWiring,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            read_only: true,
            expensive: false,
            default: None,
            key_index: None,
            mode: PropertyMode::ALL,
            generate: true,
            is_intrinsic: true,
            dmf_ignore: false,
            read_only_after_creation: false,
            suppress_attribute: false,
            reference: ReferenceWiring::default(),
        }
    }
}

/// Raw, unparsed reference attributes of a property. Every field is a
/// `;`-separated list; see [`crate::reference`] for how they pair up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceWiring {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_template_parameters: Option<String>,
}

impl ReferenceWiring {
    /// A property is reference-wired when it names at least one template.
    pub fn is_declared(&self) -> bool {
        self.reference_template
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Generated metadata
// ---------------------------------------------------------------------------

/// Per-property tuple emitted into the static metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub expensive: bool,
    pub read_only: bool,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<DeploymentFamily>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &str, namespace: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: DiagnosticSeverity::Error,
            namespace: namespace.to_string(),
            class: None,
            family: None,
            message: message.into(),
        }
    }

    pub fn warning(code: &str, namespace: &str, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(code, namespace, message)
        }
    }

    pub fn in_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn in_family(mut self, family: DeploymentFamily) -> Self {
        self.family = Some(family);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Promote warnings that would break generation into errors.
    pub strict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateResult {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}
