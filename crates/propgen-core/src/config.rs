use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::types::{ClassDecl, NamespaceDecl, PropertyDecl, PropertyMode, StaticConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepts the mode either as a tag string or absent/null.
pub(crate) fn deserialize_mode<'de, D>(deserializer: D) -> Result<PropertyMode, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = Option::<String>::deserialize(deserializer)?;
    Ok(PropertyMode::from_tag(tag.as_deref()))
}

impl StaticConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Concatenates namespaces from several documents, in order.
    pub fn merge(configs: impl IntoIterator<Item = StaticConfig>) -> Self {
        let namespaces = configs
            .into_iter()
            .flat_map(|config| config.namespaces)
            .collect();
        StaticConfig { namespaces }
    }

    pub fn namespace(&self, name: &str) -> Option<&NamespaceDecl> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    pub fn class_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.classes.len()).sum()
    }
}

impl NamespaceDecl {
    pub fn class(&self, class_name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    pub fn class_names(&self) -> BTreeSet<&str> {
        self.classes.iter().map(|c| c.class_name.as_str()).collect()
    }
}

impl ClassDecl {
    /// First declaration with this exact name. Later duplicates are ignored.
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Classes without a public constructor or a parent type are not
    /// projected into the object model.
    pub fn is_projectable(&self) -> bool {
        self.has_constructors && self.parent_type.is_some()
    }
}

/// Named verbatim code fragments referenced from `gen_body`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSet {
    #[serde(default)]
    pub fragments: BTreeMap<String, String>,
}

impl FragmentSet {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fragments.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
