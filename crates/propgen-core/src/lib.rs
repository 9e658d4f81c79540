pub mod catalogs;
pub mod config;
pub mod context;
pub mod generate;
pub mod introspect;
pub mod json;
pub mod reference;
pub mod registry;
pub mod tables;
pub mod types;
pub mod validator;
pub mod version;

pub use catalogs::{GENERATOR_VERSION, TABLE_FORMAT_VERSION};
pub use config::{ConfigError, FragmentSet};
pub use context::{BuildContext, ExitStatus};
pub use generate::{
    generate, generate_class, generate_namespace, Accessor, ClassOutput, FamilyOutput,
    GenerateError, GenerateOptions,
};
pub use introspect::{EpochSnapshot, IntrospectError, SchemaIntrospector, SnapshotIntrospector};
pub use json::{check_to_json, tables_to_json, CheckJsonOptions};
pub use reference::{parse_reference, ReferenceBinding, ReferenceError, ReferenceTarget};
pub use registry::{build_registry, PropertyRegistry, RegistryEntry, RegistryError};
pub use tables::{build_version_tables, VersionBucketTable};
pub use types::*;
pub use validator::{validate, validate_parent_references, ParentReferenceError};
pub use version::{DeploymentFamily, EngineEdition, EngineType, EpochMask, VersionEpoch};
