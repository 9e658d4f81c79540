//! JSON reports for tooling that consumes generator output without linking
//! against the crate.
//!
//! Every function returns a `JsonResult` envelope; failures land in `error`
//! instead of being raised.

use serde::{Deserialize, Serialize};

use crate::catalogs::{GENERATOR_VERSION, TABLE_FORMAT_VERSION};
use crate::context::{BuildContext, ExitStatus};
use crate::generate::{generate, ClassOutput, GenerateError, GenerateOptions};
use crate::introspect::SchemaIntrospector;
use crate::types::{Diagnostic, StaticConfig, ValidateOptions};
use crate::validator::validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckJsonOptions {
    #[serde(default)]
    pub strict: bool,
    /// Treat the source as JSON instead of YAML.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct JsonResult<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> JsonResult<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

fn failure(message: String) -> String {
    let result = JsonResult::<()> {
        success: false,
        data: None,
        error: Some(message),
    };
    serde_json::to_string(&result).unwrap_or_else(|_| r#"{"success":false}"#.to_string())
}

fn render<T: Serialize>(data: T) -> String {
    serde_json::to_string_pretty(&JsonResult::ok(data))
        .unwrap_or_else(|e| failure(format!("JSON serialization error: {e}")))
}

/// Dump of registries and tables for a run.
#[derive(Debug, Serialize)]
pub struct TablesReport<'a> {
    pub generator_version: &'static str,
    pub format_version: &'static str,
    pub exit_code: i32,
    pub classes: Vec<ClassOutput<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Validates a configuration document and returns the diagnostics as JSON.
pub fn check_to_json(source: &str, options: &CheckJsonOptions) -> String {
    let parsed = if options.json {
        StaticConfig::from_json_str(source)
    } else {
        StaticConfig::from_yaml_str(source)
    };
    let config = match parsed {
        Ok(config) => config,
        Err(e) => return failure(e.to_string()),
    };
    let result = validate(
        &config,
        &ValidateOptions {
            strict: options.strict,
        },
    );
    render(result)
}

/// Runs generation without writing anything and returns every registry and
/// version table as JSON.
pub fn tables_to_json(
    config: &StaticConfig,
    introspector: &dyn SchemaIntrospector,
    options: &GenerateOptions,
) -> (String, BuildContext) {
    let mut ctx = BuildContext::new();
    let classes = match generate(config, introspector, options, &mut ctx) {
        Ok(classes) => classes,
        Err(e) => {
            let GenerateError::Introspection { class, family, .. } = &e;
            let namespace = config
                .namespaces
                .iter()
                .find(|ns| ns.class(class).is_some())
                .map(|ns| ns.name.as_str())
                .unwrap_or_default();
            ctx.record(
                Diagnostic::error("PG-E001", namespace, e.to_string())
                    .in_class(class)
                    .in_family(*family),
                ExitStatus::Failure,
            );
            return (failure(e.to_string()), ctx);
        }
    };
    let report = TablesReport {
        generator_version: GENERATOR_VERSION,
        format_version: TABLE_FORMAT_VERSION,
        exit_code: ctx.status().code(),
        classes,
        diagnostics: ctx.diagnostics().to_vec(),
    };
    let json = render(report);
    (json, ctx)
}
