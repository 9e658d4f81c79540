use std::path::Path;

use propgen_core::{validate, ValidateOptions};

use crate::commands::format_diagnostic;
use crate::error::CliError;
use crate::reader::read_config;

/// Validates a configuration file. Returns the report and its error count.
pub fn run_check(
    config_path: &Path,
    strict: bool,
    format: &str,
) -> Result<(String, usize), CliError> {
    let config = read_config(config_path)?;
    let result = validate(&config, &ValidateOptions { strict });

    let error_count = result.errors.len();
    let warning_count = result.warnings.len();
    let class_count = config.class_count();

    if format == "json" {
        let diagnostics: Vec<_> = result.errors.iter().chain(result.warnings.iter()).collect();
        let output = serde_json::json!({
            "diagnostics": diagnostics,
            "summary": {
                "errors": error_count,
                "warnings": warning_count,
                "namespaces": config.namespaces.len(),
                "classes": class_count,
            }
        });
        return Ok((serde_json::to_string_pretty(&output)?, error_count));
    }

    let mut lines: Vec<String> = result
        .errors
        .iter()
        .chain(result.warnings.iter())
        .map(format_diagnostic)
        .collect();

    let error_word = if error_count == 1 { "error" } else { "errors" };
    let warning_word = if warning_count == 1 {
        "warning"
    } else {
        "warnings"
    };
    let class_word = if class_count == 1 { "class" } else { "classes" };
    lines.push(format!(
        "{error_count} {error_word}, {warning_count} {warning_word} in {class_count} {class_word}."
    ));

    Ok((lines.join("\n"), error_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const CONFIG: &str = r#"
namespaces:
  - name: Catalog
    classes:
      - class_name: Server
      - class_name: Login
        possible_parents: [Server, Sever]
"#;

    #[test]
    fn human_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, CONFIG).unwrap();

        let (output, errors) = run_check(&path, false, "human").unwrap();
        assert_eq!(errors, 1);
        assert!(output.contains("error[PG-E007]: Catalog.Login:"));
        assert!(output.ends_with("1 error, 0 warnings in 2 classes."));
    }

    #[test]
    fn json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, CONFIG).unwrap();

        let (output, _) = run_check(&path, false, "json").unwrap();
        let v: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(v["summary"]["errors"], 1);
        assert_eq!(v["summary"]["classes"], 2);
        assert_eq!(v["diagnostics"][0]["code"], "PG-E007");
    }
}
