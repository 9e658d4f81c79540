pub mod check;
pub mod epochs;
pub mod generate;
pub mod tables;

use propgen_core::{Diagnostic, DiagnosticSeverity};

/// `error[PG-E002]: Namespace.Class (family): message`
pub fn format_diagnostic(d: &Diagnostic) -> String {
    let severity = match d.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    let mut location = d.namespace.clone();
    if let Some(class) = &d.class {
        location.push('.');
        location.push_str(class);
    }
    if let Some(family) = d.family {
        location.push_str(&format!(" ({family})"));
    }
    format!("{severity}[{}]: {location}: {}", d.code, d.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use propgen_core::DeploymentFamily;

    #[test]
    fn diagnostic_location() {
        let d = Diagnostic::error("PG-E002", "Catalog", "type changed")
            .in_class("Table")
            .in_family(DeploymentFamily::CloudWarehouse);
        assert_eq!(
            format_diagnostic(&d),
            "error[PG-E002]: Catalog.Table (cloud-warehouse): type changed"
        );

        let w = Diagnostic::warning("PG-W001", "Catalog", "duplicate class");
        assert_eq!(format_diagnostic(&w), "warning[PG-W001]: Catalog: duplicate class");
    }
}
