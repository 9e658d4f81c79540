//! Object-model projection: one trait per constructible class, exposing its
//! intrinsic standalone properties and child collections.

use std::collections::HashSet;

use heck::{ToSnakeCase, ToUpperCamelCase};

use propgen_core::{catalogs::is_structurally_implicit, ClassOutput, DeploymentFamily};

use crate::emit::{header, module_name};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "super", "trait", "true", "try", "type",
    "unsafe", "use", "where", "while", "yield",
];

fn ident(name: &str) -> String {
    let snake = name.to_snake_case();
    if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else {
        snake
    }
}

/// Engine type name to the Rust type used in model signatures. Unknown
/// names pass through as user-supplied types.
fn rust_type(type_name: &str) -> String {
    let mapped = match type_name {
        "String" | "System.String" | "" => "String",
        "Boolean" | "System.Boolean" => "bool",
        "Byte" | "System.Byte" => "u8",
        "Int16" | "System.Int16" => "i16",
        "Int32" | "System.Int32" => "i32",
        "Int64" | "System.Int64" => "i64",
        "Single" | "System.Single" => "f32",
        "Double" | "System.Double" => "f64",
        other => return other.rsplit('.').next().unwrap_or(other).to_upper_camel_case(),
    };
    mapped.to_string()
}

pub fn trait_name(class_name: &str) -> String {
    format!("{}Model", class_name.to_upper_camel_case())
}

/// Renders the model trait of a class, or `None` when the class is not
/// projected. `skipped` holds class names whose collections are dropped
/// because their element type has no model.
pub fn render_model(output: &ClassOutput<'_>, skipped: &HashSet<&str>) -> Option<String> {
    let class = output.class;
    if !class.is_projectable() {
        return None;
    }
    let registry = &output.family(DeploymentFamily::Standalone)?.registry;
    let name = trait_name(&class.class_name);

    let collections: Vec<_> = class
        .collections
        .iter()
        .filter(|c| !skipped.contains(c.element_type.as_str()))
        .collect();

    let mut lines: Vec<String> = Vec::new();
    lines.push(header());
    lines.push(String::new());
    let mut uses: Vec<String> = collections
        .iter()
        .filter(|c| c.element_type != class.class_name)
        .map(|c| {
            format!(
                "use super::{}::{};",
                module_name(&c.element_type),
                trait_name(&c.element_type)
            )
        })
        .collect();
    uses.sort();
    uses.dedup();
    if !uses.is_empty() {
        lines.extend(uses);
        lines.push(String::new());
    }
    lines.push(format!("/// Model of `{}`.", class.class_name));
    lines.push(format!("pub trait {name} {{"));

    match registry.get("Name") {
        Some(entry) if !entry.read_only => {
            lines.push("    fn name(&self) -> String;".to_string());
            lines.push("    fn set_name(&mut self, value: String);".to_string());
        }
        _ => lines.push("    fn name(&self) -> String;".to_string()),
    }
    if class.has_schema {
        lines.push("    fn schema(&self) -> String;".to_string());
        lines.push("    fn set_schema(&mut self, value: String);".to_string());
    }

    for entry in registry.iter() {
        if !entry.is_intrinsic || is_structurally_implicit(&entry.name) {
            continue;
        }
        let ty = rust_type(&entry.type_name);
        lines.push(format!("    fn {}(&self) -> {ty};", ident(&entry.name)));
        if !entry.read_only {
            lines.push(format!(
                "    fn set_{}(&mut self, value: {ty});",
                entry.name.to_snake_case()
            ));
        }
    }

    for collection in collections {
        lines.push(format!(
            "    fn {}(&self) -> Vec<&dyn {}>;",
            ident(&collection.name),
            trait_name(&collection.element_type)
        ));
    }
    lines.push("}".to_string());

    Some(lines.join("\n") + "\n")
}
