use heck::{ToSnakeCase, ToUpperCamelCase};

use propgen_core::{
    Accessor, ClassOutput, DeploymentFamily, FamilyOutput, FragmentSet, PropertyMode,
    ReferenceBinding, ReferenceTarget, GENERATOR_VERSION,
};

/// Shared types every generated class file refers to. Written once per
/// output directory as `descriptors.rs`.
pub const DESCRIPTORS: &str = r#"#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Standalone,
    Cloud,
    CloudWarehouse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub name: &'static str,
    pub type_name: &'static str,
    pub expensive: bool,
    pub read_only: bool,
}

/// `metadata[..counts[i]]` is what a server at `epochs[i]` exposes.
#[derive(Debug, Clone, Copy)]
pub struct VersionTable {
    pub epochs: &'static [(u16, u16, u16)],
    pub counts: &'static [usize],
    pub metadata: &'static [Metadata],
}

impl VersionTable {
    /// Properties visible on a server reporting `version`, if the version is
    /// on this family's timeline.
    pub fn visible(&self, version: (u16, u16, u16)) -> Option<&'static [Metadata]> {
        let epoch = self.epochs.iter().position(|e| *e >= version)?;
        Some(&self.metadata[..self.counts[epoch]])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTarget {
    Template(&'static str),
    Resolver(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub target_type: &'static str,
    pub target: ReferenceTarget,
    pub keys: &'static [&'static str],
    pub parameters: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    pub type_name: &'static str,
    pub read_only: bool,
    pub families: &'static [Family],
    pub expensive: bool,
    pub read_only_after_creation: bool,
    pub design: bool,
    pub deploy: bool,
    pub dmf_ignore: bool,
    pub key_index: Option<u16>,
    pub references: &'static [Reference],
}
"#;

pub fn header() -> String {
    format!("// @generated by propgen {GENERATOR_VERSION}. Do not edit.")
}

/// File and module name for a class or namespace.
pub fn module_name(name: &str) -> String {
    let snake = name.to_snake_case();
    if snake.is_empty() {
        "unnamed".to_string()
    } else {
        snake
    }
}

fn family_variant(family: DeploymentFamily) -> &'static str {
    match family {
        DeploymentFamily::Standalone => "Family::Standalone",
        DeploymentFamily::Cloud => "Family::Cloud",
        DeploymentFamily::CloudWarehouse => "Family::CloudWarehouse",
    }
}

fn str_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
    format!("&[{}]", quoted.join(", "))
}

fn opt_str(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("Some({v:?})"),
        None => "None".to_string(),
    }
}

/// `mod.rs` body listing child modules.
pub fn render_module_index(children: &[String]) -> String {
    let mut lines = vec![header(), String::new()];
    for child in children {
        lines.push(format!("pub mod {child};"));
    }
    lines.join("\n") + "\n"
}

/// Renders the source file of one class. Fails with the name of the first
/// body fragment that the fragment file does not define.
pub fn render_class(output: &ClassOutput<'_>, fragments: &FragmentSet) -> Result<String, String> {
    let class = output.class;
    let type_name = class.class_name.to_upper_camel_case();
    let accessors = output.accessors();

    let mut lines: Vec<String> = Vec::new();
    lines.push(header());
    lines.push(format!("// Namespace: {}", output.namespace));
    lines.push(String::new());
    lines.push("#[allow(unused_imports)]".to_string());
    lines.push(
        "use super::super::descriptors::{Family, Metadata, Property, Reference, ReferenceTarget, VersionTable};"
            .to_string(),
    );
    lines.push(String::new());
    lines.push(format!("pub struct {type_name};"));
    lines.push(String::new());
    lines.push(format!("impl {type_name} {{"));
    lines.push(format!("    pub const NAME: &'static str = {:?};", class.class_name));
    lines.push(format!(
        "    pub const URN: Option<&'static str> = {};",
        opt_str(class.urn.as_deref())
    ));
    lines.push(format!(
        "    pub const PARENT_TYPE: Option<&'static str> = {};",
        opt_str(class.parent_type.as_deref())
    ));
    lines.push(format!(
        "    pub const POSSIBLE_PARENTS: &'static [&'static str] = {};",
        str_list(&class.possible_parents)
    ));
    lines.push(format!(
        "    pub const COLLECTION_NAME: Option<&'static str> = {};",
        opt_str(class.collection_name.as_deref())
    ));
    let non_alterable: Vec<String> = output.non_alterable().iter().map(|s| s.to_string()).collect();
    lines.push(format!(
        "    pub const NON_ALTERABLE: &'static [&'static str] = {};",
        str_list(&non_alterable)
    ));

    lines.push(String::new());
    lines.push("    pub const PROPERTIES: &'static [Property] = &[".to_string());
    for accessor in accessors.iter().filter(|a| a.entry.generate) {
        render_property(&mut lines, accessor, output.references_of(&accessor.entry.name));
    }
    lines.push("    ];".to_string());

    lines.push(String::new());
    lines.push("    pub fn default_value(name: &str) -> Option<&'static str> {".to_string());
    lines.push("        match name {".to_string());
    for (name, _, value) in output.default_values() {
        lines.push(format!("            {name:?} => Some({value:?}),"));
    }
    lines.push("            _ => None,".to_string());
    lines.push("        }".to_string());
    lines.push("    }".to_string());

    if class.gen_metadata {
        lines.push(String::new());
        lines.push(
            "    pub fn version_table(family: Family) -> &'static VersionTable {".to_string(),
        );
        lines.push("        match family {".to_string());
        for family_output in &output.families {
            let family = family_output.family();
            lines.push(format!(
                "            {} => &{}::TABLE,",
                family_variant(family),
                module_name(family.as_str())
            ));
        }
        lines.push("        }".to_string());
        lines.push("    }".to_string());
    }
    lines.push("}".to_string());

    if class.gen_metadata {
        for family_output in &output.families {
            lines.push(String::new());
            render_family(&mut lines, family_output);
        }
    }

    for name in &class.gen_body {
        let fragment = fragments.get(name).ok_or_else(|| name.clone())?;
        lines.push(String::new());
        lines.extend(fragment.trim_end().lines().map(str::to_string));
    }

    Ok(lines.join("\n") + "\n")
}

fn render_property(
    lines: &mut Vec<String>,
    accessor: &Accessor<'_>,
    references: Option<&[ReferenceBinding]>,
) {
    let entry = accessor.entry;
    let families: Vec<&str> = accessor.families.iter().map(|f| family_variant(*f)).collect();
    let key_index = match entry.key_index {
        Some(i) => format!("Some({i})"),
        None => "None".to_string(),
    };

    lines.push("        Property {".to_string());
    lines.push(format!("            name: {:?},", entry.name));
    lines.push(format!("            type_name: {:?},", entry.type_name));
    lines.push(format!("            read_only: {},", entry.read_only));
    lines.push(format!("            families: &[{}],", families.join(", ")));
    lines.push(format!("            expensive: {},", entry.expensive));
    lines.push(format!(
        "            read_only_after_creation: {},",
        entry.read_only_after_creation
    ));
    let design = entry.mode.contains(PropertyMode::DESIGN);
    let deploy = entry.mode.contains(PropertyMode::DEPLOY);
    lines.push(format!("            design: {design},"));
    lines.push(format!("            deploy: {deploy},"));
    lines.push(format!("            dmf_ignore: {},", entry.dmf_ignore));
    lines.push(format!("            key_index: {key_index},"));
    match references {
        Some(bindings) if !bindings.is_empty() && !entry.suppress_attribute => {
            lines.push("            references: &[".to_string());
            for binding in bindings {
                let target = match &binding.target {
                    ReferenceTarget::Template(t) => format!("ReferenceTarget::Template({t:?})"),
                    ReferenceTarget::Resolver(r) => format!("ReferenceTarget::Resolver({r:?})"),
                };
                lines.push(format!(
                    "                Reference {{ target_type: {:?}, target: {target}, keys: {}, parameters: {} }},",
                    binding.target_type,
                    str_list(&binding.keys),
                    str_list(&binding.parameters)
                ));
            }
            lines.push("            ],".to_string());
        }
        _ => lines.push("            references: &[],".to_string()),
    }
    lines.push("        },".to_string());
}

fn render_family(lines: &mut Vec<String>, output: &FamilyOutput) {
    let family = output.family();
    let table = &output.table;

    lines.push(format!("pub mod {} {{", module_name(family.as_str())));
    lines.push("    use super::*;".to_string());
    lines.push(String::new());
    lines.push("    pub const TABLE: VersionTable = VersionTable {".to_string());
    let epochs: Vec<String> = family
        .epochs()
        .iter()
        .map(|e| format!("({}, {}, {})", e.major, e.minor, e.patch))
        .collect();
    lines.push(format!("        epochs: &[{}],", epochs.join(", ")));
    let counts: Vec<String> = table.counts().iter().map(|c| c.to_string()).collect();
    lines.push(format!("        counts: &[{}],", counts.join(", ")));
    lines.push("        metadata: &[".to_string());
    for meta in table.metadata() {
        lines.push(format!(
            "            Metadata {{ name: {:?}, type_name: {:?}, expensive: {}, read_only: {} }},",
            meta.name, meta.type_name, meta.expensive, meta.read_only
        ));
    }
    lines.push("        ],".to_string());
    lines.push("    };".to_string());
    lines.push(String::new());
    lines.push("    pub fn property_id(name: &str) -> Option<usize> {".to_string());
    lines.push("        match name {".to_string());
    for (name, position) in table.lookup() {
        lines.push(format!("            {name:?} => Some({position}),"));
    }
    lines.push("            _ => None,".to_string());
    lines.push("        }".to_string());
    lines.push("    }".to_string());
    lines.push("}".to_string());
}
