use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use propgen_core::{
    generate, BuildContext, ClassOutput, Diagnostic, ExitStatus, FragmentSet, GenerateOptions,
};
use tracing::info;

use crate::commands::format_diagnostic;
use crate::emit::{header, module_name, render_class, render_module_index, DESCRIPTORS};
use crate::error::CliError;
use crate::model::render_model;
use crate::reader::{read_config, read_fragments, read_snapshots};

pub struct GenerateArgs<'a> {
    pub endpoint: &'a Path,
    pub config: &'a Path,
    pub fragments: &'a Path,
    pub output_dir: &'a Path,
    pub class: Option<String>,
}

fn write(path: &Path, content: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CliError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Module names of the `.rs` files in `dir`, other than `mod.rs`.
fn child_modules(dir: &Path) -> Result<Vec<String>, CliError> {
    let pattern = dir.join("*");
    let pattern_str = pattern.to_string_lossy().replace('\\', "/");
    let entries = glob::glob(&pattern_str).map_err(|e| CliError::Glob(e.to_string()))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CliError::Glob(e.to_string()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let is_module = if path.is_dir() {
            path.join("mod.rs").exists()
        } else {
            path.extension().is_some_and(|e| e == "rs") && stem != "mod"
        };
        if is_module && !names.contains(&stem) {
            names.push(stem);
        }
    }
    names.sort();
    Ok(names)
}

fn write_class(
    output_dir: &Path,
    output: &ClassOutput<'_>,
    fragments: &FragmentSet,
    skipped: &HashSet<&str>,
    ctx: &mut BuildContext,
) -> Result<Vec<PathBuf>, CliError> {
    let ns_dir = module_name(output.namespace);
    let file = format!("{}.rs", module_name(output.class_name));

    let source = match render_class(output, fragments) {
        Ok(source) => source,
        Err(fragment) => {
            ctx.fail(
                Diagnostic::error(
                    "PG-E003",
                    output.namespace,
                    format!("body fragment {fragment} is not defined"),
                )
                .in_class(output.class_name),
                ExitStatus::GenerationFailed,
            );
            return Ok(Vec::new());
        }
    };

    let mut written = Vec::new();
    let class_path = output_dir.join(&ns_dir).join(&file);
    write(&class_path, &source)?;
    written.push(class_path);

    if let Some(model) = render_model(output, skipped) {
        let model_path = output_dir.join("model").join(&ns_dir).join(&file);
        write(&model_path, &model)?;
        written.push(model_path);
    }
    Ok(written)
}

fn write_indices(output_dir: &Path, namespaces: &[String]) -> Result<(), CliError> {
    write(&output_dir.join("descriptors.rs"), &format!("{}\n\n{DESCRIPTORS}", header()))?;

    for root in [output_dir.to_path_buf(), output_dir.join("model")] {
        for ns in namespaces {
            let dir = root.join(ns);
            if dir.is_dir() {
                write(&dir.join("mod.rs"), &render_module_index(&child_modules(&dir)?))?;
            }
        }
    }
    if output_dir.join("model").is_dir() {
        write(
            &output_dir.join("model").join("mod.rs"),
            &render_module_index(&child_modules(&output_dir.join("model"))?),
        )?;
    }
    write(&output_dir.join("mod.rs"), &render_module_index(&child_modules(output_dir)?))
}

/// Generates class sources under `output_dir`. Returns the summary text and
/// the run's exit status.
pub fn run_generate(args: GenerateArgs<'_>) -> Result<(String, ExitStatus), CliError> {
    if args.output_dir.exists() && !args.output_dir.is_dir() {
        return Err(CliError::Usage(format!(
            "output path is not a directory: {}",
            args.output_dir.display()
        )));
    }

    let introspector = read_snapshots(args.endpoint)?;
    let config = read_config(args.config)?;
    let fragments = read_fragments(args.fragments)?;

    let options = GenerateOptions {
        only_class: args.class,
    };
    let mut ctx = BuildContext::new();
    let outputs = generate(&config, &introspector, &options, &mut ctx)?;

    let skipped: HashSet<&str> = config
        .namespaces
        .iter()
        .flat_map(|ns| ns.classes.iter())
        .filter(|c| !c.is_projectable())
        .map(|c| c.class_name.as_str())
        .collect();

    let mut files = 0;
    for output in &outputs {
        let written = write_class(args.output_dir, output, &fragments, &skipped, &mut ctx);
        match written {
            Ok(paths) => {
                files += paths.len();
                for path in paths {
                    info!(path = %path.display(), "written");
                }
            }
            Err(CliError::Write { path, source }) => ctx.fail(
                Diagnostic::error(
                    "PG-E003",
                    output.namespace,
                    format!("failed to write {}: {source}", path.display()),
                )
                .in_class(output.class_name),
                ExitStatus::GenerationFailed,
            ),
            Err(other) => return Err(other),
        }
    }

    let namespaces: Vec<String> = config
        .namespaces
        .iter()
        .map(|ns| module_name(&ns.name))
        .collect();
    write_indices(args.output_dir, &namespaces)?;

    let mut lines: Vec<String> = ctx.diagnostics().iter().map(format_diagnostic).collect();
    let errors = ctx.error_count();
    let class_word = if outputs.len() == 1 { "class" } else { "classes" };
    let file_word = if files == 1 { "file" } else { "files" };
    let error_word = if errors == 1 { "error" } else { "errors" };
    lines.push(format!(
        "Generated {} {class_word} ({files} {file_word}) into {}, {errors} {error_word}.",
        outputs.len(),
        args.output_dir.display()
    ));
    Ok((lines.join("\n"), ctx.status()))
}
