use std::path::Path;

use propgen_core::{tables_to_json, ExitStatus, GenerateOptions};

use crate::error::CliError;
use crate::reader::{read_config, read_snapshots};

/// Dumps registries and version tables as JSON without writing sources.
pub fn run_tables(
    endpoint: &Path,
    config_path: &Path,
    class: Option<String>,
) -> Result<(String, ExitStatus), CliError> {
    let introspector = read_snapshots(endpoint)?;
    let config = read_config(config_path)?;
    let options = GenerateOptions { only_class: class };
    let (json, ctx) = tables_to_json(&config, &introspector, &options);
    Ok((json, ctx.status()))
}
