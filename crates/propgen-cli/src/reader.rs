use std::fs;
use std::path::{Path, PathBuf};

use propgen_core::{
    DeploymentFamily, EpochSnapshot, FragmentSet, SnapshotIntrospector, StaticConfig, VersionEpoch,
};
use tracing::{debug, warn};

use crate::error::CliError;

fn read(path: &Path) -> Result<String, CliError> {
    if !path.exists() {
        return Err(CliError::PathNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the static configuration. `.json` files are JSON, anything else YAML.
pub fn read_config(path: &Path) -> Result<StaticConfig, CliError> {
    let content = read(path)?;
    let parsed = if path.extension().is_some_and(|e| e == "json") {
        StaticConfig::from_json_str(&content)
    } else {
        StaticConfig::from_yaml_str(&content)
    };
    parsed.map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_fragments(path: &Path) -> Result<FragmentSet, CliError> {
    let content = read(path)?;
    FragmentSet::from_yaml_str(&content).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `<endpoint>/<family>/<major.minor>.yaml` snapshots.
///
/// Directories that are not a family name are ignored; a version file that
/// is not on its family's timeline is skipped with a warning.
pub fn read_snapshots(endpoint: &Path) -> Result<SnapshotIntrospector, CliError> {
    if !endpoint.is_dir() {
        return Err(CliError::PathNotFound(endpoint.to_path_buf()));
    }

    let pattern = endpoint.join("*/*.yaml");
    let pattern_str = pattern.to_string_lossy().replace('\\', "/");
    let entries = glob::glob(&pattern_str).map_err(|e| CliError::Glob(e.to_string()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => return Err(CliError::Glob(e.to_string())),
        }
    }
    paths.sort();

    let mut introspector = SnapshotIntrospector::new();
    for path in paths {
        let family_dir = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let Ok(family) = family_dir.parse::<DeploymentFamily>() else {
            debug!(path = %path.display(), "not a family directory, ignored");
            continue;
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let epoch = stem.parse::<VersionEpoch>().map_err(|e| CliError::Snapshot {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let snapshot = EpochSnapshot::from_yaml_str(&read(&path)?).map_err(|source| {
            CliError::Config {
                path: path.clone(),
                source,
            }
        })?;

        match introspector.insert(family, epoch, snapshot) {
            Some(index) => debug!(%family, %epoch, index, "snapshot loaded"),
            None => warn!(
                %family,
                %epoch,
                path = %path.display(),
                "version is not on the family timeline, skipped"
            ),
        }
    }
    Ok(introspector)
}
