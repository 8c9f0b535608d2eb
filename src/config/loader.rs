//! Configuration loading and discovery for `europa.config.js`
//!
//! Provides functions to find the config that governs a document and to load
//! it into an [`EuropaConfig`].

use super::schema::{ColorSource, ColorTable, EuropaConfig, RawConfig, ThemeError};
use super::script::{self, ScriptError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Config file names, in order of preference within one directory
pub const CONFIG_FILE_NAMES: [&str; 2] = ["europa.config.js", "europa.config.cjs"];

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The script uses constructs outside the supported subset
    #[error("Unsupported config script: {0}")]
    Script(#[from] ScriptError),
    /// JSON5 parsing or shape error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Whether a path names a config file
pub fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
}

/// Config file directly inside `dir`, preferring `.js` over `.cjs`
pub fn find_config_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

/// Find a config by walking up from `start`.
///
/// The walk stops after checking `boundary` (usually the workspace root);
/// without a boundary it continues to the filesystem root.
pub fn find_config_from(start: &Path, boundary: Option<&Path>) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if let Some(path) = find_config_in(&current) {
            return Some(path);
        }

        if boundary.is_some_and(|b| current == b) {
            return None;
        }

        // Move to parent directory
        if !current.pop() {
            return None;
        }
    }
}

/// First workspace root that contains a config file
pub fn find_workspace_config(roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().find_map(|root| find_config_in(root))
}

/// Find the config governing a document.
///
/// Search order:
/// 1. Walk up from the document's directory to the workspace root containing it
/// 2. Fall back to any workspace root with a config
pub fn find_config_for_document(document: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
    let root = roots
        .iter()
        .filter(|root| document.starts_with(root))
        .max_by_key(|root| root.components().count());

    document
        .parent()
        .and_then(|dir| find_config_from(dir, root.map(PathBuf::as_path)))
        .or_else(|| find_workspace_config(roots))
}

/// Parse config script text.
///
/// Only script and JSON5 syntax errors fail the whole config. A theme section
/// with the wrong shape is left empty. A `colors` table written as a function
/// stays a function: the returned theme re-evaluates it on every access, and
/// a body that is not a color table reads as no colors.
pub fn parse_config(source: &str) -> Result<EuropaConfig, ConfigError> {
    let normalized = script::normalize(source)?;
    let raw: RawConfig = json5::from_str(&normalized.source)?;

    let lazy_colors = normalized.lazy_property("theme.colors").map(|colors| {
        let body = colors.body.clone();
        ColorSource::lazy(move || {
            json5::from_str::<ColorTable>(&body).map_err(|e| ThemeError::ColorFunction(e.to_string()))
        })
    });

    Ok(raw.into_config(lazy_colors))
}

/// Load configuration from a config file.
pub fn load_config(path: &Path) -> Result<EuropaConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    let config = parse_config(&contents)?;

    debug!(
        path = %path.display(),
        breakpoints = config.theme.breakpoints.len(),
        families = config.theme.typography.families.len(),
        sizes = config.theme.typography.sizes.len(),
        "loaded config"
    );

    Ok(config)
}
