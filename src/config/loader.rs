//! Configuration file discovery and loading.
//!
//! This module finds configuration files in their priority order, loads them
//! as raw YAML, deep-merges them, and parses the result.

use crate::config::merger::merge_configs;
use crate::config::schema::UpsyncConfig;
use crate::error::{Result, UpsyncError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding project configuration.
pub const CONFIG_DIR: &str = ".upsync";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global config (`~/.upsync/config.yml`)
/// 2. Project config (`.upsync/config.yml`)
/// 3. Local overrides (`.upsync/config.local.yml`)
/// 4. Explicit `--config` file
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User's global config: ~/.upsync/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .upsync/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .upsync/config.local.yml
    pub project_local: Option<PathBuf>,

    /// File given on the command line; must exist
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: Self::find_user_global(),
            project: existing(project_root.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
            explicit: None,
        }
    }

    /// Add a command-line config file as the highest-priority layer.
    pub fn with_explicit(mut self, path: Option<&Path>) -> Self {
        self.explicit = path.map(Path::to_path_buf);
        self
    }

    fn find_user_global() -> Option<PathBuf> {
        existing(dirs::home_dir()?.join(CONFIG_DIR).join("config.yml"))
    }

    /// Returns all config paths in merge order.
    pub fn all(&self) -> Vec<&PathBuf> {
        [
            &self.user_global,
            &self.project,
            &self.project_local,
            &self.explicit,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Find the project root by walking up from `start`.
///
/// A `.upsync` directory wins over `.git`; `.git` is the fallback.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Parse YAML content into an [`UpsyncConfig`].
///
/// `source_path` is only used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<UpsyncConfig> {
    serde_yaml::from_str(content).map_err(|e| UpsyncError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw YAML value for merging.
///
/// An empty file loads as an empty mapping.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            UpsyncError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            UpsyncError::Io(e)
        }
    })?;

    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| UpsyncError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if value.is_null() {
        Ok(serde_yaml::Value::Mapping(Default::default()))
    } else {
        Ok(value)
    }
}

/// Load and merge every config layer for a project.
///
/// Missing discovered files are skipped, so a project without any
/// configuration gets the built-in defaults. An explicit file that does not
/// exist is an error.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<UpsyncConfig> {
    let paths = ConfigPaths::discover(project_root).with_explicit(explicit);

    let mut layers = Vec::new();
    for path in paths.all() {
        debug!("Loading config layer {}", path.display());
        layers.push(load_config_value(path)?);
    }

    let merged = merge_configs(&layers);
    serde_yaml::from_value(merged).map_err(|e| UpsyncError::ConfigParseError {
        path: paths
            .all()
            .last()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| project_root.join(CONFIG_DIR).join("config.yml")),
        message: format!("Failed to parse merged config: {}", e),
    })
}
