//! Configuration loading, parsing, and validation for upsync.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use upsync::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".upsync");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "quick:\n  test_command: npm test\n").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.quick.test_command, "npm test");
//! ```
//!
//! # Configuration File Locations
//!
//! Layers are merged in this order, later ones winning:
//! 1. Built-in defaults
//! 2. User global config (`~/.upsync/config.yml`)
//! 3. Project config (`.upsync/config.yml`)
//! 4. Local overrides (`.upsync/config.local.yml`)
//! 5. `--config PATH`

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    ConflictsConfig, EnvironmentBranches, OutputSetting, QuickConfig, Settings, SyncConfig,
    TerminalConfig, UpsyncConfig,
};

pub use loader::{
    find_project_root, load_config, load_config_value, parse_config, ConfigPaths, CONFIG_DIR,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, ValidationError};
