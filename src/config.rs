//! # Configuration Module
//!
//! Configuration support for renotice: run defaults (template file name,
//! year policy, git awareness, ignore patterns) and the ordered list of
//! known org units for the entity guard.
//!
//! Configuration can be specified in a `.renotice.toml` file or via the
//! `RENOTICE_CONFIG` environment variable. CLI flags always win over config
//! values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::verbose_log;
use crate::years::YearPolicy;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".renotice.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "RENOTICE_CONFIG";

/// Main configuration struct for renotice.
///
/// Loaded from a `.renotice.toml` file; every field has a sensible default
/// so a missing or empty config file behaves like no config at all.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// Name of the template definition file looked up per directory.
  #[serde(default, rename = "template-filename")]
  pub template_filename: Option<String>,

  /// Fixed template file path; disables hierarchical lookup when set.
  #[serde(default, rename = "template-path")]
  pub template_path: Option<PathBuf>,

  /// Whether to walk parent directories looking for template files.
  #[serde(default)]
  pub hierarchical: Option<bool>,

  /// How the start year of new ranges is chosen.
  #[serde(default, rename = "year-policy")]
  pub year_policy: Option<YearPolicy>,

  /// Whether to consult git history for modification state and years.
  #[serde(default, rename = "git-aware")]
  pub git_aware: Option<bool>,

  /// Glob patterns for files to skip.
  #[serde(default)]
  pub ignore: Vec<String>,

  /// Ordered list of known org-unit names for the entity guard.
  #[serde(default, rename = "known-units")]
  pub known_units: Vec<String>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// A config value is invalid.
  #[error("Invalid config value for '{field}': {message}")]
  InvalidValue { field: String, message: String },
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file
  ///
  /// # Returns
  ///
  /// The loaded configuration, or an error if the file cannot be read or
  /// parsed.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    config.validate()?;
    Ok(config)
  }

  /// Validate the configuration.
  ///
  /// Checks that the template filename is a bare file name and that
  /// known-unit entries are non-empty.
  fn validate(&self) -> Result<(), ConfigError> {
    if let Some(ref filename) = self.template_filename {
      if filename.is_empty() {
        return Err(ConfigError::InvalidValue {
          field: "template-filename".to_string(),
          message: "cannot be empty".to_string(),
        });
      }
      if filename.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
          field: "template-filename".to_string(),
          message: "must be a bare file name, not a path".to_string(),
        });
      }
    }

    for unit in &self.known_units {
      if unit.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
          field: "known-units".to_string(),
          message: "entries cannot be empty".to_string(),
        });
      }
    }

    Ok(())
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `RENOTICE_CONFIG` environment variable
/// 3. `.renotice.toml` in the workspace root
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workspace_root` - The workspace root directory
///
/// # Returns
///
/// The path to the configuration file, or `None` if no config file is found.
pub fn discover_config_path(explicit_path: Option<&Path>, workspace_root: &Path) -> Option<PathBuf> {
  // 1. Explicit path from CLI takes highest priority
  if let Some(path) = explicit_path {
    if path.exists() {
      verbose_log!("Using explicit config path: {}", path.display());
      return Some(path.to_path_buf());
    }
    verbose_log!("Explicit config path does not exist: {}", path.display());
    return None;
  }

  // 2. Check environment variable
  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  // 3. Check workspace root
  let workspace_config = workspace_root.join(DEFAULT_CONFIG_FILENAME);
  if workspace_config.exists() {
    verbose_log!("Using workspace config: {}", workspace_config.display());
    return Some(workspace_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path, or return `None`.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `workspace_root` - The workspace root directory
/// * `no_config` - If true, skip config file discovery and use defaults
pub fn load_config(explicit_path: Option<&Path>, workspace_root: &Path, no_config: bool) -> Result<Option<Config>> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(None);
  }

  match discover_config_path(explicit_path, workspace_root) {
    Some(path) => {
      let config = Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))?;
      Ok(Some(config))
    }
    None => Ok(None),
  }
}
