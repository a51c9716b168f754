// Project configuration (jass.toml)
//
// [limits]       partial overrides of CompilerLimits
// [destructors]  extra "type = [destructor, ...]" entries for leak analysis

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::limits::{CompilerLimits, LimitsConfig};
use crate::semantic::Destructors;

/// Error type for loading and validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid limit '{name}': {value} (must be positive and reasonable)")]
    InvalidLimit { name: &'static str, value: usize },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, value: usize) -> Self {
        ConfigError::InvalidLimit { name, value }
    }
}

/// Effective configuration of a front-end run
#[derive(Debug, Clone)]
pub struct Config {
    pub limits: CompilerLimits,
    pub destructors: Destructors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: CompilerLimits::default(),
            destructors: Destructors::builtin(),
        }
    }
}

impl Config {
    /// Load configuration from jass.toml, falling back to defaults
    ///
    /// Returns error only if the file is unreadable or malformed, not if it is missing
    pub fn from_project_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content, path)
    }

    /// Parse configuration text read from `path`
    fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let project: ProjectConfig =
            toml::from_str(content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::default();
        if let Some(limits) = &project.limits {
            config.limits.merge(limits);
        }
        for (type_name, destructors) in project.destructors.unwrap_or_default() {
            for destructor in destructors {
                config.destructors.insert(&type_name, &destructor);
            }
        }

        config.limits.validate()?;
        Ok(config)
    }
}

/// TOML configuration structures for deserialization
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectConfig {
    limits: Option<LimitsConfig>,
    destructors: Option<BTreeMap<String, Vec<String>>>,
}
