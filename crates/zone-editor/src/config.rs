//! Editor configuration file.
//!
//! Stored as JSON. Every field is optional in the file; missing fields take
//! their defaults, so `{}` is a valid configuration.
//!
//! ```json
//! {
//!   "history_capacity": 200,
//!   "build": { "program": "make", "args": ["{config}", "OUT={artifact}"] },
//!   "module": { "script_export_prefix": "script_", "fuel_limit": 500000 },
//!   "log_level": "debug"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zone_build::{BuildToolConfig, ModuleConfig};

/// Errors produced while reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings for an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of command log entries. `None` keeps everything.
    pub history_capacity: Option<usize>,
    /// External build tool command line.
    pub build: BuildToolConfig,
    /// Game-code module loading.
    pub module: ModuleConfig,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: None,
            build: BuildToolConfig::default(),
            module: ModuleConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

impl EditorConfig {
    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "editor config loaded");
        Ok(config)
    }

    /// Read `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default_config() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.history_capacity, None);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: EditorConfig = serde_json::from_str(
            r#"{ "history_capacity": 50, "build": { "program": "make" }, "module": { "fuel_limit": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.history_capacity, Some(50));
        assert_eq!(config.build.program, "make");
        assert_eq!(config.build.args, BuildToolConfig::default().args);
        assert_eq!(config.module.fuel_limit, 10);
        assert_eq!(config.module.script_export_prefix, "script_");
    }

    #[test]
    fn load_reports_path_on_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        let err = EditorConfig::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let err = EditorConfig::load(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(
            EditorConfig::load_or_default(None).unwrap(),
            EditorConfig::default()
        );
    }
}
