//! Configuration file resolution and loading
//!
//! Config files are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SCRIBE_CONFIG`)
//! 3. User config file (`~/.config/scribe/config.toml`)
//! 4. System config file (`/etc/scribe/config.toml`, Linux only)
//!
//! When nothing is found the caller falls back to compiled defaults. A file the
//! user pointed at explicitly (CLI or ENV) must exist and parse; a discovered
//! file must parse.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCRIBE_CONFIG";

/// Where a resolved config file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfig,
    SystemConfig,
}

impl ConfigSource {
    /// Explicit sources must point at an existing file
    pub fn is_explicit(self) -> bool {
        matches!(self, ConfigSource::CommandLine | ConfigSource::Environment)
    }
}

/// A config file path together with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Config file resolver for one application
pub struct ConfigResolver {
    app_name: String,
}

impl ConfigResolver {
    /// Create a resolver looking under `<config_dir>/<app_name>/config.toml`
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Resolve the config file to load, if any
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<ResolvedConfig> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(ResolvedConfig {
                path: path.to_path_buf(),
                source: ConfigSource::CommandLine,
            });
        }

        // Priority 2: Environment variable
        if let Some(path) = env_override(CONFIG_ENV_VAR) {
            return Some(ResolvedConfig {
                path: PathBuf::from(path),
                source: ConfigSource::Environment,
            });
        }

        // Priority 3: User config file
        if let Some(path) = self.user_config_path() {
            if path.is_file() {
                return Some(ResolvedConfig {
                    path,
                    source: ConfigSource::UserConfig,
                });
            }
        }

        // Priority 4: System config file
        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc")
                .join(&self.app_name)
                .join("config.toml");
            if system_config.is_file() {
                return Some(ResolvedConfig {
                    path: system_config,
                    source: ConfigSource::SystemConfig,
                });
            }
        }

        None
    }

    /// Per-user config file location for the current platform
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(&self.app_name).join("config.toml"))
    }

    /// Resolve and load a config, falling back to `T::default()` when no file exists
    pub fn load<T>(&self, cli_arg: Option<&Path>) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.resolve(cli_arg) {
            Some(resolved) => {
                if resolved.source.is_explicit() && !resolved.path.is_file() {
                    return Err(Error::Config(format!(
                        "Config file not found: {} (from {:?})",
                        resolved.path.display(),
                        resolved.source
                    )));
                }
                let config = load_toml_config(&resolved.path)?;
                info!(
                    path = %resolved.path.display(),
                    source = ?resolved.source,
                    "Configuration loaded"
                );
                Ok(config)
            }
            None => {
                warn!(
                    "No config file found for {}, using compiled defaults",
                    self.app_name
                );
                Ok(T::default())
            }
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Reading TOML config");
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Read an environment variable, ignoring unset, empty and whitespace-only values
pub fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default_level() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(logging.file.is_none());
    }

    #[test]
    fn test_logging_config_partial_toml() {
        let logging: LoggingConfig = toml::from_str("file = \"/tmp/scribe.log\"").unwrap();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.file, Some(PathBuf::from("/tmp/scribe.log")));
    }

    #[test]
    fn test_explicit_sources() {
        assert!(ConfigSource::CommandLine.is_explicit());
        assert!(ConfigSource::Environment.is_explicit());
        assert!(!ConfigSource::UserConfig.is_explicit());
        assert!(!ConfigSource::SystemConfig.is_explicit());
    }

    #[test]
    fn test_cli_arg_has_highest_priority() {
        let resolver = ConfigResolver::new("scribe-test");
        let resolved = resolver.resolve(Some(Path::new("/tmp/explicit.toml"))).unwrap();
        assert_eq!(resolved.source, ConfigSource::CommandLine);
        assert_eq!(resolved.path, PathBuf::from("/tmp/explicit.toml"));
    }
}
