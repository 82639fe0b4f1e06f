//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is read from a TOML file; individual keys can be
//! overridden through environment variables by the consuming crate. The TOML
//! file cannot change while the service is running.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from TOML file
///
/// **Minimal by design** - only bootstrap concerns live here. Runtime
/// behavior knobs live in the `[audit]` section and are folded into the
/// audit engine's own config with built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Insight provider endpoint URL (optional - enhancement stage is
    /// disabled when neither this nor the environment variable is set)
    #[serde(default)]
    pub insight_endpoint: Option<String>,

    /// Insight provider API key (optional)
    #[serde(default)]
    pub insight_api_key: Option<String>,

    /// Audit engine overrides (optional)
    #[serde(default)]
    pub audit: AuditSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// `[audit]` table: per-key overrides for the audit engine configuration.
///
/// Every field is optional; missing keys fall back to the engine's built-in
/// defaults. Validation of the combined values happens in the audit crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSection {
    pub detector_timeout_ms: Option<u64>,
    pub pipeline_timeout_ms: Option<u64>,
    pub enhancement_timeout_ms: Option<u64>,
    pub confidence_threshold: Option<f64>,
    pub acceptable_leaf_score: Option<f64>,
    pub cache_bucket_secs: Option<u64>,
    pub cache_capacity: Option<usize>,
}

/// Get default configuration file path for the platform
///
/// Resolution order:
/// 1. `~/.config/sitegrade/config.toml` (user config)
/// 2. `/etc/sitegrade/config.toml` (Linux system config)
pub fn default_config_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("sitegrade").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/sitegrade/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Load TOML configuration from the given path
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig =
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    tracing::info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Load TOML configuration from the default path, or defaults when no
/// config file exists on this machine.
pub fn load_or_default() -> TomlConfig {
    match default_config_path() {
        Ok(path) => match load_toml_config(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Config load failed, using defaults: {}", e);
                TomlConfig::default()
            }
        },
        Err(_) => TomlConfig::default(),
    }
}

/// Write TOML configuration to the given path (creates parent directories)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Create config dir failed: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| Error::Config(format!("Write TOML failed ({}): {}", path.display(), e)))?;

    tracing::info!("Wrote TOML configuration to {}", path.display());
    Ok(())
}
