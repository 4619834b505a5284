//! Run configuration.
//!
//! # Sources
//!
//! - `load_at(path)`: a JSON file (`.yaml` / `.yml` files are read as YAML)
//! - `from_json_str(json)`: an inline JSON document, e.g. from `--config`
//!
//! Both run [`Config::validate`] before returning, so a `Config` obtained from
//! this module always has its required fields populated.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Where the configuration is read from when no source is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/apisec/config.json";

/// Uniform timeout applied to every remote call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Action the management service takes on requests violating a specification.
pub const DEFAULT_VIOLATION_ACTION: &str = "ALERT_ONLY";

/// Opaque provider settings, interpreted only by the matching fetcher.
pub type Settings = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Closed set of provider kinds. Serialized as the provider type name used in
/// configuration files and run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "AwsApiGwFetcher")]
    AwsApiGateway,
    #[serde(rename = "AzureFetcher")]
    Azure,
    #[serde(rename = "ThreeScaleFetcher")]
    ThreeScale,
    #[serde(rename = "FileSystemFetcher")]
    FileSystem,
}

impl ProviderKind {
    pub fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::AwsApiGateway,
            ProviderKind::Azure,
            ProviderKind::ThreeScale,
            ProviderKind::FileSystem,
        ]
    }

    pub fn type_name(self) -> &'static str {
        match self {
            ProviderKind::AwsApiGateway => "AwsApiGwFetcher",
            ProviderKind::Azure => "AzureFetcher",
            ProviderKind::ThreeScale => "ThreeScaleFetcher",
            ProviderKind::FileSystem => "FileSystemFetcher",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One entry of the `fetchers` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default = "enabled_by_default", alias = "enabled")]
    pub active: bool,
    #[serde(default)]
    pub settings: Settings,
}

fn enabled_by_default() -> bool {
    true
}

/// Log verbosity as spelled in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "WARN")]
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory of the rotating log file. Console only when absent.
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub level: LogLevel,
    /// Directory receiving `status.json`. The report is only logged when absent.
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub status_path: Option<PathBuf>,
}

/// Root of the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub api_id: String,
    pub api_key: String,
    pub site_id: String,
    pub management_url: String,
    #[serde(default = "default_violation_action")]
    pub specification_violation_action: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub fetchers: Vec<ProviderConfig>,
}

fn default_violation_action() -> String {
    DEFAULT_VIOLATION_ACTION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn empty_path_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Providers that will run, in configured order.
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.fetchers.iter().filter(|p| p.active)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("api_id", &self.api_id),
            ("api_key", &self.api_key),
            ("site_id", &self.site_id),
            ("management_url", &self.management_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { field });
            }
        }
        if !(self.management_url.starts_with("http://") || self.management_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "management_url",
                reason: format!("'{}' is not an http(s) URL", self.management_url),
            });
        }
        if self.specification_violation_action.trim().is_empty() {
            return Err(ConfigError::Missing { field: "specification_violation_action" });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and validate the configuration file at `path`.
///
/// Returns `ConfigError::NotFound` if absent and a parse error carrying the
/// path if malformed.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound { path: path.to_path_buf() });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.display().to_string();

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let config: Config = if is_yaml {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml { origin, source })?
    } else {
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json { origin, source })?
    };
    config.validate()?;
    Ok(config)
}

/// Parse and validate an inline JSON configuration.
pub fn from_json_str(json: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(json).map_err(|source| ConfigError::Json {
        origin: "inline configuration".to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
