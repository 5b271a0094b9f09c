//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::data::{DataResult, Dataset, TsvLoader};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input file configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_timeseries_path")]
    pub timeseries_path: PathBuf,

    #[serde(default = "default_locations_path")]
    pub locations_path: PathBuf,

    /// Extra `chrono` format tried before the built-in date formats
    #[serde(default)]
    pub date_format: Option<String>,
}

fn default_timeseries_path() -> PathBuf {
    PathBuf::from("Notaufnahmesurveillance_Zeitreihen_Syndrome.tsv")
}

fn default_locations_path() -> PathBuf {
    PathBuf::from("Notaufnahmesurveillance_Standorte.tsv")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            timeseries_path: default_timeseries_path(),
            locations_path: default_locations_path(),
            date_format: None,
        }
    }
}

impl DataConfig {
    /// Loader honouring the configured date format
    pub fn loader(&self) -> TsvLoader {
        match &self.date_format {
            Some(format) => TsvLoader::new().with_date_format(format),
            None => TsvLoader::new(),
        }
    }

    /// Load both input files
    pub fn load_dataset(&self) -> DataResult<Dataset> {
        self.loader()
            .load_dataset(&self.timeseries_path, &self.locations_path)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Standard config locations, in search order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("edsurv").join("config.toml")),
            Some(PathBuf::from("/etc/edsurv/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from the first existing default location, or defaults plus environment
    pub fn load_default() -> Result<(Self, ConfigSource), ConfigError> {
        Self::load_first(&Self::default_paths())
    }

    fn load_first(paths: &[PathBuf]) -> Result<(Self, ConfigSource), ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Ok((Self::load_with_env(path)?, ConfigSource::File(path.clone()))),
            None => Ok((Self::from_env()?, ConfigSource::Defaults)),
        }
    }

    /// Explicit path if given, else the default locations
    ///
    /// Nothing is logged here; callers report the returned source once their
    /// subscriber is installed.
    pub fn resolve(path: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        match path {
            Some(path) => Ok((Self::load_with_env(path)?, ConfigSource::File(path.to_path_buf()))),
            None => Self::load_default(),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Data overrides
        if let Some(path) = lookup("EDSURV_TIMESERIES_PATH") {
            self.data.timeseries_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("EDSURV_LOCATIONS_PATH") {
            self.data.locations_path = PathBuf::from(path);
        }

        // API overrides
        if let Some(host) = lookup("EDSURV_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("EDSURV_PORT") {
            self.api.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "EDSURV_PORT".to_string(),
                value: port,
            })?;
        }

        // Logging overrides
        if let Some(level) = lookup("EDSURV_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("EDSURV_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}

/// Where a resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file, then environment overrides
    File(PathBuf),
    /// No file found; built-in defaults plus environment overrides
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# edsurv Configuration
#
# Environment variables override these settings:
# - EDSURV_TIMESERIES_PATH
# - EDSURV_LOCATIONS_PATH
# - EDSURV_HOST
# - EDSURV_PORT
# - EDSURV_LOG_LEVEL
# - EDSURV_LOG_FORMAT

[data]
# Syndrome time series (tab-separated)
timeseries_path = "Notaufnahmesurveillance_Zeitreihen_Syndrome.tsv"

# Emergency department locations (tab-separated)
locations_path = "Notaufnahmesurveillance_Standorte.tsv"

# Additional date format, tried before the built-in ones
# date_format = "%d/%m/%Y"

[api]
# Dashboard server host
host = "0.0.0.0"

# Dashboard server port
port = 8501

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(
            config.data.timeseries_path,
            PathBuf::from("Notaufnahmesurveillance_Zeitreihen_Syndrome.tsv")
        );
        assert_eq!(
            config.data.locations_path,
            PathBuf::from("Notaufnahmesurveillance_Standorte.tsv")
        );
        assert_eq!(config.api.port, 8501);
        assert_eq!(config.api.addr(), "0.0.0.0:8501");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config = Config::parse(&generate_default_config()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.data.timeseries_path, defaults.data.timeseries_path);
        assert_eq!(config.data.locations_path, defaults.data.locations_path);
        assert_eq!(config.api.host, defaults.api.host);
        assert_eq!(config.api.port, defaults.api.port);
        assert!(config.api.cors_origins.is_empty());
        assert_eq!(config.logging.format, defaults.logging.format);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse("[api]\nport = 9000\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load(Path::new("/nonexistent/edsurv.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nport = ").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data]\ntimeseries_path = \"/srv/ts.tsv\"\n[logging]\nformat = \"json\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.data.timeseries_path, PathBuf::from("/srv/ts.tsv"));
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("EDSURV_TIMESERIES_PATH", "/data/ts.tsv"),
            ("EDSURV_HOST", "127.0.0.1"),
            ("EDSURV_PORT", "9100"),
            ("EDSURV_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.data.timeseries_path, PathBuf::from("/data/ts.tsv"));
        assert_eq!(
            config.data.locations_path,
            PathBuf::from("Notaufnahmesurveillance_Standorte.tsv")
        );
        assert_eq!(config.api.addr(), "127.0.0.1:9100");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_invalid_port_override_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == "EDSURV_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref key, .. } if key == "EDSURV_PORT"));
        assert_eq!(config.api.port, 8501);
    }

    #[test]
    fn test_resolve_reports_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = 9000").unwrap();

        let (config, source) = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
        assert_eq!(source.to_string(), file.path().display().to_string());
    }

    #[test]
    fn test_first_existing_default_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("config.toml");
        std::fs::write(&present, "[logging]\nlevel = \"debug\"\n").unwrap();

        let (config, source) = Config::load_first(&[missing.clone(), present.clone()]).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(source, ConfigSource::File(present));

        let (_, source) = Config::load_first(&[missing]).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(source.to_string(), "defaults");
    }

    #[test]
    fn test_broken_default_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("config.toml");
        std::fs::write(&broken, "[api\n").unwrap();

        let err = Config::load_first(&[broken]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
