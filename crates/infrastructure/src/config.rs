//! Viewer configuration: structs, parsing, and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PAGE_LIMIT, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_ADDR, MAX_PAGE_LIMIT,
};

// ── Config errors ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl ViewerConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load config from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.addr.is_empty() {
            return Err(ConfigError::Validation {
                field: "service.addr".to_string(),
                message: "audit service address must not be empty".to_string(),
            });
        }
        if self.service.page_limit == 0 || self.service.page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Validation {
                field: "service.page_limit".to_string(),
                message: format!(
                    "page limit {} out of range 1..={MAX_PAGE_LIMIT}",
                    self.service.page_limit
                ),
            });
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "service.timeout_secs".to_string(),
                message: "timeout must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

// ── Audit service connection ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the audit service API.
    #[serde(default = "default_service_addr")]
    pub addr: String,

    /// Bearer token for authenticated requests. The `DBAUDIT_TOKEN`
    /// environment variable takes precedence.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Events requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

fn default_service_addr() -> String {
    DEFAULT_SERVICE_ADDR.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: default_service_addr(),
            token: None,
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}
fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "invalid log level '{s}': expected error|warn|info|debug|trace"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid log format '{s}': expected text|json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = ViewerConfig::from_yaml("{}").unwrap();
        assert_eq!(config.service.addr, DEFAULT_SERVICE_ADDR);
        assert_eq!(config.service.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn full_yaml_parses() {
        let yaml = r#"
service:
  addr: https://audit-proxy.example.com:3080
  token: secret
  timeout_secs: 30
  page_limit: 250
log:
  level: debug
  format: json
"#;
        let config = ViewerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.service.addr, "https://audit-proxy.example.com:3080");
        assert_eq!(config.service.token.as_deref(), Some("secret"));
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.service.page_limit, 250);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn empty_addr_is_rejected() {
        let yaml = "service:\n  addr: \"\"\n";
        assert!(ViewerConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn zero_page_limit_is_rejected() {
        let yaml = "service:\n  page_limit: 0\n";
        assert!(ViewerConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn oversized_page_limit_is_rejected() {
        let yaml = format!("service:\n  page_limit: {}\n", MAX_PAGE_LIMIT + 1);
        assert!(ViewerConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ViewerConfig::from_yaml("servce:\n  addr: x\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            ViewerConfig::load_or_default(Path::new("/nonexistent/dbaudit.yaml")).unwrap();
        assert_eq!(config.service.addr, DEFAULT_SERVICE_ADDR);
    }

    #[test]
    fn log_level_round_trips_through_from_str() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        }
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_format_accepts_aliases() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
