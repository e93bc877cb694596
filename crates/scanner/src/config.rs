//! Scanner configuration.
//!
//! Layered in order: built-in defaults, an optional YAML file, then
//! `SCANNER_*` environment variables.

use crate::logging::{LogConfig, LogFormat};
use crate::matcher::MatchMode;
use crate::result::{ScannerError, ScannerResult};
use crate::scanner::{MatchPolicy, ScanOptions, DEFAULT_MAX_ADVANCES, DEFAULT_SCAN_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wait for an expected page event (dialogs, navigation)
pub const DEFAULT_EVENT_TIMEOUT_MS: u64 = 5000;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SCANNER_";

/// Configuration shared by every scan in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Budget for one scan, in milliseconds
    pub timeout_ms: u64,
    /// Page-advance budget for paged scans
    pub max_advances: usize,
    /// Default match mode
    pub match_mode: MatchMode,
    /// Default not-found policy
    pub policy: MatchPolicy,
    /// Wait budget for expected page events, in milliseconds
    pub event_timeout_ms: u64,
    /// Directory for screenshots and other artifacts
    pub artifact_dir: PathBuf,
    /// Logging setup
    pub log: LogConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
            max_advances: DEFAULT_MAX_ADVANCES,
            match_mode: MatchMode::Exact,
            policy: MatchPolicy::Require,
            event_timeout_ms: DEFAULT_EVENT_TIMEOUT_MS,
            artifact_dir: PathBuf::from("target/scanner"),
            log: LogConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a YAML string; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> ScannerResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| ScannerError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    pub fn from_file(path: &Path) -> ScannerResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> ScannerResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SCANNER_*` overrides looked up through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> ScannerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("TIMEOUT_MS") {
            self.timeout_ms = parse_env("TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("MAX_ADVANCES") {
            self.max_advances = parse_env("MAX_ADVANCES", &value)?;
        }
        if let Some(value) = var("MATCH_MODE") {
            self.match_mode = parse_env("MATCH_MODE", &value)?;
        }
        if let Some(value) = var("POLICY") {
            self.policy = parse_env("POLICY", &value)?;
        }
        if let Some(value) = var("EVENT_TIMEOUT_MS") {
            self.event_timeout_ms = parse_env("EVENT_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("ARTIFACT_DIR") {
            self.artifact_dir = PathBuf::from(value);
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.log.level = value;
        }
        if let Some(value) = var("LOG_FORMAT") {
            self.log.format = parse_env::<LogFormat>("LOG_FORMAT", &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values no scan can work with
    pub fn validate(&self) -> ScannerResult<()> {
        if self.timeout_ms == 0 {
            return Err(ScannerError::Config {
                message: "timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.event_timeout_ms == 0 {
            return Err(ScannerError::Config {
                message: "event_timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Scan options derived from this configuration
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new()
            .with_mode(self.match_mode)
            .with_policy(self.policy)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    /// Event wait budget
    #[must_use]
    pub const fn event_timeout(&self) -> Duration {
        Duration::from_millis(self.event_timeout_ms)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ScannerResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| ScannerError::Config {
            message: e.to_string(),
        })
    }
}

fn parse_env<T>(name: &str, value: &str) -> ScannerResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ScannerError::Config {
        message: format!("{ENV_PREFIX}{name}={value:?}: {e}"),
    })
}
