//! Runner configuration.
//!
//! Defaults suit a local run against a handful of services. A YAML file can
//! override any key; environment variables override the file; the CLI
//! overrides everything (see `kalista-cli`).

use std::path::Path;
use std::time::Duration;

use kalista_contract::ExtensionFilter;
use serde::{Deserialize, Serialize};

/// Default per-exchange timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of contracts executed at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Environment variable overriding [`RunnerConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "KALISTA_TIMEOUT_SECS";

/// Environment variable overriding [`RunnerConfig::max_concurrency`].
pub const ENV_MAX_CONCURRENCY: &str = "KALISTA_MAX_CONCURRENCY";

/// Environment variable overriding [`RunnerConfig::extensions`].
pub const ENV_CONTRACT_EXTENSIONS: &str = "KALISTA_CONTRACT_EXTENSIONS";

/// Settings for one run.
///
/// Every key is optional in the YAML form:
///
/// ```yaml
/// timeout_secs: 5
/// max_concurrency: 8
/// extensions: "yml,yaml,contract"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Timeout covering one full HTTP round trip, in seconds.
    pub timeout_secs: u64,
    /// Upper bound on contracts in flight at once.
    pub max_concurrency: usize,
    /// Which files under the contract root are loaded.
    pub extensions: ExtensionFilter,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            extensions: ExtensionFilter::default(),
        }
    }
}

impl RunnerConfig {
    /// Load a configuration file, filling absent keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration document.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                origin: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a configuration document. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid YAML, unknown keys, or
    /// values of the wrong type.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            origin: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Apply `KALISTA_*` environment overrides.
    ///
    /// Variables:
    /// - `KALISTA_TIMEOUT_SECS` (seconds)
    /// - `KALISTA_MAX_CONCURRENCY`
    /// - `KALISTA_CONTRACT_EXTENSIONS` (`yml,yaml`, `!md`, or `*`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a set variable cannot be parsed.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup, using the same keys
    /// as [`RunnerConfig::with_env`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a present value cannot be parsed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_value(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_CONCURRENCY) {
            self.max_concurrency = parse_value(ENV_MAX_CONCURRENCY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONTRACT_EXTENSIONS) {
            self.extensions = parse_value(ENV_CONTRACT_EXTENSIONS, &raw)?;
        }
        Ok(self)
    }

    /// Per-exchange timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject settings that would make a run impossible.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] or [`ConfigError::ZeroConcurrency`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file '{path}': {reason}")]
    Read { path: String, reason: String },
    /// The YAML was malformed or carried unknown keys.
    #[error("invalid config in {origin}: {reason}")]
    Parse { origin: String, reason: String },
    /// An environment override could not be parsed.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    /// `timeout_secs` was zero.
    #[error("timeout must be at least one second")]
    ZeroTimeout,
    /// `max_concurrency` was zero.
    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,
}
