//! Provider-wide configuration.
//!
//! [`BridgeConfig`] carries the defaults consulted whenever a caller omits a
//! parameter: the page size for `list()` calls and the timeout/interval pair used
//! while waiting for a resource to change state. Providers hold it behind an
//! `Arc` and hand a reference to every service they construct.
//!
//! Configuration is layered. [`BridgeConfig::load`] starts from the defaults,
//! applies a JSON file (explicit path, or `CB_CONFIG_FILE`), then applies
//! `CB_*` environment variables:
//!
//! | Variable | Field |
//! | --- | --- |
//! | `CB_DEFAULT_RESULT_LIMIT` | `default_result_limit` |
//! | `CB_DEFAULT_WAIT_TIMEOUT` | `default_wait_timeout` (seconds) |
//! | `CB_DEFAULT_WAIT_INTERVAL` | `default_wait_interval` (seconds) |
//! | `CB_DEBUG` | `debug_mode` |
//! | `CB_REGION` / `CB_ZONE` | `region` / `zone` |
//!
//! ```
//! use cloudbridge::config::BridgeConfig;
//! use std::time::Duration;
//!
//! let config = BridgeConfig::default()
//!     .with_result_limit(20)
//!     .with_wait_interval(Duration::from_secs(2));
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{CloudError, CloudResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "CB_";
pub const CONFIG_FILE_VAR: &str = "CB_CONFIG_FILE";

pub const DEFAULT_RESULT_LIMIT: usize = 50;
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub default_result_limit: usize,
    pub default_wait_timeout: Duration,
    pub default_wait_interval: Duration,
    pub debug_mode: bool,
    pub region: Option<String>,
    pub zone: Option<String>,
    /// Provider-specific settings the common layer does not interpret.
    pub extra: HashMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_result_limit: DEFAULT_RESULT_LIMIT,
            default_wait_timeout: DEFAULT_WAIT_TIMEOUT,
            default_wait_interval: DEFAULT_WAIT_INTERVAL,
            debug_mode: false,
            region: None,
            zone: None,
            extra: HashMap::new(),
        }
    }
}

/// On-disk form: every field optional, durations in whole seconds.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_result_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_wait_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_wait_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    debug_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    extra: HashMap<String, String>,
}

impl From<&BridgeConfig> for ConfigFile {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            default_result_limit: Some(config.default_result_limit),
            default_wait_timeout: Some(config.default_wait_timeout.as_secs()),
            default_wait_interval: Some(config.default_wait_interval.as_secs()),
            debug_mode: Some(config.debug_mode),
            region: config.region.clone(),
            zone: config.zone.clone(),
            extra: config.extra.clone(),
        }
    }
}

impl BridgeConfig {
    /// Defaults, then the config file, then the environment. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the file cannot be read or parsed, an
    /// environment variable holds an unparseable value, or the merged result is invalid.
    pub fn load(path: Option<&Path>) -> CloudResult<Self> {
        let env = config_from_env(ENV_PREFIX);
        let mut config = Self::default();

        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_FILE_VAR).ok().map(Into::into));
        if let Some(file) = file {
            config = config.merge_json(&read_config_file(&file)?)?;
        }

        let config = config.with_env_overrides(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `CB_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for unparseable values or an invalid result.
    pub fn from_env() -> CloudResult<Self> {
        let config = Self::default().with_env_overrides(&config_from_env(ENV_PREFIX))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the JSON is malformed, names an unknown
    /// field, or produces an invalid configuration.
    pub fn from_json_str(json: &str) -> CloudResult<Self> {
        let config = Self::default().merge_json(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the file is unreadable or invalid.
    pub fn from_file(path: impl AsRef<Path>) -> CloudResult<Self> {
        Self::from_json_str(&read_config_file(path.as_ref())?)
    }

    /// Serialize to the JSON file format accepted by [`BridgeConfig::from_json_str`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if serialization fails.
    pub fn to_json(&self) -> CloudResult<String> {
        serde_json::to_string_pretty(&ConfigFile::from(self)).map_err(|e| {
            CloudError::invalid_configuration("Could not serialize configuration")
                .with_source(e.to_string())
        })
    }

    fn merge_json(mut self, json: &str) -> CloudResult<Self> {
        let file: ConfigFile = serde_json::from_str(json).map_err(|e| {
            CloudError::invalid_configuration("Malformed configuration document")
                .with_source(e.to_string())
        })?;

        if let Some(limit) = file.default_result_limit {
            self.default_result_limit = limit;
        }
        if let Some(secs) = file.default_wait_timeout {
            self.default_wait_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.default_wait_interval {
            self.default_wait_interval = Duration::from_secs(secs);
        }
        if let Some(debug) = file.debug_mode {
            self.debug_mode = debug;
        }
        if file.region.is_some() {
            self.region = file.region;
        }
        if file.zone.is_some() {
            self.zone = file.zone;
        }
        self.extra.extend(file.extra);
        Ok(self)
    }

    /// Apply overrides from a map of prefix-stripped, lowercased variable names,
    /// as produced by [`config_from_env`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if a value cannot be parsed.
    pub fn with_env_overrides(mut self, vars: &HashMap<String, String>) -> CloudResult<Self> {
        if let Some(v) = vars.get("default_result_limit") {
            self.default_result_limit = parse_var("CB_DEFAULT_RESULT_LIMIT", v)?;
        }
        if let Some(v) = vars.get("default_wait_timeout") {
            self.default_wait_timeout =
                Duration::from_secs(parse_var("CB_DEFAULT_WAIT_TIMEOUT", v)?);
        }
        if let Some(v) = vars.get("default_wait_interval") {
            self.default_wait_interval =
                Duration::from_secs(parse_var("CB_DEFAULT_WAIT_INTERVAL", v)?);
        }
        if let Some(v) = vars.get("debug") {
            self.debug_mode = parse_bool("CB_DEBUG", v)?;
        }
        if let Some(v) = vars.get("region") {
            self.region = Some(v.clone());
        }
        if let Some(v) = vars.get("zone") {
            self.zone = Some(v.clone());
        }
        Ok(self)
    }

    #[must_use]
    pub const fn with_result_limit(mut self, limit: usize) -> Self {
        self.default_result_limit = limit;
        self
    }

    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.default_wait_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_wait_interval(mut self, interval: Duration) -> Self {
        self.default_wait_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the result limit is zero or the wait
    /// timeout is shorter than the wait interval.
    pub fn validate(&self) -> CloudResult<()> {
        if self.default_result_limit == 0 {
            return Err(CloudError::invalid_configuration(
                "default_result_limit must be greater than zero",
            ));
        }
        if self.default_wait_timeout < self.default_wait_interval {
            return Err(CloudError::invalid_configuration(format!(
                "default_wait_timeout ({:?}) must not be shorter than default_wait_interval ({:?})",
                self.default_wait_timeout, self.default_wait_interval
            )));
        }
        Ok(())
    }
}

/// Collect environment variables starting with `prefix`, keyed by the
/// lowercased remainder of their name.
#[must_use]
pub fn config_from_env(prefix: &str) -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix)
                .map(|name| (name.to_lowercase(), value))
        })
        .collect()
}

fn read_config_file(path: &Path) -> CloudResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CloudError::invalid_configuration(format!(
            "Could not read config file {}",
            path.display()
        ))
        .with_source(e.to_string())
    })
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> CloudResult<T> {
    value.trim().parse().map_err(|_| {
        CloudError::invalid_configuration(format!("Invalid value for {name}: {value:?}"))
    })
}

fn parse_bool(name: &str, value: &str) -> CloudResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(CloudError::invalid_configuration(format!(
            "Invalid value for {name}: {value:?}"
        ))),
    }
}
