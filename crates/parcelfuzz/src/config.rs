// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Harness configuration.
//!
//! Loaded from a TOML file, from `PARCELFUZZ_*` environment variables, or
//! built programmatically. Fuzz targets usually rely on [`HarnessConfig::from_env`].

use crate::fuzz::MAX_INPUT_LEN;
use crate::logging::{self, ConsoleOutput, FacadeOutput, FileOutput, Output};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Environment variable selecting the fuzz log target.
pub const ENV_LOG: &str = "PARCELFUZZ_LOG";

/// Environment variable overriding [`HarnessConfig::max_input_len`].
pub const ENV_MAX_INPUT: &str = "PARCELFUZZ_MAX_INPUT";

/// Smallest input that still holds one payload byte and one selector.
const MIN_INPUT_LEN: usize = 2;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where fuzz log lines go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Dropped.
    #[default]
    Off,
    /// `[tag] message` on stderr.
    Stderr,
    /// Forwarded to the `log` facade.
    Facade,
    /// Written to a file, truncated on open.
    File(PathBuf),
}

impl LogTarget {
    /// Parse the `PARCELFUZZ_LOG` syntax. Anything that is not a keyword is a
    /// file path.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "" => Err(ConfigError::Invalid(format!("{} is empty", ENV_LOG))),
            "off" | "none" => Ok(LogTarget::Off),
            "stderr" | "console" => Ok(LogTarget::Stderr),
            "facade" | "log" => Ok(LogTarget::Facade),
            path => Ok(LogTarget::File(PathBuf::from(path))),
        }
    }
}

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Inputs longer than this are ignored.
    #[serde(default = "default_max_input_len")]
    pub max_input_len: usize,

    /// Fuzz log destination.
    #[serde(default)]
    pub log: LogTarget,
}

fn default_max_input_len() -> usize {
    MAX_INPUT_LEN
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_input_len: default_max_input_len(),
            log: LogTarget::Off,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `PARCELFUZZ_LOG` and `PARCELFUZZ_MAX_INPUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `PARCELFUZZ_*` overrides read through `lookup`, then validate.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_LOG) {
            self.log = LogTarget::parse(&value)?;
        }
        if let Some(value) = lookup(ENV_MAX_INPUT) {
            self.max_input_len = value.trim().parse().map_err(|e| {
                ConfigError::Invalid(format!("{}={:?}: {}", ENV_MAX_INPUT, value, e))
            })?;
        }
        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_len < MIN_INPUT_LEN {
            return Err(ConfigError::Invalid(format!(
                "max_input_len must be at least {}, got {}",
                MIN_INPUT_LEN, self.max_input_len
            )));
        }
        if let LogTarget::File(path) = &self.log {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("log file path is empty".into()));
            }
        }
        Ok(())
    }

    /// Open the configured output. `None` for [`LogTarget::Off`].
    pub fn build_output(&self) -> Result<Option<Arc<dyn Output>>, ConfigError> {
        let output: Arc<dyn Output> = match &self.log {
            LogTarget::Off => return Ok(None),
            LogTarget::Stderr => Arc::new(ConsoleOutput::new()),
            LogTarget::Facade => Arc::new(FacadeOutput::new()),
            LogTarget::File(path) => Arc::new(FileOutput::new(path)?),
        };
        Ok(Some(output))
    }

    /// Install the configured output as the process-wide fuzz log.
    pub fn install_logging(&self) -> Result<(), ConfigError> {
        match self.build_output()? {
            Some(output) => {
                log::debug!("[config] fuzz log -> {:?}", self.log);
                logging::init_logger(output);
            }
            None => logging::clear_logger(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.max_input_len, 50_000);
        assert_eq!(config.log, LogTarget::Off);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_variants() {
        let config = HarnessConfig::from_toml("").expect("empty config should parse");
        assert_eq!(config, HarnessConfig::default());

        let config = HarnessConfig::from_toml("max_input_len = 128\nlog = \"stderr\"\n")
            .expect("config should parse");
        assert_eq!(config.max_input_len, 128);
        assert_eq!(config.log, LogTarget::Stderr);

        let config = HarnessConfig::from_toml("log = { file = \"/tmp/parcel.log\" }\n")
            .expect("config should parse");
        assert_eq!(config.log, LogTarget::File(PathBuf::from("/tmp/parcel.log")));
    }

    #[test]
    fn test_from_toml_rejects_bad_input() {
        assert!(matches!(
            HarnessConfig::from_toml("max_input_len = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            HarnessConfig::from_toml("log = \"syslog\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("parcelfuzz.toml");
        let config = HarnessConfig {
            max_input_len: 4096,
            log: LogTarget::Facade,
        };
        let text = toml::to_string_pretty(&config).expect("serialize");
        std::fs::write(&path, text).expect("write config");

        let loaded = HarnessConfig::from_file(&path).expect("load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = HarnessConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = HarnessConfig::default();
        config
            .apply_overrides(env(&[(ENV_LOG, "facade"), (ENV_MAX_INPUT, " 300 ")]))
            .expect("overrides should apply");
        assert_eq!(config.log, LogTarget::Facade);
        assert_eq!(config.max_input_len, 300);

        config
            .apply_overrides(env(&[(ENV_LOG, "/var/tmp/fuzz.log")]))
            .expect("overrides should apply");
        assert_eq!(config.log, LogTarget::File(PathBuf::from("/var/tmp/fuzz.log")));
        assert_eq!(config.max_input_len, 300);
    }

    #[test]
    fn test_env_overrides_rejected() {
        let mut config = HarnessConfig::default();
        assert!(config
            .apply_overrides(env(&[(ENV_MAX_INPUT, "lots")]))
            .is_err());
        assert!(config.apply_overrides(env(&[(ENV_MAX_INPUT, "0")])).is_err());
        assert!(config.apply_overrides(env(&[(ENV_LOG, "  ")])).is_err());
    }

    #[test]
    fn test_build_output() {
        assert!(HarnessConfig::default()
            .build_output()
            .expect("off target")
            .is_none());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fuzz.log");
        let config = HarnessConfig {
            log: LogTarget::File(path.clone()),
            ..HarnessConfig::default()
        };
        let output = config
            .build_output()
            .expect("file target")
            .expect("output present");
        output.write("parcel", "line").expect("write");
        output.flush().expect("flush");
        assert_eq!(
            std::fs::read_to_string(&path).expect("read log"),
            "[parcel] line\n"
        );
    }
}
