//! Runtime configuration.
//!
//! Read from the environment (and a `.env` file when present). Command-line
//! flags of the `curate` binary override these values.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CURATE_SOURCE_DIR` | `datasets` |
//! | `CURATE_OUTPUT_DIR` | `curated` |
//! | `CURATE_EVENTS_FILE` | unset |
//! | `CURATE_QUALITY_CHECKS` | `true` |

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const SOURCE_DIR_VAR: &str = "CURATE_SOURCE_DIR";
pub const OUTPUT_DIR_VAR: &str = "CURATE_OUTPUT_DIR";
pub const EVENTS_FILE_VAR: &str = "CURATE_EVENTS_FILE";
pub const QUALITY_CHECKS_VAR: &str = "CURATE_QUALITY_CHECKS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root holding `source_crm/` and `source_erp/`.
    pub source_dir: PathBuf,
    /// Directory of the curated CSV tables.
    pub output_dir: PathBuf,
    /// JSON-lines file receiving run events.
    pub events_file: Option<PathBuf>,
    pub quality_checks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("datasets"),
            output_dir: PathBuf::from("curated"),
            events_file: None,
            quality_checks: true,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let quality_checks = match value(QUALITY_CHECKS_VAR) {
            Some(raw) => parse_bool(QUALITY_CHECKS_VAR, &raw)?,
            None => defaults.quality_checks,
        };

        Ok(Self {
            source_dir: value(SOURCE_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.source_dir),
            output_dir: value(OUTPUT_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.output_dir),
            events_file: value(EVENTS_FILE_VAR).map(PathBuf::from),
            quality_checks,
        })
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_events_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.events_file = Some(path.into());
        self
    }

    pub fn with_quality_checks(mut self, enabled: bool) -> Self {
        self.quality_checks = enabled;
        self
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source_dir, PathBuf::from("datasets"));
        assert!(config.quality_checks);
    }

    #[test]
    fn test_values_from_environment() {
        let config = Config::from_lookup(lookup(&[
            (SOURCE_DIR_VAR, "/data/raw"),
            (OUTPUT_DIR_VAR, "/data/silver"),
            (EVENTS_FILE_VAR, "/var/log/curate.jsonl"),
            (QUALITY_CHECKS_VAR, "No"),
        ]))
        .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("/data/raw"));
        assert_eq!(config.output_dir, PathBuf::from("/data/silver"));
        assert_eq!(config.events_file, Some(PathBuf::from("/var/log/curate.jsonl")));
        assert!(!config.quality_checks);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_lookup(lookup(&[(SOURCE_DIR_VAR, "  "), (EVENTS_FILE_VAR, "")])).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("datasets"));
        assert_eq!(config.events_file, None);
    }

    #[test]
    fn test_invalid_boolean() {
        let err = Config::from_lookup(lookup(&[(QUALITY_CHECKS_VAR, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(QUALITY_CHECKS_VAR));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_output_dir("out")
            .with_events_file("events.jsonl")
            .with_quality_checks(false);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.events_file, Some(PathBuf::from("events.jsonl")));
        assert!(!config.quality_checks);
    }
}
