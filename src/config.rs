//! Server configuration, read from the environment (and `.env` when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration for the upload service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Flat directory holding uploads and processed copies.
    pub upload_folder: PathBuf,
    /// Files older than this are deleted by the sweeper.
    pub cleanup_interval: Duration,
    /// How often the sweeper runs.
    pub sweep_period: Duration,
    pub host: String,
    pub port: u16,
    /// Upper bound on a request body, in bytes.
    pub max_content_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_folder: PathBuf::from("uploads"),
            cleanup_interval: Duration::from_secs(3600),
            sweep_period: Duration::from_secs(600),
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_content_length: 16 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source; unset
    /// variables fall back to [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let upload_folder = lookup("UPLOAD_FOLDER")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_folder);

        let cleanup_secs: Option<u64> = parse_var(&lookup, "CLEANUP_INTERVAL_SECS", "a number of seconds")?;
        let sweep_secs: Option<u64> = parse_var(&lookup, "SWEEP_PERIOD_SECS", "a number of seconds")?;
        let port: Option<u16> = parse_var(&lookup, "PORT", "a TCP port")?;
        let max_mb: Option<usize> = parse_var(&lookup, "MAX_CONTENT_LENGTH_MB", "a size in megabytes")?;

        if sweep_secs == Some(0) {
            return Err(ConfigError::Invalid {
                var: "SWEEP_PERIOD_SECS",
                expected: "greater than zero",
                value: "0".into(),
            });
        }

        Ok(Self {
            upload_folder,
            cleanup_interval: cleanup_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            sweep_period: sweep_secs.map(Duration::from_secs).unwrap_or(defaults.sweep_period),
            host: lookup("HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.host),
            port: port.unwrap_or(defaults.port),
            max_content_length: max_mb
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_content_length),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Invalid { var, expected, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn reads_every_variable() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("UPLOAD_FOLDER", "/tmp/xmp"),
            ("CLEANUP_INTERVAL_SECS", "120"),
            ("SWEEP_PERIOD_SECS", "30"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("MAX_CONTENT_LENGTH_MB", "2"),
        ]))
        .unwrap();

        assert_eq!(cfg.upload_folder, PathBuf::from("/tmp/xmp"));
        assert_eq!(cfg.cleanup_interval, Duration::from_secs(120));
        assert_eq!(cfg.sweep_period, Duration::from_secs(30));
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.max_content_length, 2 * 1024 * 1024);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "PORT",
                expected: "a TCP port",
                value: "eighty".into()
            }
        );
        assert!(Config::from_lookup(lookup_from(&[("CLEANUP_INTERVAL_SECS", "-1")])).is_err());
    }

    #[test]
    fn rejects_zero_sweep_period() {
        assert!(Config::from_lookup(lookup_from(&[("SWEEP_PERIOD_SECS", "0")])).is_err());
    }
}
