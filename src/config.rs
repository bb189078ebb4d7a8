//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "OSCAR_PARTY_CONFIG_PATH";
const DEFAULT_EVENT_CAPACITY: usize = 64;
const DEFAULT_SYNC_ERROR_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Directory of the file-backed local cache; `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,
    /// Buffer size of the event broadcast channels.
    pub event_capacity: usize,
    /// Number of recent remote failures kept for `/sync/errors`.
    pub sync_error_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        cache_dir = ?app_config.cache_dir,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            sync_error_capacity: DEFAULT_SYNC_ERROR_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    cache_dir: Option<PathBuf>,
    event_capacity: Option<usize>,
    sync_error_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: value.cache_dir,
            event_capacity: value
                .event_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.event_capacity),
            sync_error_capacity: value
                .sync_error_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sync_error_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str(r#"{"cache_dir":"data/cache"}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.cache_dir, Some(PathBuf::from("data/cache")));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.sync_error_capacity, DEFAULT_SYNC_ERROR_CAPACITY);
    }

    #[test]
    fn zero_capacities_fall_back_to_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"event_capacity":0,"sync_error_capacity":3}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.sync_error_capacity, 3);
    }
}
