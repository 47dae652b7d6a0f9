use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::debug;

use crate::config::schema::Settings;
use crate::error::ConfigError;

/// Environment variable naming a JSON settings file.
pub const CONFIG_PATH_ENV: &str = "FACELESS_CONFIG";

/// Environment variables consulted for the API base URL, in priority order.
pub const API_URL_ENVS: [&str; 2] = ["FACELESS_API_URL", "VITE_API_URL"];

/// Loads settings: defaults, then the JSON file (explicit `path` or
/// `FACELESS_CONFIG`), then environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path: Option<PathBuf> = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    let mut settings = match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
                path: path.clone(),
                source: e,
            })?;
            debug!("Loading settings from {}", path.display());
            parse(&content)?
        }
        None => Settings::default(),
    };

    apply_env(&mut settings, |key| std::env::var(key).ok());
    validate_settings(&settings)?;

    Ok(settings)
}

/// Parses and validates settings JSON without consulting the environment.
pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    let settings = parse(content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn parse(content: &str) -> Result<Settings, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_env<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let api_url = API_URL_ENVS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty());

    if let Some(url) = api_url {
        debug!("API base URL overridden from environment: {}", url);
        settings.api_base_url = url;
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    match Url::parse(&settings.api_base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(ConfigError::Validation {
                message: format!(
                    "API base URL must use http or https, got '{}'",
                    url.scheme()
                ),
            });
        }
        Err(e) => {
            return Err(ConfigError::Validation {
                message: format!("Invalid API base URL '{}': {}", settings.api_base_url, e),
            });
        }
    }

    if settings.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "pollIntervalSecs must be greater than zero".to_string(),
        });
    }

    if settings.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "requestTimeoutSecs must be greater than zero".to_string(),
        });
    }

    let (min, max) = settings.duration_bounds();
    if min == 0 || min > max {
        return Err(ConfigError::Validation {
            message: format!("Invalid duration bounds {}-{}s", min, max),
        });
    }

    if !(min..=max).contains(&settings.default_duration_secs) {
        return Err(ConfigError::Validation {
            message: format!(
                "defaultDurationSecs {} is outside {}-{}s",
                settings.default_duration_secs, min, max
            ),
        });
    }

    Ok(())
}
