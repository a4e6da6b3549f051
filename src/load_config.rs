/// `load_config` module: builds the validated [`AutopostConfig`] for a run.
///
/// Settings come from three places, highest precedence first:
/// 1. CLI flags ([`Overrides`])
/// 2. environment variables
/// 3. an optional YAML settings file (no secrets)
///
/// Secrets (`NOTE_EMAIL`, `NOTE_PASSWORD`, `GEMINI_API_KEY`) are only ever read from the
/// environment and are all required; a missing or blank one is a [`ConfigError::MissingEnv`].
///
/// Everything is read and validated exactly once, here. Components receive the finished struct.
use note_autopost_core::config::{AutopostConfig, BrowserConfig, GenerationConfig, PlatformConfig};
use note_autopost_core::contract::{AccountCredentials, PublishStatus};
use note_autopost_core::error::ConfigError;
use note_autopost_core::render::RenderOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const ENV_EMAIL: &str = "NOTE_EMAIL";
pub const ENV_PASSWORD: &str = "NOTE_PASSWORD";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_BASE_URL: &str = "NOTE_BASE_URL";
pub const ENV_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_MODEL: &str = "GEMINI_MODEL";

/// YAML settings file layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub model_id: Option<String>,
    pub publish_status: Option<PublishStatus>,
    pub headless: Option<bool>,
    pub interactive_login: Option<bool>,
    pub topics: Option<Vec<String>>,
    pub author: Option<String>,
    pub base_url: Option<String>,
    pub gemini_api_base: Option<String>,
    pub profile_dir: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub xsrf_cookie: Option<String>,
    pub render: Option<RenderOptions>,
    pub timeouts: TimeoutSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    pub element_secs: Option<u64>,
    pub settle_secs: Option<u64>,
    pub interactive_secs: Option<u64>,
    pub request_secs: Option<u64>,
}

/// Per-invocation CLI flags layered over file and environment settings.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub publish_status: Option<PublishStatus>,
    pub model_id: Option<String>,
    pub headed: bool,
    pub interactive: bool,
}

/// Parse the YAML settings file at `path`.
pub fn read_settings(path: &Path) -> Result<FileSettings, ConfigError> {
    info!(config_path = ?path, "Loading settings from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read settings file");
        ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        }
    })?;
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse settings YAML");
        ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            error!(var = name, "Required environment variable missing");
            Err(ConfigError::MissingEnv(name))
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_url(key: &'static str, url: &str) -> Result<String, ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("`{url}` is not an http(s) URL"),
        })
    }
}

/// Load settings (if `path` is given), merge environment and CLI overrides, and validate.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<AutopostConfig, ConfigError> {
    let file = match path {
        Some(path) => read_settings(path)?,
        None => FileSettings::default(),
    };

    let account = AccountCredentials {
        email: required_env(ENV_EMAIL)?,
        password: required_env(ENV_PASSWORD)?,
    };
    let api_key = required_env(ENV_API_KEY)?;

    let mut generation = GenerationConfig::new(api_key);
    if let Some(model) = overrides
        .model_id
        .clone()
        .or_else(|| optional_env(ENV_MODEL))
        .or(file.model_id)
    {
        generation.model_id = model;
    }
    if generation.model_id.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "model_id",
            reason: "must not be empty".to_string(),
        });
    }
    if let Some(api_base) = optional_env(ENV_API_BASE).or(file.gemini_api_base) {
        generation.api_base = validate_url("gemini_api_base", &api_base)?;
    }
    if let Some(topics) = file.topics {
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(ConfigError::Invalid {
                key: "topics",
                reason: "at least one non-empty topic is required".to_string(),
            });
        }
        generation.topics = topics;
    }

    let mut platform = PlatformConfig::default();
    if let Some(base_url) = optional_env(ENV_BASE_URL).or(file.base_url) {
        platform.base_url = validate_url("base_url", &base_url)?;
    }
    if let Some(author) = file.author {
        platform.author = author;
    }
    if let Some(secs) = file.timeouts.request_secs {
        platform.request_timeout = Duration::from_secs(secs);
        generation.request_timeout = Duration::from_secs(secs);
    }

    let mut browser = BrowserConfig {
        login_url: format!("{}/login", platform.base_url),
        profile_dir: file.profile_dir,
        screenshot_dir: file.screenshot_dir,
        user_agent: file.user_agent,
        ..BrowserConfig::default()
    };
    browser.headless = file.headless.unwrap_or(true) && !overrides.headed;
    browser.interactive_login = overrides.interactive || file.interactive_login.unwrap_or(false);
    if let Some(cookie) = file.xsrf_cookie {
        browser.xsrf_cookie = cookie;
    }
    if let Some(secs) = file.timeouts.element_secs {
        browser.element_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.timeouts.settle_secs {
        browser.settle_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.timeouts.interactive_secs {
        browser.interactive_timeout = Duration::from_secs(secs);
    }

    let publish_status = overrides
        .publish_status
        .or(file.publish_status)
        .unwrap_or_default();

    let config = AutopostConfig {
        account,
        generation,
        browser,
        platform,
        publish_status,
        render: file.render.unwrap_or_default(),
    };
    config.trace_loaded();
    Ok(config)
}
