use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Deserialize;

use crate::assistant::{API_KEY_ENV, AssistantConfig};

pub const MODEL_ENV: &str = "LLM_MODEL";
pub const CHAT_URL_ENV: &str = "LLM_API_URL";
pub const RESPONSES_URL_ENV: &str = "WEB_SEARCH_API_URL";
pub const PORT_ENV: &str = "PORT";
pub const DEBUG_ENV: &str = "DEBUG";
pub const CONFIG_PATH_ENV: &str = "PAGEASK_CONFIG";

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub model: Option<String>,
    pub chat_url: Option<String>,
    pub responses_url: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub chat_url: Option<String>,
    pub responses_url: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
}

/// Fully resolved process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub assistant: AssistantConfig,
    pub port: u16,
    pub debug: bool,
}

impl Settings {
    /// Resolves CLI > environment > profile > defaults. The profile file is
    /// read only when a profile name is given.
    pub fn resolve(profile: Option<&str>, overrides: &Overrides) -> Result<Self, String> {
        let profile = match profile {
            Some(name) => load_profile(name)?,
            None => ProfileConfig::default(),
        };
        Self::resolve_with(&profile, |key| env_value(key), overrides)
    }

    pub fn resolve_with(
        profile: &ProfileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, String> {
        let defaults = AssistantConfig::default();

        let model = overrides
            .model
            .clone()
            .or_else(|| env(MODEL_ENV))
            .or_else(|| profile.model.clone())
            .unwrap_or(defaults.model);
        let chat_url = overrides
            .chat_url
            .clone()
            .or_else(|| env(CHAT_URL_ENV))
            .or_else(|| profile.chat_url.clone())
            .unwrap_or(defaults.chat_url);
        let responses_url = overrides
            .responses_url
            .clone()
            .or_else(|| env(RESPONSES_URL_ENV))
            .or_else(|| profile.responses_url.clone())
            .unwrap_or(defaults.responses_url);

        validate_endpoint("chat endpoint", &chat_url)?;
        validate_endpoint("responses endpoint", &responses_url)?;

        let port = match overrides.port {
            Some(port) => port,
            None => match env(PORT_ENV) {
                Some(raw) => raw
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid {PORT_ENV} '{raw}'. Expected a port number."))?,
                None => profile.port.unwrap_or(DEFAULT_PORT),
            },
        };
        if port == 0 {
            return Err("Port must be greater than zero.".to_string());
        }

        let debug = match overrides.debug {
            Some(debug) => debug,
            None => match env(DEBUG_ENV) {
                Some(raw) => parse_bool(&raw).ok_or_else(|| {
                    format!("Invalid {DEBUG_ENV} '{raw}'. Expected true or false.")
                })?,
                None => profile.debug.unwrap_or(false),
            },
        };

        Ok(Self {
            assistant: AssistantConfig {
                api_key: env(API_KEY_ENV),
                model,
                chat_url,
                responses_url,
            },
            port,
            debug,
        })
    }
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Checks the config file, and one profile in it when named.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    let selected: Vec<(&String, &ProfileConfig)> = match profile {
        Some(name) => {
            let (key, value) = profiles.get_key_value(name).ok_or_else(|| {
                format!(
                    "Profile '{}' not found in config file '{}'.",
                    name,
                    path.display()
                )
            })?;
            vec![(key, value)]
        }
        None => profiles.iter().collect(),
    };

    for (name, profile) in selected {
        for (label, url) in [
            ("chat_url", &profile.chat_url),
            ("responses_url", &profile.responses_url),
        ] {
            if let Some(url) = url {
                validate_endpoint(label, url)
                    .map_err(|err| format!("Profile '{name}': {err}"))?;
            }
        }
        if profile.port == Some(0) {
            return Err(format!("Profile '{name}': port must be greater than zero."));
        }
    }

    Ok(path)
}

fn read_profiles(path: &Path) -> Result<HashMap<String, ProfileConfig>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;

    let config: ConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })
}

fn config_path() -> Result<PathBuf, String> {
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = env_value("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("pageask").join("config.toml"));
    }

    let home = env::var("HOME").map_err(|_| {
        format!("Cannot resolve config path: set {CONFIG_PATH_ENV} or HOME/XDG_CONFIG_HOME.")
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("pageask")
        .join("config.toml"))
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn validate_endpoint(label: &str, raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|err| format!("Invalid {label} '{raw}': {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "Invalid {label} '{raw}': unsupported scheme '{scheme}'."
        )),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
