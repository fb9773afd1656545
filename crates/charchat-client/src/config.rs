use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const ENV_API_BASE: &str = "CHARCHAT_API_BASE";
pub const ENV_TOKEN_FILE: &str = "CHARCHAT_TOKEN_FILE";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const TOKEN_FILE_NAME: &str = "tokens.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_file: PathBuf,
    /// `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

/// Optional `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub token_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token_file: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            token_file: token_file.into(),
            request_timeout: None,
        }
    }

    /// Flag, then environment, then config file, then defaults.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ClientError> {
        Self::resolve_with(overrides, non_empty_env)
    }

    pub fn resolve_with(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClientError> {
        let file = match overrides.config_file.as_deref() {
            Some(path) => read_file_config(path)?,
            None => {
                let path = default_config_dir().join(CONFIG_FILE_NAME);
                if path.exists() {
                    read_file_config(&path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        let raw_base = overrides
            .base_url
            .or_else(|| env(ENV_API_BASE))
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let token_file = overrides
            .token_file
            .or_else(|| env(ENV_TOKEN_FILE).map(PathBuf::from))
            .or(file.token_file)
            .unwrap_or_else(|| default_config_dir().join(TOKEN_FILE_NAME));

        Ok(Self {
            base_url: normalize_base_url(&raw_base)?,
            token_file,
            request_timeout: file
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("charchat")
}

pub fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::Config("base url must not be empty".to_string()));
    }
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(ClientError::Config(format!(
            "base url must use http:// or https://: {trimmed}"
        )));
    };
    if scheme != "http" && scheme != "https" {
        return Err(ClientError::Config(format!(
            "base url must use http:// or https://: {trimmed}"
        )));
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ClientError::Config(format!(
            "base url must include a host: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

fn read_file_config(path: &Path) -> Result<FileConfig, ClientError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ClientError::Config(format!("failed reading {}: {err}", path.display()))
    })?;
    toml::from_str(&raw)
        .map_err(|err| ClientError::Config(format!("failed parsing {}: {err}", path.display())))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
