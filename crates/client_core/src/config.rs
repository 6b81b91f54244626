use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use shared::protocol::DEFAULT_PAGE_SIZE;
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_CONFIG_FILE: &str = "transfers.toml";
const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid api base url '{value}': {reason}")]
    BaseUrl { value: String, reason: String },
    #[error("invalid page size '{0}'")]
    PageSize(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: Url,
    pub auth_token: Option<String>,
    pub page_size: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default api url is valid"),
            auth_token: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    page_size: Option<u32>,
}

impl ClientSettings {
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, SettingsError> {
        self.api_base_url = normalize_base_url(raw)?;
        Ok(self)
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = if token.trim().is_empty() {
            None
        } else {
            Some(token.trim().to_string())
        };
        self
    }
}

/// Defaults, then `transfers.toml` (or `APP__CONFIG_PATH`), then environment overrides.
pub fn load_settings() -> Result<ClientSettings, SettingsError> {
    let path = std::env::var("APP__CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let file = read_file_settings(&path)?;
    apply_overrides(ClientSettings::default(), file, |name| std::env::var(name).ok())
}

fn read_file_settings(path: &Path) -> Result<Option<FileSettings>, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    toml::from_str::<FileSettings>(&raw)
        .map(Some)
        .map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn apply_overrides(
    mut settings: ClientSettings,
    file: Option<FileSettings>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, SettingsError> {
    if let Some(file) = file {
        if let Some(v) = file.api_base_url {
            settings.api_base_url = normalize_base_url(&v)?;
        }
        if let Some(v) = file.auth_token {
            settings = settings.with_auth_token(v);
        }
        if let Some(v) = file.page_size {
            settings.page_size = validate_page_size(v, &v.to_string())?;
        }
    }

    for name in ["API_BASE_URL", "APP__API_BASE_URL"] {
        if let Some(v) = env(name) {
            settings.api_base_url = normalize_base_url(&v)?;
        }
    }

    for name in ["API_TOKEN", "APP__API_TOKEN"] {
        if let Some(v) = env(name) {
            settings = settings.with_auth_token(v);
        }
    }

    if let Some(v) = env("APP__PAGE_SIZE") {
        let parsed = v
            .trim()
            .parse::<u32>()
            .map_err(|_| SettingsError::PageSize(v.clone()))?;
        settings.page_size = validate_page_size(parsed, &v)?;
    }

    Ok(settings)
}

fn validate_page_size(value: u32, raw: &str) -> Result<u32, SettingsError> {
    if value == 0 || value > MAX_PAGE_SIZE {
        return Err(SettingsError::PageSize(raw.to_string()));
    }
    Ok(value)
}

/// Trims, requires an http(s) scheme and guarantees a trailing slash so relative joins nest.
pub fn normalize_base_url(raw: &str) -> Result<Url, SettingsError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| SettingsError::BaseUrl {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
