use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{deletion::DEFAULT_REDIRECT_DELAY, tags::DEFAULT_TAG_PREVIEW_LIMIT};

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid store url '{url}': {source}")]
    InvalidStoreUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("store url '{0}' must use http or https")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub redirect_delay_ms: u64,
    pub tag_preview_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:54321".into(),
            api_key: None,
            access_token: None,
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY.as_millis() as u64,
            tag_preview_limit: DEFAULT_TAG_PREVIEW_LIMIT,
        }
    }
}

/// Keys accepted in `client.toml`; anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    store_url: Option<String>,
    api_key: Option<String>,
    access_token: Option<String>,
    redirect_delay_ms: Option<u64>,
    tag_preview_limit: Option<usize>,
}

impl Settings {
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn store_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.store_url.trim()).map_err(|source| {
            ConfigError::InvalidStoreUrl {
                url: self.store_url.clone(),
                source,
            }
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ConfigError::UnsupportedScheme(self.store_url.clone())),
        }
    }

    /// Layers the optional file contents and then environment overrides over the defaults.
    pub fn from_sources(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(raw) = file {
            match toml::from_str::<FileSettings>(raw) {
                Ok(file_cfg) => settings.apply_file(file_cfg),
                Err(err) => warn!("config: ignoring unreadable {SETTINGS_FILE}: {err}"),
            }
        }

        if let Some(v) = env("CONTENT_STORE_URL") {
            settings.store_url = v;
        }
        if let Some(v) = env("APP__STORE_URL") {
            settings.store_url = v;
        }

        if let Some(v) = env("CONTENT_STORE_API_KEY") {
            settings.api_key = Some(v);
        }
        if let Some(v) = env("APP__API_KEY") {
            settings.api_key = Some(v);
        }

        if let Some(v) = env("CONTENT_STORE_ACCESS_TOKEN") {
            settings.access_token = Some(v);
        }

        if let Some(v) = env("APP__REDIRECT_DELAY_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                settings.redirect_delay_ms = parsed;
            }
        }
        if let Some(v) = env("APP__TAG_PREVIEW_LIMIT") {
            if let Ok(parsed) = v.parse::<usize>() {
                settings.tag_preview_limit = parsed;
            }
        }

        settings
    }

    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.store_url {
            self.store_url = v;
        }
        if file_cfg.api_key.is_some() {
            self.api_key = file_cfg.api_key;
        }
        if file_cfg.access_token.is_some() {
            self.access_token = file_cfg.access_token;
        }
        if let Some(v) = file_cfg.redirect_delay_ms {
            self.redirect_delay_ms = v;
        }
        if let Some(v) = file_cfg.tag_preview_limit {
            self.tag_preview_limit = v;
        }
    }
}

/// Reads `path` (when present) and the process environment.
pub fn load_settings_from(path: &Path) -> Settings {
    let raw = fs::read_to_string(path).ok();
    Settings::from_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
