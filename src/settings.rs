use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::media::ApiError;
use crate::tmdb::TMDB_BASE_URL;

pub const ENV_TMDB_TOKEN: &str = "MOVIE_BROWSER_TMDB_TOKEN";
pub const ENV_WATCHMODE_KEY: &str = "MOVIE_BROWSER_WATCHMODE_KEY";
pub const ENV_YOUTUBE_KEY: &str = "MOVIE_BROWSER_YOUTUBE_KEY";
pub const ENV_LANGUAGE: &str = "MOVIE_BROWSER_LANGUAGE";
pub const ENV_REGION: &str = "MOVIE_BROWSER_REGION";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Bearer token for the metadata catalog.
    pub tmdb_token: String,
    pub watchmode_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    /// Comma-separated language preferences, most preferred first.
    pub language: String,
    pub region: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub watchmode_base_url: Option<String>,
    pub youtube_base_url: Option<String>,
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("movie-browser")
                .join("config.json")
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ApiError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Settings from the config file (if any) with environment overrides.
    pub fn load() -> Self {
        let from_file = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|err| {
                warn!(error = %err, "ignoring unreadable config file");
                Self::default()
            }),
            _ => Self::default(),
        };
        from_file.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = lookup(ENV_TMDB_TOKEN) {
            self.tmdb_token = token;
        }
        if let Some(key) = lookup(ENV_WATCHMODE_KEY) {
            self.watchmode_api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_YOUTUBE_KEY) {
            self.youtube_api_key = Some(key);
        }
        if let Some(language) = lookup(ENV_LANGUAGE) {
            self.language = language;
        }
        if let Some(region) = lookup(ENV_REGION) {
            self.region = Some(region);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.tmdb_token.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ApiError::Config(format!(
                "a TMDB bearer token is required (set {} or tmdb_token in the config file)",
                ENV_TMDB_TOKEN
            )))
        }
    }

    pub fn language_tags(&self) -> Vec<String> {
        self.language
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn tmdb_base_url(&self) -> String {
        self.tmdb_base_url
            .clone()
            .unwrap_or_else(|| String::from(TMDB_BASE_URL))
    }

    pub fn watchmode_api_key(&self) -> Option<&str> {
        non_empty(self.watchmode_api_key.as_deref())
    }

    pub fn youtube_api_key(&self) -> Option<&str> {
        non_empty(self.youtube_api_key.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
