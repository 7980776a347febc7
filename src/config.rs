//! Runtime configuration parsed from environment variables.
//!
//! The binary loads `.env` with `dotenvy` before calling these. Tunables fall
//! back to typed defaults; only the API base URL is required, and only when
//! talking to a real backend.

use canvas::consts::{CONTENT_DEBOUNCE_MS, GEOMETRY_DEBOUNCE_MS};
use canvas::dirty::DebounceWindows;

pub const DEFAULT_SYNC_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Debounce and queue tuning for the sync worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub windows: DebounceWindows,
    /// Bounded command queue capacity between a board session and its worker.
    pub queue_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { windows: DebounceWindows::default(), queue_capacity: DEFAULT_SYNC_QUEUE_CAPACITY }
    }
}

impl SyncConfig {
    /// - `GEOMETRY_DEBOUNCE_MS`: default 2000
    /// - `CONTENT_DEBOUNCE_MS`: default 500
    /// - `SYNC_QUEUE_CAPACITY`: default 1024, at least 1
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            windows: DebounceWindows {
                geometry_ms: env_parse("GEOMETRY_DEBOUNCE_MS", GEOMETRY_DEBOUNCE_MS),
                content_ms: env_parse("CONTENT_DEBOUNCE_MS", CONTENT_DEBOUNCE_MS),
            },
            queue_capacity: env_parse("SYNC_QUEUE_CAPACITY", DEFAULT_SYNC_QUEUE_CAPACITY).max(1),
        }
    }
}

/// Connection settings for the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// URLs under this prefix are assets the store owns, in addition to the
    /// ones uploaded through this process.
    pub asset_url_prefix: Option<String>,
}

impl ApiConfig {
    /// Required:
    /// - `MOODBOARD_API_URL`
    ///
    /// Optional:
    /// - `MOODBOARD_API_TOKEN`: sent as a bearer token
    /// - `MOODBOARD_API_TIMEOUT_SECS`: default 30
    /// - `MOODBOARD_ASSET_URL_PREFIX`: URL prefix of stored assets
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the URL is unset or blank, and
    /// [`ConfigError::Invalid`] when it is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("MOODBOARD_API_URL").unwrap_or_default();
        let base_url = parse_base_url(&raw)?;
        let token = std::env::var("MOODBOARD_API_TOKEN").into_iter().find(|t| !t.trim().is_empty());
        let timeout_secs = env_parse("MOODBOARD_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS);
        let asset_url_prefix =
            std::env::var("MOODBOARD_ASSET_URL_PREFIX").into_iter().map(|p| p.trim().to_owned()).find(|p| !p.is_empty());
        Ok(Self { base_url, token, timeout_secs, asset_url_prefix })
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Missing { var: "MOODBOARD_API_URL" });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid { var: "MOODBOARD_API_URL", value: raw.to_owned() });
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
