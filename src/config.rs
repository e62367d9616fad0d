//! Environment-driven configuration

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LANGUAGE: &str = "Korean";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Settings for the generative service client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API credential. `None` is allowed at startup; every call then fails
    /// with a configuration error.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Language the model is asked to answer in
    pub language: String,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank("GEMINI_API_KEY").or_else(|| non_blank("API_KEY"));

        let port = match non_blank("TUBEMORPH_PORT") {
            Some(raw) => parse_number("TUBEMORPH_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let request_timeout = match non_blank("TUBEMORPH_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("TUBEMORPH_REQUEST_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            port,
            llm: LlmConfig {
                api_key,
                model: non_blank("TUBEMORPH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: non_blank("TUBEMORPH_GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                language: non_blank("TUBEMORPH_LANGUAGE")
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                request_timeout,
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}
