//! Data models and structures
//!
//! Shared types for styles, credentials, job status and configuration.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A named visual preset offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Display name shown to the user.
    pub title: String,
    /// Opaque value passed to the remote service.
    pub identifier: String,
}

impl Style {
    pub fn new(title: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            identifier: identifier.into(),
        }
    }
}

/// FusionBrain key pair. Both halves must be non-empty.
#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let secret = secret.into();
        if key.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self { key, secret })
    }

    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("X-Key", format!("Key {}", self.key)),
            ("X-Secret", format!("Secret {}", self.secret)),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// Provider-neutral classification of a remote job status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Kandinsky,
    YandexArt,
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kandinsky" | "fusionbrain" => Ok(ProviderKind::Kandinsky),
            "yandex-art" | "yandex" => Ok(ProviderKind::YandexArt),
            other => Err(Error::Config(format!("Unknown image provider: {}", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Kandinsky => write!(f, "kandinsky"),
            ProviderKind::YandexArt => write!(f, "yandex-art"),
        }
    }
}

const DEFAULT_KANDINSKY_API_URL: &str = "https://api-key.fusionbrain.ai";
const DEFAULT_KANDINSKY_STYLES_URL: &str = "https://cdn.fusionbrain.ai/static/styles/key";
const DEFAULT_YANDEX_API_URL: &str = "https://llm.api.cloud.yandex.net";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub kandinsky_api_key: Option<String>,
    pub kandinsky_secret_key: Option<String>,
    pub kandinsky_api_url: String,
    pub kandinsky_styles_url: String,
    pub yandex_folder_id: Option<String>,
    pub yandex_api_key: Option<String>,
    pub yandex_api_url: String,
    pub poll_attempts: u32,
    pub poll_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_provider(None)
    }

    /// Like [`Config::from_env`], with `provider` taking precedence over
    /// `IMAGE_PROVIDER`.
    pub fn from_env_with_provider(provider: Option<ProviderKind>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| match (key, provider) {
            ("IMAGE_PROVIDER", Some(provider)) => Some(provider.to_string()),
            _ => std::env::var(key).ok(),
        })
    }

    /// Build a config from an arbitrary key lookup, validating that the
    /// selected provider has its credentials.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = match non_empty("IMAGE_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::Kandinsky,
        };

        let poll_attempts = match non_empty("POLL_ATTEMPTS") {
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("Invalid POLL_ATTEMPTS: {}", value)))?,
            None => 15,
        };
        let poll_delay = match non_empty("POLL_DELAY_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse::<u64>()
                    .map_err(|_| Error::Config(format!("Invalid POLL_DELAY_SECS: {}", value)))?,
            ),
            None => Duration::from_secs(4),
        };

        let config = Self {
            provider,
            kandinsky_api_key: non_empty("KANDINSKY_API_KEY"),
            kandinsky_secret_key: non_empty("KANDINSKY_SECRET_KEY"),
            kandinsky_api_url: non_empty("KANDINSKY_API_URL")
                .unwrap_or_else(|| DEFAULT_KANDINSKY_API_URL.to_string()),
            kandinsky_styles_url: non_empty("KANDINSKY_STYLES_URL")
                .unwrap_or_else(|| DEFAULT_KANDINSKY_STYLES_URL.to_string()),
            yandex_folder_id: non_empty("YANDEX_FOLDER_ID"),
            yandex_api_key: non_empty("YANDEX_API_KEY"),
            yandex_api_url: non_empty("YANDEX_API_URL")
                .unwrap_or_else(|| DEFAULT_YANDEX_API_URL.to_string()),
            poll_attempts,
            poll_delay,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = match self.provider {
            ProviderKind::Kandinsky => vec![
                ("KANDINSKY_API_KEY", &self.kandinsky_api_key),
                ("KANDINSKY_SECRET_KEY", &self.kandinsky_secret_key),
            ],
            ProviderKind::YandexArt => vec![
                ("YANDEX_FOLDER_ID", &self.yandex_folder_id),
                ("YANDEX_API_KEY", &self.yandex_api_key),
            ],
        };
        for (name, value) in required {
            if value.is_none() {
                return Err(Error::Config(format!("{} not set", name)));
            }
        }
        if self.poll_attempts == 0 {
            return Err(Error::Config("POLL_ATTEMPTS must be positive".to_string()));
        }
        Ok(())
    }
}
