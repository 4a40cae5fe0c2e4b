//! TOML configuration.
//!
//! ```toml
//! [api]
//! base_url = "https://abc123.execute-api.ap-south-1.amazonaws.com/dev"
//!
//! [auth]
//! issuer = "https://cognito-idp.ap-south-1.amazonaws.com/ap-south-1_AbCdEf"
//! client_id = "45d44vo7tuap8rtsm6vpar8kvd"
//! region = "ap-south-1"
//! redirect_url = "https://summarizer.example.com"
//!
//! [polling]
//! grace_delay_secs = 60
//! retry_interval_secs = 8
//! max_attempts = 75
//!
//! [session]
//! path = "./data/session.json"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `client_id` (access tokens) or `aud` (ID tokens) claim.
    pub client_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Override for the identity provider's user-info endpoint.
    #[serde(default)]
    pub user_info_endpoint: Option<String>,
    /// Sign-in page users are sent to when no valid session exists.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

impl AuthConfig {
    pub fn user_info_url(&self) -> String {
        self.user_info_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com/", self.region))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_grace_delay_secs")]
    pub grace_delay_secs: u64,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    /// Summary queries before giving up; `0` polls until a result arrives.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            grace_delay_secs: default_grace_delay_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_grace_delay_secs() -> u64 {
    60
}
fn default_retry_interval_secs() -> u64 {
    8
}
fn default_max_attempts() -> u32 {
    75
}

impl PollingConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_secs(self.grace_delay_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn attempt_limit(&self) -> Option<u32> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from("./data/session.json")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate api
    let base = config.api.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!("api.base_url must be an http(s) URL, got '{}'", base);
    }
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    // Validate auth
    if config.auth.issuer.trim().is_empty() {
        anyhow::bail!("auth.issuer must not be empty");
    }
    if config.auth.client_id.trim().is_empty() {
        anyhow::bail!("auth.client_id must not be empty");
    }

    // Validate polling
    if config.polling.retry_interval_secs == 0 {
        anyhow::bail!("polling.retry_interval_secs must be > 0");
    }

    Ok(config)
}
