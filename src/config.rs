//! Runtime configuration read from the process environment.
//!
//! The binary calls `dotenvy::dotenv()` first, so a `.env` file works too:
//!
//! ```text
//! API_BASE_URL=https://api.example.com
//! APP_ENV=staging
//! API_TOKEN=...
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::{HeaderName, HeaderValue};

use crate::constants::APP_NAME;
use crate::fetch::auth::{BearerAuth, TokenStore};
use crate::fetch::{ApiClient, BasicClient, DEFAULT_TIMEOUT, LogResponses};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_LOG_FILE: &str = "logs/rest_loader.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => bail!("unknown APP_ENV '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub app_name: String,
    pub environment: Environment,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub log_file_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => Environment::Development,
        };
        let timeout_secs = match get("API_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("API_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"))?,
            None => DEFAULT_TIMEOUT.as_secs(),
        };
        if timeout_secs == 0 {
            bail!("API_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            base_url: get("API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            app_name: get("APP_NAME").unwrap_or_else(|| APP_NAME.to_string()),
            environment,
            api_token: get("API_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        })
    }

    /// An [`ApiClient`] for this configuration, reading its bearer token from
    /// `tokens`. `API_TOKEN`, when set, is stored into `tokens` first.
    pub fn api_client(&self, tokens: TokenStore) -> Result<ApiClient> {
        if let Some(token) = &self.api_token {
            tokens.set(token.clone());
        }
        let transport = BasicClient::with_timeout(self.timeout).context("failed to build HTTP client")?;
        let env = HeaderValue::from_str(self.environment.as_str())
            .context("environment name is not a valid header value")?;

        Ok(ApiClient::builder(self.base_url.clone())
            .transport(transport)
            .default_header(HeaderName::from_static("x-app-env"), env)
            .request_interceptor(BearerAuth::new(tokens))
            .response_interceptor(LogResponses)
            .build())
    }
}
