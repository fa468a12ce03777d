use std::net::IpAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::gateway::DEFAULT_TIMEOUT;
use crate::history::HistoryScope;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub recommend_api_url: String,
    pub request_timeout: Duration,
    pub history_store_url: String,
    pub history_scope: HistoryScope,
    /// `None` keeps quiz responses in memory.
    pub document_store_url: Option<String>,
    pub require_login: bool,
    /// Loopback by default: the process holds a single shared login session,
    /// so every client that can reach the listener acts as the signed-in user.
    pub host: IpAddr,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let timeout_secs = var("REQUEST_TIMEOUT_SECS", &DEFAULT_TIMEOUT.as_secs().to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            recommend_api_url: var("RECOMMEND_API_URL", "http://127.0.0.1:8000"),
            request_timeout: Duration::from_secs(timeout_secs),
            history_store_url: var("HISTORY_STORE_URL", ".quiz-history"),
            history_scope: var("HISTORY_SCOPE", "user")
                .parse()
                .context("HISTORY_SCOPE is invalid")?,
            document_store_url: lookup("DOCUMENT_STORE_URL").filter(|url| !url.trim().is_empty()),
            require_login: parse_flag(&var("REQUIRE_LOGIN", "true"))
                .context("REQUIRE_LOGIN must be true or false")?,
            host: var("HOST", "127.0.0.1")
                .parse::<IpAddr>()
                .context("HOST must be an IP address")?,
            port: var("PORT", "3000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("'{other}' is not a boolean"),
    }
}
