use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the ledger API.
    pub api_url: String,
    /// Orders requested per side when listing a book.
    pub order_limit: usize,
    /// Executed orders requested for recent trades.
    pub trade_limit: usize,
    pub request_timeout_secs: u64,
    /// Retries for read calls. Writes are never retried.
    pub read_retries: u32,
    pub retry_base_delay_ms: u64,
    /// How long order confirmation waits for the follow-up book refresh.
    pub refresh_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Search results probed for market activity.
    pub activity_probe_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            order_limit: 50,
            trade_limit: 20,
            request_timeout_secs: 30,
            read_retries: 3,
            retry_base_delay_ms: 500,
            refresh_timeout_ms: 5_000,
            poll_interval_ms: 10_000,
            activity_probe_limit: 10,
        }
    }
}

impl Config {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let config: Config = crate::cache::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow!("api_url must be an http(s) URL, got {}", self.api_url));
        }
        if self.order_limit == 0 {
            return Err(anyhow!("order_limit must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be at least 1"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
