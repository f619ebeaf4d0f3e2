use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
    #[serde(default = "default_deep_fetch")]
    pub deep_fetch: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_page_timeout_secs() -> u64 {
    120 // the page GET plus the whole detail fan-out
}

fn default_detail_concurrency() -> usize {
    10
}

fn default_deep_fetch() -> bool {
    true
}

fn default_tracing_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            page_timeout_secs: default_page_timeout_secs(),
            detail_concurrency: default_detail_concurrency(),
            deep_fetch: default_deep_fetch(),
            tracing_level: default_tracing_level(),
        }
    }
}

impl Config {
    /// Loads data/config.yaml when present, otherwise starts from defaults.
    /// Environment variables override either.
    pub fn load() -> Result<Self> {
        let config_path = "data/config.yaml";

        let mut config: Config = if let Ok(config_str) = fs::read_to_string(config_path) {
            serde_yaml::from_str(&config_str)?
        } else {
            Config::default()
        };

        if let Ok(user_agent) = env::var("USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout
                .parse()
                .context("Failed to parse REQUEST_TIMEOUT_SECS environment variable")?;
        }

        if let Ok(timeout) = env::var("PAGE_TIMEOUT_SECS") {
            config.page_timeout_secs = timeout
                .parse()
                .context("Failed to parse PAGE_TIMEOUT_SECS environment variable")?;
        }

        if let Ok(concurrency) = env::var("DETAIL_CONCURRENCY") {
            config.detail_concurrency = concurrency
                .parse()
                .context("Failed to parse DETAIL_CONCURRENCY environment variable")?;
        }

        if let Ok(deep_fetch) = env::var("DEEP_FETCH") {
            config.deep_fetch = deep_fetch
                .parse()
                .context("Failed to parse DEEP_FETCH environment variable")?;
        }

        if let Ok(tracing_level) = env::var("TRACING_LEVEL") {
            config.tracing_level = tracing_level;
        }

        if config.detail_concurrency == 0 {
            anyhow::bail!("detail_concurrency must be at least 1");
        }

        Ok(config)
    }

    pub fn create_default() -> Result<()> {
        fs::create_dir_all("data")?;

        let config_str = serde_yaml::to_string(&Config::default())?;
        fs::write("data/config.yaml", config_str)?;
        Ok(())
    }
}
