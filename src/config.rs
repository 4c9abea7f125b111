use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub factory_address: Address,
    pub database_url: String,
    pub redis_url: Option<String>,
    /// First block scanned when no cursor has been persisted yet.
    pub start_block: u64,
    pub poll_interval: Duration,
    pub max_blocks_per_tick: u64,
    pub block_delay: Duration,
    pub rpc_timeout: Duration,
    pub rpc_max_retries: u32,
    pub rpc_retry_base_delay: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let json_rpc_urls = match std::env::var("JSON_RPC_URLS") {
            Ok(urls) => urls,
            Err(_) => std::env::var("JSON_RPC_URL")
                .context("JSON_RPC_URLS (or JSON_RPC_URL) must be set in .env")?,
        };
        let json_rpc_urls = parse_url_list(&json_rpc_urls);
        if json_rpc_urls.is_empty() {
            anyhow::bail!("JSON_RPC_URLS contains no usable URL");
        }

        let factory_address_str =
            std::env::var("FACTORY_ADDRESS").context("FACTORY_ADDRESS must be set in .env")?;
        let factory_address = Address::from_str(factory_address_str.trim())
            .context("Invalid FACTORY_ADDRESS format")?;

        let database_url = Self::database_url_from_env();

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Config {
            json_rpc_urls,
            factory_address,
            database_url,
            redis_url,
            start_block: env_or("START_BLOCK", 0)?,
            poll_interval: Duration::from_millis(env_or("POLL_INTERVAL_MS", 5_000)?),
            max_blocks_per_tick: env_or("MAX_BLOCKS_PER_TICK", 50)?,
            block_delay: Duration::from_millis(env_or("BLOCK_DELAY_MS", 100)?),
            rpc_timeout: Duration::from_secs(env_or("RPC_TIMEOUT_SECS", 30)?),
            rpc_max_retries: env_or("RPC_MAX_RETRIES", 3)?,
            rpc_retry_base_delay: Duration::from_millis(env_or("RPC_RETRY_BASE_DELAY_MS", 500)?),
            breaker_threshold: env_or("BREAKER_THRESHOLD", 10)?,
            breaker_cooldown: Duration::from_secs(env_or("BREAKER_COOLDOWN_SECS", 60)?),
        })
    }

    /// Database location alone, for tools that never talk to the chain.
    pub fn database_url_from_env() -> String {
        dotenv::dotenv().ok();
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./launches.db".to_string())
    }

    /// Defaults for everything except the endpoints, used by tools and tests
    /// that build a config without touching the environment.
    pub fn new(json_rpc_urls: Vec<String>, factory_address: Address) -> Self {
        Config {
            json_rpc_urls,
            factory_address,
            database_url: "sqlite:./launches.db".to_string(),
            redis_url: None,
            start_block: 0,
            poll_interval: Duration::from_millis(5_000),
            max_blocks_per_tick: 50,
            block_delay: Duration::from_millis(100),
            rpc_timeout: Duration::from_secs(30),
            rpc_max_retries: 3,
            rpc_retry_base_delay: Duration::from_millis(500),
            breaker_threshold: 10,
            breaker_cooldown: Duration::from_secs(60),
        }
    }
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {value}")),
        Err(_) => Ok(default),
    }
}
