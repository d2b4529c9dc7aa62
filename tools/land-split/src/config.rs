use std::time::Duration;

use landdeal_common::split::{SplitConfig, DEFAULT_TOLERANCE};
use rust_decimal::Decimal;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Connection and validation settings shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Base URL of the land-deals backend (without the `/api` suffix).
    #[arg(long, env = "LAND_DEALS_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Bearer token sent with every request.
    #[arg(long, env = "LAND_DEALS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Allowed deviation for percentage and amount totals.
    #[arg(long, env = "LAND_SPLIT_TOLERANCE", default_value_t = DEFAULT_TOLERANCE, global = true)]
    pub tolerance: Decimal,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// How long deal rosters stay cached, in seconds (0 disables caching).
    #[arg(long, env = "LAND_SPLIT_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS, global = true)]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("api url must start with http:// or https://, got {0:?}")]
    InvalidApiUrl(String),
    #[error("tolerance must not be negative, got {0}")]
    NegativeTolerance(Decimal),
    #[error("timeout must be at least one second")]
    ZeroTimeout,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub split: SplitConfig,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Config {
    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let api_url = args.api_url.trim().trim_end_matches('/').to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(args.api_url));
        }
        if args.tolerance.is_sign_negative() && !args.tolerance.is_zero() {
            return Err(ConfigError::NegativeTolerance(args.tolerance));
        }
        if args.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let token = args
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(Self {
            api_url,
            token,
            split: SplitConfig {
                tolerance: args.tolerance,
            },
            timeout: Duration::from_secs(args.timeout_secs),
            cache_ttl: Duration::from_secs(args.cache_ttl_secs),
        })
    }

    /// Defaults pointing at `api_url`, for tests and embedding.
    pub fn for_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            split: SplitConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}
