use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the CryptoPulse service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PulseConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

/// Configuration for the in-memory analysis cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an analysis stays servable after insertion.
    pub ttl_seconds: u64,
    /// Maximum number of cached coins.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_capacity: 1000,
        }
    }
}

/// Settings shared by all upstream clients, plus per-service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connect + read timeout for a single call.
    pub timeout_seconds: u64,
    /// Attempts made by the retrying fetcher before giving up.
    pub max_attempts: u32,
    /// Fixed pause between retry attempts.
    pub retry_delay_ms: u64,
    pub pool_max_idle_per_host: usize,
    pub price: PriceApiConfig,
    pub exchange: ExchangeApiConfig,
    pub social: SocialApiConfig,
    pub analyst: AnalystConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_attempts: 3,
            retry_delay_ms: 1000,
            pool_max_idle_per_host: 20,
            price: PriceApiConfig::default(),
            exchange: ExchangeApiConfig::default(),
            social: SocialApiConfig::default(),
            analyst: AnalystConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PriceApiConfig {
    pub base_url: String,
}

impl Default for PriceApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExchangeApiConfig {
    pub base_url: String,
}

impl Default for ExchangeApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SocialApiConfig {
    /// Host serving the OAuth token endpoint.
    pub auth_url: String,
    /// Host serving authenticated API calls.
    pub api_url: String,
    pub subreddit: String,
    /// Posts requested per search.
    pub search_limit: u32,
}

impl Default for SocialApiConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://www.reddit.com".to_string(),
            api_url: "https://oauth.reddit.com".to_string(),
            subreddit: "cryptocurrency".to_string(),
            search_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalystConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
        }
    }
}

/// Upstream credentials. Never read from the config file, only from the
/// process environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub coingecko_api_key: Option<String>,
    pub binance_api_key: Option<String>,
    pub binance_secret_key: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            coingecko_api_key: get("COINGECKO_API_KEY"),
            binance_api_key: get("BINANCE_API_KEY"),
            binance_secret_key: get("BINANCE_SECRET_KEY"),
            reddit_client_id: get("REDDIT_CLIENT_ID"),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET"),
            reddit_user_agent: get("REDDIT_USER_AGENT"),
            openai_api_key: get("OPENAI_API_KEY"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Credentials")
            .field("coingecko_api_key", &mask(&self.coingecko_api_key))
            .field("binance_api_key", &mask(&self.binance_api_key))
            .field("binance_secret_key", &mask(&self.binance_secret_key))
            .field("reddit_client_id", &mask(&self.reddit_client_id))
            .field("reddit_client_secret", &mask(&self.reddit_client_secret))
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("openai_api_key", &mask(&self.openai_api_key))
            .finish()
    }
}
