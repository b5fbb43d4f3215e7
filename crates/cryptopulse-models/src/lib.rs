pub mod analysis;
pub mod coin;
pub mod config;
pub mod market;

pub use analysis::{AnalysisResponse, HealthStatus};
pub use coin::{CoinSymbol, InvalidCoinSymbol};
pub use config::{
    AnalystConfig, CacheConfig, Credentials, ExchangeApiConfig, PriceApiConfig, PulseConfig,
    ServerConfig, SocialApiConfig, UpstreamConfig,
};
pub use market::{
    ActivityLevel, MarketData, MarketSnapshot, PriceSnapshot, SocialPost, SocialSnapshot,
};
