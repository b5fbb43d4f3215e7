pub mod binance;
pub mod coingecko;
pub mod connector;
pub mod error;
pub mod http;
pub mod openai;
pub mod prompts;
pub mod reddit;
pub mod retry;
pub mod source;

pub mod test_support;

pub use connector::HttpConnector;
pub use error::UpstreamError;
pub use retry::{with_retry, RetryPolicy};
pub use source::{
    Analyst, ExchangeSource, PriceSource, SocialSource, UpstreamClients, UpstreamConnector,
};
