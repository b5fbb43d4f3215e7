use async_trait::async_trait;
use cryptopulse_models::{CoinSymbol, MarketData, MarketSnapshot, PriceSnapshot, SocialSnapshot};
use tracing::debug;

use crate::error::UpstreamError;

/// Spot price lookup. Mockable for testing.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn price(&self, coin: &CoinSymbol) -> Result<PriceSnapshot, UpstreamError>;

    /// Releases the session. Called once when the owning client set closes.
    async fn close(&self) {}
}

/// 24h exchange ticker lookup.
#[async_trait]
pub trait ExchangeSource: Send + Sync {
    async fn market(&self, coin: &CoinSymbol) -> Result<MarketSnapshot, UpstreamError>;

    async fn close(&self) {}
}

/// Forum search for recent posts about a coin.
#[async_trait]
pub trait SocialSource: Send + Sync {
    async fn social(&self, coin: &CoinSymbol) -> Result<SocialSnapshot, UpstreamError>;

    async fn close(&self) {}
}

/// Language-model commentary over a merged snapshot.
#[async_trait]
pub trait Analyst: Send + Sync {
    async fn analyze(&self, data: &MarketData) -> Result<String, UpstreamError>;

    async fn close(&self) {}
}

/// One session per upstream service, owned by a single orchestrated request.
///
/// `close` consumes the set, so it can be released at most once.
pub struct UpstreamClients {
    pub price: Box<dyn PriceSource>,
    pub exchange: Box<dyn ExchangeSource>,
    pub social: Box<dyn SocialSource>,
    pub analyst: Box<dyn Analyst>,
}

impl UpstreamClients {
    pub async fn close(self) {
        self.price.close().await;
        self.exchange.close().await;
        self.social.close().await;
        self.analyst.close().await;
        debug!("Upstream clients released");
    }
}

/// Opens a fresh [`UpstreamClients`] set for each request.
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn connect(&self) -> Result<UpstreamClients, UpstreamError>;
}
