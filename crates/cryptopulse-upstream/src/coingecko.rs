use async_trait::async_trait;
use cryptopulse_models::{CoinSymbol, PriceSnapshot};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::UpstreamError;
use crate::http::{ApiClient, ClientOptions};
use crate::retry::RetryPolicy;
use crate::source::PriceSource;

const SERVICE: &str = "price API";
const API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Coin detail lookups against the CoinGecko API.
pub struct CoinGeckoSource {
    api: ApiClient,
    retry: RetryPolicy,
}

impl CoinGeckoSource {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        options: ClientOptions,
        retry: RetryPolicy,
    ) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| UpstreamError::Setup("price API key is not a valid header".into()))?;
            headers.insert(API_KEY_HEADER, value);
        }

        Ok(Self {
            api: ApiClient::new(SERVICE, base_url, headers, options)?,
            retry,
        })
    }
}

#[derive(Deserialize, Debug)]
struct CoinDetail {
    symbol: String,
    market_data: CoinMarketData,
}

#[derive(Deserialize, Debug)]
struct CoinMarketData {
    current_price: UsdPrice,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct UsdPrice {
    usd: f64,
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    #[instrument(name = "PriceFetch", skip(self), fields(coin = %coin))]
    async fn price(&self, coin: &CoinSymbol) -> Result<PriceSnapshot, UpstreamError> {
        let endpoint = format!("/coins/{}", coin.cache_key());
        let body = self
            .api
            .fetch(
                &endpoint,
                &[("localization", "false"), ("market_data", "true")],
                None,
                &self.retry,
            )
            .await?;

        let detail: CoinDetail = serde_json::from_value(body)
            .map_err(|e| UpstreamError::malformed(SERVICE, format!("coin detail: {e}")))?;
        debug!(
            symbol = %detail.symbol,
            price = detail.market_data.current_price.usd,
            "Price fetched"
        );

        Ok(PriceSnapshot {
            symbol: detail.symbol.to_uppercase(),
            current_price_usd: detail.market_data.current_price.usd,
            change_24h_percent: detail.market_data.price_change_percentage_24h,
        })
    }

    async fn close(&self) {
        debug!(service = self.api.service(), "Closing session");
    }
}
