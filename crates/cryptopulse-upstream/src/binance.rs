use async_trait::async_trait;
use cryptopulse_models::{CoinSymbol, MarketSnapshot};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::UpstreamError;
use crate::http::{ApiClient, ClientOptions};
use crate::source::ExchangeSource;

const SERVICE: &str = "exchange API";
const API_KEY_HEADER: &str = "x-mbx-apikey";
/// Binance error code for an unknown trading pair.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// 24h ticker lookups against the Binance spot API.
///
/// Calls are made once; this source does not go through the retrying fetcher.
pub struct BinanceSource {
    api: ApiClient,
}

impl BinanceSource {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        options: ClientOptions,
    ) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| {
                UpstreamError::Setup("exchange API key is not a valid header".into())
            })?;
            headers.insert(API_KEY_HEADER, value);
        }

        Ok(Self {
            api: ApiClient::new(SERVICE, base_url, headers, options)?,
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    volume: String,
    price_change_percent: String,
}

#[derive(Deserialize, Debug)]
struct BinanceErrorBody {
    code: i64,
}

fn parse_number(field: &str, raw: &str) -> Result<f64, UpstreamError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| UpstreamError::malformed(SERVICE, format!("{field} is not numeric: {raw:?}")))
}

#[async_trait]
impl ExchangeSource for BinanceSource {
    #[instrument(name = "TickerFetch", skip(self), fields(coin = %coin))]
    async fn market(&self, coin: &CoinSymbol) -> Result<MarketSnapshot, UpstreamError> {
        let pair = coin.usdt_pair();
        let body = match self
            .api
            .get_json("/api/v3/ticker/24hr", &[("symbol", pair.as_str())], None)
            .await
        {
            Ok(body) => body,
            Err(UpstreamError::Status { body, .. })
                if serde_json::from_str::<BinanceErrorBody>(&body)
                    .is_ok_and(|e| e.code == INVALID_SYMBOL_CODE) =>
            {
                return Err(UpstreamError::UnknownPair(pair));
            }
            Err(e) => return Err(e),
        };

        let ticker: Ticker24h = serde_json::from_value(body)
            .map_err(|e| UpstreamError::malformed(SERVICE, format!("ticker: {e}")))?;
        debug!(pair = %pair, volume = %ticker.volume, "Ticker fetched");

        Ok(MarketSnapshot {
            volume: parse_number("volume", &ticker.volume)?,
            price_change_percent: parse_number("priceChangePercent", &ticker.price_change_percent)?,
        })
    }

    async fn close(&self) {
        debug!(service = self.api.service(), "Closing session");
    }
}
