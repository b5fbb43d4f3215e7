use std::time::Duration;

use async_trait::async_trait;
use cryptopulse_models::{Credentials, UpstreamConfig};
use tracing::debug;

use crate::binance::BinanceSource;
use crate::coingecko::CoinGeckoSource;
use crate::error::UpstreamError;
use crate::http::ClientOptions;
use crate::openai::OpenAiAnalyst;
use crate::reddit::{RedditAuth, RedditSource};
use crate::retry::RetryPolicy;
use crate::source::{UpstreamClients, UpstreamConnector};

const DEFAULT_USER_AGENT: &str = concat!("cryptopulse/", env!("CARGO_PKG_VERSION"));

/// Builds real HTTP-backed client sets from configuration and credentials.
pub struct HttpConnector {
    config: UpstreamConfig,
    credentials: Credentials,
}

impl HttpConnector {
    pub fn new(config: UpstreamConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.config.timeout_seconds),
            pool_max_idle_per_host: self.config.pool_max_idle_per_host,
        }
    }

    fn reddit_auth(&self) -> Option<RedditAuth> {
        match (
            &self.credentials.reddit_client_id,
            &self.credentials.reddit_client_secret,
        ) {
            (Some(client_id), Some(client_secret)) => Some(RedditAuth {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => None,
        }
    }
}

#[async_trait]
impl UpstreamConnector for HttpConnector {
    async fn connect(&self) -> Result<UpstreamClients, UpstreamError> {
        let options = self.client_options();
        let retry = RetryPolicy::from_config(&self.config);
        let creds = &self.credentials;

        let clients = UpstreamClients {
            price: Box::new(CoinGeckoSource::new(
                &self.config.price.base_url,
                creds.coingecko_api_key.as_deref(),
                options,
                retry,
            )?),
            exchange: Box::new(BinanceSource::new(
                &self.config.exchange.base_url,
                creds.binance_api_key.as_deref(),
                options,
            )?),
            social: Box::new(RedditSource::new(
                &self.config.social,
                self.reddit_auth(),
                creds.reddit_user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
                options,
                retry,
            )?),
            analyst: Box::new(OpenAiAnalyst::new(
                &self.config.analyst,
                creds.openai_api_key.clone(),
                options,
            )?),
        };
        debug!("Upstream clients opened");
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptopulse_models::{CoinSymbol, PriceApiConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn connect_wires_configured_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/sol"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "symbol": "sol",
                    "market_data": {
                        "current_price": {"usd": 150.5},
                        "price_change_percentage_24h": -0.4
                    }
                }"#,
            ))
            .mount(&server)
            .await;

        let config = UpstreamConfig {
            price: PriceApiConfig {
                base_url: server.uri(),
            },
            ..UpstreamConfig::default()
        };
        let connector = HttpConnector::new(config, Credentials::default());

        let clients = connector.connect().await.unwrap();
        let price = clients
            .price
            .price(&CoinSymbol::parse("SOL").unwrap())
            .await
            .unwrap();
        clients.close().await;

        assert_eq!(price.symbol, "SOL");
        assert_eq!(price.current_price_usd, 150.5);
    }

    #[test]
    fn reddit_auth_needs_both_halves() {
        let only_id = Credentials {
            reddit_client_id: Some("id".to_string()),
            ..Default::default()
        };
        let connector = HttpConnector::new(UpstreamConfig::default(), only_id);
        assert!(connector.reddit_auth().is_none());

        let both = Credentials {
            reddit_client_id: Some("id".to_string()),
            reddit_client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        let connector = HttpConnector::new(UpstreamConfig::default(), both);
        assert!(connector.reddit_auth().is_some());
    }
}
