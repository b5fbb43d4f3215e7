use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use cryptopulse_cache::AnalysisCache;
use cryptopulse_models::{AnalysisResponse, CoinSymbol, MarketData};
use cryptopulse_upstream::{UpstreamClients, UpstreamConnector, UpstreamError};
use tokio::sync::oneshot;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::AnalyzeError;

/// Serves analysis requests from the cache or by gathering fresh data.
pub struct Orchestrator {
    cache: Arc<AnalysisCache>,
    connector: Arc<dyn UpstreamConnector>,
}

impl Orchestrator {
    pub fn new(cache: Arc<AnalysisCache>, connector: Arc<dyn UpstreamConnector>) -> Self {
        Self { cache, connector }
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Produce an analysis report for a raw coin symbol.
    ///
    /// A cached report younger than the cache TTL is returned as-is. Otherwise
    /// a client set is opened, the three sources are queried concurrently, the
    /// merged data is analyzed and the result cached. The client set is closed
    /// on every path once it has been opened, including when the returned
    /// future is dropped before it completes.
    pub async fn analyze(&self, raw_coin: &str) -> Result<AnalysisResponse, AnalyzeError> {
        let span = info_span!("Analyze", request_id = %Uuid::new_v4(), coin = %raw_coin);
        self.run(raw_coin).instrument(span).await
    }

    async fn run(&self, raw_coin: &str) -> Result<AnalysisResponse, AnalyzeError> {
        let start = Instant::now();
        let coin =
            CoinSymbol::parse(raw_coin).inspect_err(|e| warn!(error = %e, "Rejected request"))?;

        if let Some(cached) = self.cache.get(&coin).await {
            info!(coin = %coin, "Serving cached analysis");
            return Ok(cached);
        }

        let clients = self.connector.connect().await?;
        let response = match generate_and_release(clients, coin.clone()).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    coin = %coin,
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Analysis failed"
                );
                return Err(e);
            }
        };

        self.cache.insert(&coin, response.clone()).await;
        info!(
            coin = %coin,
            elapsed_ms = start.elapsed().as_millis(),
            "Analysis complete"
        );
        Ok(response)
    }
}

/// Runs [`generate`] on its own task, which always closes the client set.
///
/// If the caller stops waiting, the outstanding upstream calls are cancelled
/// and the set is still closed.
async fn generate_and_release(
    clients: UpstreamClients,
    coin: CoinSymbol,
) -> Result<AnalysisResponse, AnalyzeError> {
    let (mut tx, rx) = oneshot::channel();
    tokio::spawn(
        async move {
            let result = tokio::select! {
                result = generate(&clients, &coin) => Some(result),
                () = tx.closed() => None,
            };
            clients.close().await;

            match result {
                Some(result) => {
                    let _ = tx.send(result);
                }
                None => debug!(coin = %coin, "Caller went away, upstream work cancelled"),
            }
        }
        .in_current_span(),
    );

    rx.await.map_err(|_| AnalyzeError::Interrupted)?.map_err(AnalyzeError::from)
}

async fn generate(
    clients: &UpstreamClients,
    coin: &CoinSymbol,
) -> Result<AnalysisResponse, UpstreamError> {
    // First failure wins; the other branches are dropped unfinished.
    let (price, market, social) = tokio::try_join!(
        clients.price.price(coin),
        clients.exchange.market(coin),
        clients.social.social(coin),
    )?;

    let raw_data = MarketData {
        price,
        market,
        social,
    };
    let analysis = clients.analyst.analyze(&raw_data).await?;

    Ok(AnalysisResponse {
        coin: coin.clone(),
        analysis,
        timestamp: Utc::now(),
        raw_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptopulse_models::ActivityLevel;
    use cryptopulse_upstream::test_support::{MockConnector, MockScript};
    use std::time::Duration;

    fn orchestrator(script: MockScript) -> (Orchestrator, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new(script));
        let cache = Arc::new(AnalysisCache::new(1000, Duration::from_secs(300)));
        let orch = Orchestrator::new(cache, Arc::clone(&connector) as Arc<dyn UpstreamConnector>);
        (orch, connector)
    }

    #[tokio::test]
    async fn btc_example() {
        let (orch, connector) = orchestrator(MockScript::default());

        let report = orch.analyze("btc").await.unwrap();

        assert_eq!(report.coin.as_upper(), "BTC");
        assert_eq!(report.raw_data.price.symbol, "BTC");
        assert_eq!(report.raw_data.price.current_price_usd, 65000.12);
        assert_eq!(report.raw_data.market.volume, 12345.6);
        assert_eq!(report.raw_data.social.activity_level, ActivityLevel::High);
        assert_eq!(report.raw_data.social.top_posts.len(), 3);
        assert_eq!(connector.counters().closes(), [1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn invalid_symbol_never_connects() {
        let (orch, connector) = orchestrator(MockScript::default());

        for raw in ["BTC1", "", "b-t", "ÉTH"] {
            let err = orch.analyze(raw).await.unwrap_err();
            assert!(matches!(err, AnalyzeError::InvalidInput(_)), "{raw:?}");
        }
        assert_eq!(connector.counters().connects(), 0);
        assert_eq!(connector.counters().upstream_calls(), 0);
    }

    #[tokio::test]
    async fn cache_key_ignores_case() {
        let (orch, connector) = orchestrator(MockScript::default());

        let first = orch.analyze("eth").await.unwrap();
        let second = orch.analyze("ETH").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(connector.counters().connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let (orch, connector) = orchestrator(MockScript::default());

        let first = orch.analyze("sol").await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let cached = orch.analyze("sol").await.unwrap();
        assert_eq!(first.timestamp, cached.timestamp);
        assert_eq!(connector.counters().connects(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        orch.analyze("sol").await.unwrap();
        assert_eq!(connector.counters().connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn any_failing_source_fails_the_request() {
        let scripts = [
            MockScript::default().failing_price("price down"),
            MockScript::default().failing_exchange("exchange down"),
            MockScript::default().failing_social("social down"),
            MockScript::default().failing_analyst("analyst down"),
        ];

        for script in scripts {
            let (orch, connector) = orchestrator(script);
            let err = orch.analyze("btc").await.unwrap_err();

            assert!(matches!(err, AnalyzeError::Upstream(_)));
            assert_eq!(connector.counters().closes(), [1, 1, 1, 1]);
            assert!(orch.cache().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sources_are_queried_concurrently() {
        let second = Duration::from_secs(1);
        let (orch, _) = orchestrator(MockScript::default().with_delays(second, second, second));

        let started = tokio::time::Instant::now();
        orch.analyze("btc").await.unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= second, "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_still_releases_clients() {
        let slow = Duration::from_secs(10);
        let (orch, connector) = orchestrator(MockScript::default().with_delays(slow, slow, slow));

        let outcome = tokio::time::timeout(Duration::from_secs(1), orch.analyze("btc")).await;
        assert!(outcome.is_err());

        // Let the detached task observe the dropped caller.
        tokio::time::sleep(Duration::from_millis(1)).await;
        let counters = connector.counters();
        assert_eq!(counters.closes(), [1, 1, 1, 1]);
        assert_eq!(counters.analyst_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(orch.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_request_is_not_cached() {
        let (orch, connector) = orchestrator(MockScript::default().failing_exchange("down"));
        orch.analyze("btc").await.unwrap_err();

        connector.set_script(MockScript::default());
        orch.analyze("btc").await.unwrap();

        assert_eq!(connector.counters().connects(), 2);
    }

    #[tokio::test]
    async fn low_activity_keeps_all_posts() {
        let (orch, _) = orchestrator(MockScript::default().with_posts(2));

        let report = orch.analyze("ada").await.unwrap();
        assert_eq!(report.raw_data.social.activity_level, ActivityLevel::Low);
        assert_eq!(report.raw_data.social.top_posts.len(), 2);
    }
}
