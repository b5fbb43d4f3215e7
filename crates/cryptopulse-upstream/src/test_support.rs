//! Scriptable in-process upstreams for exercising the orchestrator.
//!
//! `MockConnector` hands out client sets whose sources answer from a
//! [`MockScript`] and record every attempt and close in shared
//! [`MockCounters`]. The price and social mocks go through [`with_retry`]
//! just like the HTTP sources; the exchange mock and the analyst answer once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cryptopulse_models::{
    CoinSymbol, MarketData, MarketSnapshot, PriceSnapshot, SocialPost, SocialSnapshot,
};

use crate::error::UpstreamError;
use crate::retry::{with_retry, RetryPolicy};
use crate::source::{
    Analyst, ExchangeSource, PriceSource, SocialSource, UpstreamClients, UpstreamConnector,
};

/// Canned upstream answers. `Err` holds the failure message.
///
/// Each delay is slept on the tokio clock before every attempt of that source.
#[derive(Debug, Clone)]
pub struct MockScript {
    pub price: Result<PriceSnapshot, String>,
    pub market: Result<MarketSnapshot, String>,
    pub posts: Result<Vec<SocialPost>, String>,
    pub analysis: Result<String, String>,
    pub retry: RetryPolicy,
    pub price_delay: Duration,
    pub market_delay: Duration,
    pub social_delay: Duration,
}

impl Default for MockScript {
    /// BTC at 65000.12 (+2.3%), volume 12345.6, four matching posts.
    fn default() -> Self {
        Self {
            price: Ok(PriceSnapshot {
                symbol: String::new(),
                current_price_usd: 65000.12,
                change_24h_percent: Some(2.3),
            }),
            market: Ok(MarketSnapshot {
                volume: 12345.6,
                price_change_percent: 1.9,
            }),
            posts: Ok(mock_posts(4)),
            analysis: Ok("Mock analysis: hold.".to_string()),
            retry: RetryPolicy::default(),
            price_delay: Duration::ZERO,
            market_delay: Duration::ZERO,
            social_delay: Duration::ZERO,
        }
    }
}

impl MockScript {
    pub fn failing_price(mut self, message: &str) -> Self {
        self.price = Err(message.to_string());
        self
    }

    pub fn failing_exchange(mut self, message: &str) -> Self {
        self.market = Err(message.to_string());
        self
    }

    pub fn failing_social(mut self, message: &str) -> Self {
        self.posts = Err(message.to_string());
        self
    }

    pub fn failing_analyst(mut self, message: &str) -> Self {
        self.analysis = Err(message.to_string());
        self
    }

    pub fn with_posts(mut self, count: usize) -> Self {
        self.posts = Ok(mock_posts(count));
        self
    }

    /// Latency of the price, exchange and social sources.
    pub fn with_delays(mut self, price: Duration, market: Duration, social: Duration) -> Self {
        self.price_delay = price;
        self.market_delay = market;
        self.social_delay = social;
        self
    }
}

pub fn mock_posts(count: usize) -> Vec<SocialPost> {
    (0..count)
        .map(|i| SocialPost {
            title: format!("Mock post {}", i + 1),
            score: 100 - i as i64,
        })
        .collect()
}

fn mock_failure(service: &'static str, message: &str) -> UpstreamError {
    UpstreamError::Status {
        service,
        status: 503,
        body: message.to_string(),
    }
}

/// Attempt and release counts across every client set a connector opened.
#[derive(Debug, Default)]
pub struct MockCounters {
    pub connects: AtomicUsize,
    pub price_attempts: AtomicUsize,
    pub exchange_attempts: AtomicUsize,
    pub social_attempts: AtomicUsize,
    pub analyst_calls: AtomicUsize,
    pub price_closes: AtomicUsize,
    pub exchange_closes: AtomicUsize,
    pub social_closes: AtomicUsize,
    pub analyst_closes: AtomicUsize,
}

impl MockCounters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every network-equivalent call made, retries included.
    pub fn upstream_calls(&self) -> usize {
        self.price_attempts.load(Ordering::SeqCst)
            + self.exchange_attempts.load(Ordering::SeqCst)
            + self.social_attempts.load(Ordering::SeqCst)
            + self.analyst_calls.load(Ordering::SeqCst)
    }

    /// Close counts in `[price, exchange, social, analyst]` order.
    pub fn closes(&self) -> [usize; 4] {
        [
            self.price_closes.load(Ordering::SeqCst),
            self.exchange_closes.load(Ordering::SeqCst),
            self.social_closes.load(Ordering::SeqCst),
            self.analyst_closes.load(Ordering::SeqCst),
        ]
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Connector whose client sets answer from a [`MockScript`].
pub struct MockConnector {
    script: Mutex<MockScript>,
    counters: Arc<MockCounters>,
}

impl MockConnector {
    pub fn new(script: MockScript) -> Self {
        Self {
            script: Mutex::new(script),
            counters: Arc::new(MockCounters::default()),
        }
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        Arc::clone(&self.counters)
    }

    /// Replaces the script used by client sets opened from now on.
    pub fn set_script(&self, script: MockScript) {
        *self.script.lock().unwrap_or_else(PoisonError::into_inner) = script;
    }
}

#[async_trait]
impl UpstreamConnector for MockConnector {
    async fn connect(&self) -> Result<UpstreamClients, UpstreamError> {
        bump(&self.counters.connects);
        let script = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mock = |script: &MockScript| MockSource {
            script: script.clone(),
            counters: Arc::clone(&self.counters),
        };
        Ok(UpstreamClients {
            price: Box::new(mock(&script)),
            exchange: Box::new(mock(&script)),
            social: Box::new(mock(&script)),
            analyst: Box::new(mock(&script)),
        })
    }
}

/// One mock type plays every upstream role.
pub struct MockSource {
    script: MockScript,
    counters: Arc<MockCounters>,
}

#[async_trait]
impl PriceSource for MockSource {
    async fn price(&self, coin: &CoinSymbol) -> Result<PriceSnapshot, UpstreamError> {
        with_retry(&self.script.retry, "mock price", || async move {
            bump(&self.counters.price_attempts);
            pause(self.script.price_delay).await;
            match &self.script.price {
                Ok(snapshot) => Ok(PriceSnapshot {
                    symbol: coin.as_upper().to_string(),
                    ..snapshot.clone()
                }),
                Err(message) => Err(mock_failure("price API", message)),
            }
        })
        .await
    }

    async fn close(&self) {
        bump(&self.counters.price_closes);
    }
}

#[async_trait]
impl ExchangeSource for MockSource {
    async fn market(&self, _coin: &CoinSymbol) -> Result<MarketSnapshot, UpstreamError> {
        bump(&self.counters.exchange_attempts);
        pause(self.script.market_delay).await;
        self.script
            .market
            .clone()
            .map_err(|message| mock_failure("exchange API", &message))
    }

    async fn close(&self) {
        bump(&self.counters.exchange_closes);
    }
}

#[async_trait]
impl SocialSource for MockSource {
    async fn social(&self, _coin: &CoinSymbol) -> Result<SocialSnapshot, UpstreamError> {
        with_retry(&self.script.retry, "mock social", || async move {
            bump(&self.counters.social_attempts);
            pause(self.script.social_delay).await;
            match &self.script.posts {
                Ok(posts) => Ok(SocialSnapshot::from_matches(posts.clone())),
                Err(message) => Err(mock_failure("social API", message)),
            }
        })
        .await
    }

    async fn close(&self) {
        bump(&self.counters.social_closes);
    }
}

#[async_trait]
impl Analyst for MockSource {
    async fn analyze(&self, _data: &MarketData) -> Result<String, UpstreamError> {
        bump(&self.counters.analyst_calls);
        self.script
            .analysis
            .clone()
            .map_err(|message| mock_failure("language model API", &message))
    }

    async fn close(&self) {
        bump(&self.counters.analyst_closes);
    }
}
