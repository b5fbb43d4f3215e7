//! CryptoPulse - on-demand crypto market analysis.
//!
//! Aggregates price, exchange and social data for a coin, asks a language
//! model for a written report and caches the result for a few minutes.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use cryptopulse::models::{PulseConfig, Credentials};
//! use cryptopulse::orchestrator::Orchestrator;
//! use cryptopulse::server::router;
//! ```

pub mod error;
pub mod orchestrator;
pub mod server;

pub use cryptopulse_cache as cache;
pub use cryptopulse_models as models;
pub use cryptopulse_upstream as upstream;

pub use error::AnalyzeError;
pub use orchestrator::Orchestrator;

use std::sync::Arc;

use cryptopulse_cache::AnalysisCache;
use cryptopulse_models::{Credentials, PulseConfig};
use cryptopulse_upstream::{HttpConnector, UpstreamConnector};

/// Build an Orchestrator backed by the real upstream services.
pub fn build_orchestrator(config: &PulseConfig, credentials: Credentials) -> Orchestrator {
    let cache = Arc::new(AnalysisCache::from_config(&config.cache));
    let connector: Arc<dyn UpstreamConnector> =
        Arc::new(HttpConnector::new(config.upstream.clone(), credentials));
    Orchestrator::new(cache, connector)
}
