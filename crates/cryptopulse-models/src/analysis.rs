use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coin::CoinSymbol;
use crate::market::MarketData;

/// The aggregated per-coin report. Cached as-is once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResponse {
    pub coin: CoinSymbol,
    pub analysis: String,
    pub timestamp: DateTime<Utc>,
    pub raw_data: MarketData,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}
