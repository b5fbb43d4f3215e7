use cryptopulse_models::InvalidCoinSymbol;
use cryptopulse_upstream::UpstreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidCoinSymbol),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("analysis task ended without a result")]
    Interrupted,
}
