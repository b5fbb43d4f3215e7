use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cryptopulse_models::{AnalysisResponse, HealthStatus};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::AnalyzeError;
use crate::orchestrator::Orchestrator;

const CORS_MAX_AGE: Duration = Duration::from_secs(600);

#[derive(Serialize, Debug)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AnalyzeError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "Invalid coin symbol".to_string())
            }
            e => {
                error!(error = %e, "Analysis request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Analysis failed: {e}"),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// HTTP surface: `/analyze/{coin}` and `/health` with permissive CORS.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(CORS_MAX_AGE);

    Router::new()
        .route("/analyze/{coin}", get(analyze))
        .route("/health", get(health))
        .with_state(orchestrator)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn analyze(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(coin): Path<String>,
) -> Result<Json<AnalysisResponse>, AnalyzeError> {
    orchestrator.analyze(&coin).await.map(Json)
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}
