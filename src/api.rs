//! REST API surface for the decision analysis pipeline
//!
//! Thin boundary layer: parses the request, hands it to the pipeline,
//! maps failures to status codes. Errors use a `{"detail": ...}` envelope.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::models::AnalysisResponse;
use crate::pipeline::{AnalysisPipeline, AnalysisRequest};

/// Bundled example prior log, for exercising drift without a prior session
const SAMPLE_PRIOR_LOG: &str = include_str!("../sample_prior_log.json");

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub decision_narrative: String,
    pub monthly_burn: Option<f64>,
    pub runway_months: Option<f64>,
    pub income_delta: Option<f64>,
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance_level: String,
    #[serde(default)]
    pub downside_limit: f64,
    /// Prior decision log document as raw JSON text
    pub prior_log: Option<String>,
}

fn default_risk_tolerance() -> String {
    "Medium".to_string()
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<AnalysisPipeline>,
}

fn error_response(error: &AnalysisError) -> (StatusCode, Json<ErrorBody>) {
    let status = match error {
        AnalysisError::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorBody {
            detail: error.to_string(),
        }),
    )
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Sample Prior Log
/// =============================

async fn sample_prior() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        SAMPLE_PRIOR_LOG,
    )
}

/// =============================
/// Analysis Endpoint
/// =============================

async fn analyze(
    State(state): State<ApiState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, (StatusCode, Json<ErrorBody>)> {
    info!(
        narrative_chars = req.decision_narrative.len(),
        has_prior_log = req.prior_log.is_some(),
        "Received analysis request"
    );

    let prior_log = match req.prior_log.as_deref() {
        Some(raw) if !raw.trim().is_empty() => match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let error = AnalysisError::Input(format!("Prior log file is not valid JSON: {}", e));
                warn!("{}", error);
                return Err(error_response(&error));
            }
        },
        _ => None,
    };

    let request = AnalysisRequest {
        decision_narrative: req.decision_narrative,
        monthly_burn: req.monthly_burn,
        runway_months: req.runway_months,
        income_delta: req.income_delta,
        risk_tolerance_level: req.risk_tolerance_level,
        downside_limit: req.downside_limit,
        prior_log,
    };

    match state.pipeline.run(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!("Analysis failed: {}", e);
            Err(error_response(&e))
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<AnalysisPipeline>) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/health", get(health))
        .route("/api/sample_prior", get(sample_prior))
        .route("/api/analyze", post(analyze))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    pipeline: Arc<AnalysisPipeline>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"decision_narrative": "Should I quit?"}"#).unwrap();
        assert_eq!(req.risk_tolerance_level, "Medium");
        assert_eq!(req.downside_limit, 0.0);
        assert!(req.prior_log.is_none());
        assert!(req.monthly_burn.is_none());
    }

    #[test]
    fn test_sample_prior_log_is_a_decision_log() {
        let value: serde_json::Value = serde_json::from_str(SAMPLE_PRIOR_LOG).unwrap();
        assert!(value.get("executive_snapshot").is_some());
        assert!(value.get("human_boundary_gate").is_some());
        assert_eq!(value["meta"]["schema_version"], "1.1");
    }

    #[test]
    fn test_input_error_maps_to_422() {
        let error = AnalysisError::Input("bad prior log".to_string());
        let (status, _) = error_response(&error);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let error = AnalysisError::Generation("no json".to_string());
        let (status, _) = error_response(&error);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
