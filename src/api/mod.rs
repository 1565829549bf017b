pub mod features;
pub mod schema;
pub mod service;

pub use service::PredictionService;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::model::InferenceError;
use schema::{parse_body, validate_live, validate_pre_match, ValidationError};

/// Errors surfaced by the prediction endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => {
                debug!("Rejected request: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": "validation failed", "detail": e.errors })),
                )
                    .into_response()
            }
            ApiError::Inference(e) => {
                error!("Inference failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// Build the Axum router for the prediction API.
pub fn router(service: PredictionService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict/pre_match", post(pre_match_handler))
        .route("/predict/live_wpa", post(live_wpa_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(service))
}

/// GET /health
async fn health_handler(State(svc): State<Arc<PredictionService>>) -> impl IntoResponse {
    let models = svc.models();
    Json(json!({
        "status": "ok",
        "models": {
            "pre_match": models.pre_match.info(),
            "live_wpa": models.live.info(),
        }
    }))
}

/// POST /predict/pre_match
async fn pre_match_handler(
    State(svc): State<Arc<PredictionService>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req = validate_pre_match(&parse_body(&body)?)?;
    Ok(Json(svc.predict_pre_match(&req)?))
}

/// POST /predict/live_wpa
async fn live_wpa_handler(
    State(svc): State<Arc<PredictionService>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req = validate_live(&parse_body(&body)?)?;
    Ok(Json(svc.predict_live_wpa(&req)?))
}
