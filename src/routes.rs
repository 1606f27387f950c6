use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::commute::{merge::CommuteOption, CommuteError, CommuteService};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub commute: Arc<CommuteService>,
}

#[derive(Debug, Deserialize)]
pub struct CommuteRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct CommuteResponse {
    pub options: Vec<CommuteOption>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for CommuteError {
    fn into_response(self) -> Response {
        let status = if self.is_invalid_request() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn commute(
    State(state): State<AppState>,
    payload: Result<Json<CommuteRequest>, JsonRejection>,
) -> Result<Json<CommuteResponse>, CommuteError> {
    let Json(request) =
        payload.map_err(|rejection| CommuteError::InvalidRequest(rejection.body_text()))?;
    tracing::info!("Received commute request: lat={}, lon={}", request.lat, request.lon);

    let options = state
        .commute
        .compute_commute_options(request.lat, request.lon)
        .await?;

    Ok(Json(CommuteResponse { options }))
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/commute", post(commute))
        .with_state(state)
}
