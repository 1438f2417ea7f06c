// HTTP API over the facility directory

mod leaderboard;
mod locations;
mod objects;

pub use leaderboard::create_leaderboard_router;
pub use locations::create_location_router;
pub use objects::{create_object_router, SearchRequest, SearchResponse};

use crate::store::{InMemoryFacilityStore, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub store: Arc<InMemoryFacilityStore>,
}

/// Full API: health, objects, locations, leaderboard
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(create_object_router(Arc::clone(&state)))
        .merge(create_location_router(Arc::clone(&state)))
        .merge(create_leaderboard_router(state))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Unprocessable(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound(e.to_string()),
            StoreError::Validation(_) | StoreError::InvalidRating(_) => {
                ApiError::Unprocessable(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
