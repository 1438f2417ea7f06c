use super::{ApiError, AppState};
use crate::geo::LocationSample;
use crate::store::LocationRecord;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Raw location report from a tracking session
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationReport {
    user_id: String,
    #[serde(flatten)]
    sample: LocationSample,
}

/// Create location API router
pub fn create_location_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/locations", post(record_location))
        .route("/api/locations/:user_id", get(latest_location))
        .with_state(state)
}

/// POST /api/locations - Store the latest sample for a user
async fn record_location(
    State(state): State<Arc<AppState>>,
    Json(report): Json<LocationReport>,
) -> Result<(StatusCode, Json<LocationRecord>), ApiError> {
    if report.user_id.trim().is_empty() {
        return Err(ApiError::Unprocessable("userId is required".to_string()));
    }
    if !report.sample.position().is_valid() {
        return Err(ApiError::Unprocessable(
            "latitude/longitude out of range".to_string(),
        ));
    }

    let record = state.store.record_location(&report.user_id, &report.sample);
    debug!(
        user_id = %record.user_id,
        latitude = record.latitude,
        longitude = record.longitude,
        "Location recorded"
    );

    Ok((StatusCode::ACCEPTED, Json(record)))
}

/// GET /api/locations/:user_id - Latest sample for a user
async fn latest_location(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<LocationRecord>, ApiError> {
    state
        .store
        .latest_location(&user_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no location for user '{}'", user_id)))
}
