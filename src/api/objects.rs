use super::{ApiError, AppState};
use crate::facility::{Comment, FacilityObject, NewComment, NewFacility};
use crate::filter::{apply_filter, group_by_gym, FilterSpec, GroupedFacilities};
use crate::geo::LatLon;
use crate::store::FacilityStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Query parameters for object listing
#[derive(Deserialize)]
pub struct ObjectQueryParams {
    /// Only children of this gym
    pub parent: Option<String>,
}

/// Body of POST /api/objects/search
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub filter: FilterSpec,
    /// Reference point for the radius stage (usually the caller's position)
    #[serde(default)]
    pub reference: Option<LatLon>,
    /// Include the gym/children grouping in the response
    #[serde(default)]
    pub grouped: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub objects: Vec<FacilityObject>,
    /// False when the filter was inactive and the full list was returned
    pub filtered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupedFacilities>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingRequest {
    author_id: String,
    value: f64,
}

/// Create object API router
pub fn create_object_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/objects", get(list_objects).post(create_object))
        .route("/api/objects/search", post(search_objects))
        .route("/api/objects/:id", get(get_object).delete(delete_object))
        .route("/api/objects/:id/ratings", post(rate_object))
        .route(
            "/api/objects/:id/comments",
            get(list_comments).post(add_comment),
        )
        .with_state(state)
}

/// GET /api/objects - List objects, optionally only children of `?parent=`
async fn list_objects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ObjectQueryParams>,
) -> Response {
    let result = match params.parent {
        Some(ref parent) => state.store.fetch_by_parent(parent).await,
        None => state.store.fetch_all().await,
    };

    match result {
        Ok(objects) => Json(objects).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list objects");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/objects/:id
async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FacilityObject>, ApiError> {
    state
        .store
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("facility '{}' not found", id)))
}

/// POST /api/objects - Create a gym or a child of an existing gym
async fn create_object(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewFacility>,
) -> Result<(StatusCode, Json<FacilityObject>), ApiError> {
    let object = state.store.create(new).await?;
    Ok((StatusCode::CREATED, Json(object)))
}

/// DELETE /api/objects/:id - Remove an object (and a gym's children)
async fn delete_object(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/objects/:id/ratings
async fn rate_object(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<FacilityObject>, ApiError> {
    if request.author_id.trim().is_empty() {
        return Err(ApiError::Unprocessable("authorId is required".to_string()));
    }
    let object = state.store.rate(&id, &request.author_id, request.value).await?;
    Ok(Json(object))
}

/// GET /api/objects/:id/comments - Newest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state.store.comments(&id).await?;
    Ok(Json(comments))
}

/// POST /api/objects/:id/comments
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(new): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state.store.add_comment(&id, new).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/objects/search - Run the filter engine over the current snapshot
///
/// An inactive filter returns the full list without invoking the engine.
async fn search_objects(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Response {
    let all = match state.store.fetch_all().await {
        Ok(all) => all,
        Err(e) => {
            error!(error = %e, "Failed to load objects for search");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let filtered = request.filter.is_active();
    let objects = if filtered {
        apply_filter(&all, &request.filter, request.reference)
    } else {
        all
    };

    debug!(
        filtered = filtered,
        results = objects.len(),
        gyms = objects.iter().filter(|o| o.is_gym()).count(),
        "Search complete"
    );

    let groups = if request.grouped {
        Some(group_by_gym(&objects))
    } else {
        None
    };

    Json(SearchResponse {
        objects,
        filtered,
        groups,
    })
    .into_response()
}
