use super::{ApiError, AppState};
use crate::store::LeaderboardEntry;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorStanding {
    author_id: String,
    points: u32,
    rank: u32,
}

/// Create leaderboard API router
pub fn create_leaderboard_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/leaderboard/:author_id", get(author_standing))
        .with_state(state)
}

/// GET /api/leaderboard?limit=N - Top authors by points (default 10)
async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> Json<Vec<LeaderboardEntry>> {
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    Json(state.store.leaderboard(limit))
}

/// GET /api/leaderboard/:author_id - Points and rank of one author
async fn author_standing(
    State(state): State<Arc<AppState>>,
    Path(author_id): Path<String>,
) -> Result<Json<AuthorStanding>, ApiError> {
    let rank = state
        .store
        .rank(&author_id)
        .ok_or_else(|| ApiError::NotFound(format!("no points for author '{}'", author_id)))?;

    Ok(Json(AuthorStanding {
        points: state.store.points(&author_id),
        author_id,
        rank,
    }))
}
