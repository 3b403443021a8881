use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use crate::{
    api::{AppJson, AppPath, MessageResponse},
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    watchlist::{
        dto::AddMovieRequest,
        repo_types::WatchlistEntry,
        services,
    },
};

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(list_watchlist).post(add_to_watchlist))
        .route("/watchlist/:id", delete(remove_from_watchlist))
}

#[instrument(skip(state))]
pub async fn list_watchlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<WatchlistEntry>>, AppError> {
    let entries = services::list(state.watchlist.as_ref(), user_id).await?;
    Ok(Json(entries))
}

#[instrument(skip(state, payload))]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<AddMovieRequest>,
) -> Result<(StatusCode, Json<WatchlistEntry>), AppError> {
    let entry = services::add(state.watchlist.as_ref(), user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(movie_id): AppPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    services::remove(state.watchlist.as_ref(), user_id, movie_id).await?;
    Ok(Json(MessageResponse {
        message: "Removed from Watchlist",
    }))
}
