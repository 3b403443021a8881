use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    watchlist::{dto::AddMovieRequest, repo::WatchlistStore, repo_types::WatchlistEntry},
};

pub async fn list(
    store: &dyn WatchlistStore,
    user_id: Uuid,
) -> Result<Vec<WatchlistEntry>, AppError> {
    store.list_by_user(user_id).await
}

pub async fn add(
    store: &dyn WatchlistStore,
    user_id: Uuid,
    req: AddMovieRequest,
) -> Result<WatchlistEntry, AppError> {
    let movie_id = req
        .movie_id
        .ok_or_else(|| AppError::Validation("movieId is required".into()))?;
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }

    if store.exists(user_id, movie_id).await? {
        debug!(%user_id, movie_id, "movie already in watchlist");
        return Err(AppError::AlreadyExists);
    }

    let entry = WatchlistEntry {
        id: Uuid::new_v4(),
        user_id,
        movie_id,
        title: title.to_string(),
        poster_path: req.poster_path,
        vote_average: req.vote_average,
        added_at: OffsetDateTime::now_utc(),
    };
    store.insert(&entry).await?;
    info!(%user_id, movie_id, entry_id = %entry.id, "movie added to watchlist");
    Ok(entry)
}

/// Removing a movie that is not in the list is not an error.
pub async fn remove(
    store: &dyn WatchlistStore,
    user_id: Uuid,
    movie_id: i64,
) -> Result<bool, AppError> {
    let removed = store.delete(user_id, movie_id).await?;
    if removed {
        info!(%user_id, movie_id, "movie removed from watchlist");
    } else {
        debug!(%user_id, movie_id, "remove was a no-op");
    }
    Ok(removed)
}
