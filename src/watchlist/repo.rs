use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppError, watchlist::repo_types::WatchlistEntry};

// `seq` is the insertion order; later inserts win ties on `added_at`.
const LIST_BY_USER_SQL: &str = r#"
    SELECT id, user_id, movie_id, title, poster_path, vote_average, added_at
    FROM watchlist
    WHERE user_id = $1
    ORDER BY added_at DESC, seq DESC
"#;

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Entries owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, AppError>;

    async fn exists(&self, user_id: Uuid, movie_id: i64) -> Result<bool, AppError>;

    /// Persist a new entry. `(user_id, movie_id)` is unique: a clash is `AlreadyExists`.
    async fn insert(&self, entry: &WatchlistEntry) -> Result<(), AppError>;

    /// Delete the entry for `(user_id, movie_id)`. Returns `true` if one was removed.
    async fn delete(&self, user_id: Uuid, movie_id: i64) -> Result<bool, AppError>;
}

pub struct PgWatchlistStore {
    db: PgPool,
}

impl PgWatchlistStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, AppError> {
        let rows = sqlx::query_as::<_, WatchlistEntry>(LIST_BY_USER_SQL)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn exists(&self, user_id: Uuid, movie_id: i64) -> Result<bool, AppError> {
        let found: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM watchlist WHERE user_id = $1 AND movie_id = $2)"#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_one(&self.db)
        .await?;
        Ok(found)
    }

    async fn insert(&self, entry: &WatchlistEntry) -> Result<(), AppError> {
        let res = sqlx::query(
            r#"
            INSERT INTO watchlist (id, user_id, movie_id, title, poster_path, vote_average, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.movie_id)
        .bind(&entry.title)
        .bind(entry.poster_path.as_deref())
        .bind(entry.vote_average)
        .bind(entry.added_at)
        .execute(&self.db)
        .await;

        match res {
            Ok(_) => Ok(()),
            // lost the race against a concurrent add of the same movie
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, user_id: Uuid, movie_id: i64) -> Result<bool, AppError> {
        let res = sqlx::query(r#"DELETE FROM watchlist WHERE user_id = $1 AND movie_id = $2"#)
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// Process-local store. Entries are kept in insertion order.
#[derive(Default)]
pub struct MemoryWatchlistStore {
    entries: RwLock<Vec<WatchlistEntry>>,
}

#[async_trait]
impl WatchlistStore for MemoryWatchlistStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, AppError> {
        let entries = self.entries.read().await;
        // newest insert first, so equal timestamps still come out newest first
        let mut owned: Vec<WatchlistEntry> = entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(owned)
    }

    async fn exists(&self, user_id: Uuid, movie_id: i64) -> Result<bool, AppError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .any(|e| e.user_id == user_id && e.movie_id == movie_id))
    }

    async fn insert(&self, entry: &WatchlistEntry) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|e| e.user_id == entry.user_id && e.movie_id == entry.movie_id)
        {
            return Err(AppError::AlreadyExists);
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, movie_id: i64) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        match entries
            .iter()
            .position(|e| e.user_id == user_id && e.movie_id == movie_id)
        {
            Some(idx) => {
                entries.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn entry(user_id: Uuid, movie_id: i64, added_at: OffsetDateTime) -> WatchlistEntry {
        WatchlistEntry {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            title: format!("movie {movie_id}"),
            poster_path: None,
            vote_average: None,
            added_at,
        }
    }

    #[tokio::test]
    async fn list_orders_by_added_at_desc() {
        let store = MemoryWatchlistStore::default();
        let user = Uuid::new_v4();
        let t0 = OffsetDateTime::now_utc();
        // inserted out of time order on purpose
        store.insert(&entry(user, 2, t0 + Duration::seconds(2))).await.unwrap();
        store.insert(&entry(user, 1, t0 + Duration::seconds(1))).await.unwrap();
        store.insert(&entry(user, 3, t0 + Duration::seconds(3))).await.unwrap();

        let ids: Vec<i64> = store
            .list_by_user(user)
            .await
            .unwrap()
            .iter()
            .map(|e| e.movie_id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let store = MemoryWatchlistStore::default();
        let user = Uuid::new_v4();
        let t = OffsetDateTime::now_utc();
        store.insert(&entry(user, 10, t)).await.unwrap();
        store.insert(&entry(user, 11, t)).await.unwrap();

        let list = store.list_by_user(user).await.unwrap();
        assert_eq!(list[0].movie_id, 11);
        assert_eq!(list[1].movie_id, 10);
    }

    #[test]
    fn postgres_listing_breaks_ties_by_insert_order() {
        let order_by = LIST_BY_USER_SQL
            .split("ORDER BY")
            .nth(1)
            .expect("list query is ordered");
        assert_eq!(order_by.trim(), "added_at DESC, seq DESC");
    }

    #[tokio::test]
    async fn insert_enforces_user_movie_uniqueness() {
        let store = MemoryWatchlistStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        store.insert(&entry(alice, 42, now)).await.unwrap();
        let err = store.insert(&entry(alice, 42, now)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists));
        // same movie for another user is fine
        store.insert(&entry(bob, 42, now)).await.unwrap();

        assert_eq!(store.list_by_user(alice).await.unwrap().len(), 1);
        assert!(store.exists(bob, 42).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let store = MemoryWatchlistStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.insert(&entry(alice, 7, OffsetDateTime::now_utc())).await.unwrap();

        assert!(!store.delete(bob, 7).await.unwrap());
        assert!(store.exists(alice, 7).await.unwrap());
        assert!(store.delete(alice, 7).await.unwrap());
        assert!(!store.delete(alice, 7).await.unwrap());
    }

    #[test]
    fn entry_serializes_with_client_field_names() {
        let e = WatchlistEntry {
            poster_path: Some("/p.jpg".into()),
            vote_average: Some(7.5),
            ..entry(Uuid::new_v4(), 42, OffsetDateTime::UNIX_EPOCH)
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["movieId"], 42);
        assert_eq!(json["poster_path"], "/p.jpg");
        assert_eq!(json["vote_average"], 7.5);
        assert_eq!(json["addedAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("userId").is_some());
    }
}
