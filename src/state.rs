use std::sync::Arc;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo::{MemoryUserStore, PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::db;
use crate::watchlist::repo::{MemoryWatchlistStore, PgWatchlistStore, WatchlistStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub users: Arc<dyn UserStore>,
    pub watchlist: Arc<dyn WatchlistStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (users, watchlist) = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url).await?;
                tracing::info!("connected to postgres");
                (
                    Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgWatchlistStore::new(pool)) as Arc<dyn WatchlistStore>,
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
                (
                    Arc::new(MemoryUserStore::default()) as Arc<dyn UserStore>,
                    Arc::new(MemoryWatchlistStore::default()) as Arc<dyn WatchlistStore>,
                )
            }
        };

        Ok(Self::from_parts(config, users, watchlist))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        watchlist: Arc<dyn WatchlistStore>,
    ) -> Self {
        let keys = Arc::new(JwtKeys::from_config(&config.jwt));
        Self {
            config,
            keys,
            users,
            watchlist,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{HttpConfig, JwtConfig};

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
            http: HttpConfig {
                host: "127.0.0.1".into(),
                port: 0,
                allowed_origins: vec!["http://localhost:5173".into()],
            },
        });

        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemoryWatchlistStore::default()),
        )
    }
}
