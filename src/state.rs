use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{
    CatRepository, DatabaseError, DatabaseManager, InMemoryCatRepository, InMemoryUserRepository,
    PgCatRepository, PgUserRepository, UserRepository,
};
use crate::services::CatService;

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub cats: Arc<dyn CatRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(cats: Arc<dyn CatRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { cats, users }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCatRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        )
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgCatRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool)),
        )
    }

    /// Postgres when a database URL is configured, otherwise the in-memory store.
    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        if config.database.url.is_none() {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            return Ok(Self::in_memory());
        }

        let pool = DatabaseManager::connect(&config.database).await?;
        if config.database.run_migrations {
            DatabaseManager::migrate(&pool).await?;
        }
        Ok(Self::postgres(pool))
    }

    pub fn cat_service(&self) -> CatService {
        CatService::new(self.cats.clone(), self.users.clone())
    }
}
