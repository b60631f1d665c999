use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::errors::StoreError;
use crate::interfaces::{LocalStore, ObserverRegistry, StoreSession};
use crate::postgres::PostgresSession;

/// PostgreSQL implementation of the local store.
///
/// Each session owns one pooled connection inside a transaction for its
/// whole lifetime.
pub struct PostgresStore {
    pool: sqlx::PgPool,
    observers: Arc<ObserverRegistry>,
}

impl PostgresStore {
    /// Creates a store over an existing pool with the schema in place.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            pool,
            observers: Arc::new(ObserverRegistry::new()),
        }
    }

    /// Opens a connection pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the schema by applying the embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("src/postgres/migrations")
            .run(&self.pool)
            .await?;
        info!("Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl LocalStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresSession::new(tx, Arc::clone(&self.observers))))
    }

    fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }
}
