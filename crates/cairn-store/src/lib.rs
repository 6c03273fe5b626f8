//! # cairn-store
//!
//! PostgreSQL storage layer for cairn.
//!
//! This crate provides:
//! - Connection pool management
//! - The content repository backing processing and search
//! - pgvector-backed embedding storage
//! - An in-memory repository for hermetic tests

pub mod items;
pub mod memory;
pub mod pool;
pub mod schema;

pub use items::PgContentStore;
pub use memory::MemoryContentStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use schema::ensure_schema;

// Re-export core types
pub use cairn_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined store context.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Content repository for processing fields and search candidates.
    pub content: PgContentStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            content: PgContentStore::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect using the `DATABASE_URL` environment variable, loading a
    /// `.env` file first when one is present.
    pub async fn connect_from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var(defaults::ENV_DATABASE_URL)
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;
        Self::connect(&url).await
    }

    /// Create the content tables if missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
