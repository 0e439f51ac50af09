//! # deskmap-db
//!
//! PostgreSQL database layer for deskmap.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for floor plans, locations, and users
//! - Transactional application of reconciliation batches
//! - Filesystem-backed image storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use deskmap_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/deskmap").await?;
//!     let plans = db.floorplans.list_for_owner(owner_id).await?;
//!     Ok(())
//! }
//! ```

pub mod floorplans;
pub mod image_store;
pub mod locations;
pub mod pool;
pub mod users;

// Re-export core types
pub use deskmap_core::*;

// Re-export repository implementations
pub use floorplans::PgFloorPlanRepository;
pub use image_store::{FilesystemBackend, ImageStore, StorageBackend};
pub use locations::PgLocationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User repository for accounts and token resolution.
    pub users: PgUserRepository,
    /// Floor plan repository for CRUD operations.
    pub floorplans: PgFloorPlanRepository,
    /// Location repository for batch operations.
    pub locations: PgLocationRepository,
    /// Image store (requires backend configuration).
    /// Use `with_image_storage` to configure.
    pub images: Option<ImageStore>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            floorplans: PgFloorPlanRepository::new(pool.clone()),
            locations: PgLocationRepository::new(pool.clone()),
            images: None,
            pool,
        }
    }

    /// Configure image storage with a filesystem backend path.
    pub fn with_image_storage(mut self, path: &str) -> Self {
        self.images = Some(ImageStore::new(FilesystemBackend::new(path)));
        self
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

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
