//! WiMap Database Layer
//!
//! Provides `SQLite` storage for the credential vault using `SQLx` with
//! embedded, versioned migrations.
//!
//! # Design Principles
//!
//! - Credentials are encrypted at the application layer (wimap-vault); this
//!   crate only ever sees ciphertext
//! - Migrations are embedded at compile time and applied on open
//! - Connection pooling with a small fixed limit (5 connections)
//!
//! # Example
//!
//! ```ignore
//! use wimap_db::Database;
//!
//! let db = Database::new("wimap.db").await?;
//! db.run_migrations().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod credentials;
pub mod error;
pub mod migrations;
pub mod vault_meta;

// Re-export commonly used types
pub use connection::{DbPool, IN_MEMORY};
pub use credentials::CredentialRow;
pub use error::{DatabaseError, Result};
pub use vault_meta::MetaEntry;

use std::path::Path;

/// High-level database handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = DbPool::new(path).await?;
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::new(IN_MEMORY).await
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
