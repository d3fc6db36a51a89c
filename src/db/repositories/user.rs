//! User directory
//!
//! The seam to the identity/follow subsystem, which this engine does not
//! own. The engine needs exactly two lookups from it: resolving a
//! username to an external user identity, and listing the identities a
//! user follows. `SqlxUserDirectory` reads the subsystem's tables from
//! the shared store; other deployments can substitute their own
//! implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;

/// Lookup interface into the external identity/follow subsystem.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a username to its external user identity
    async fn find_user_id(&self, username: &str) -> Result<Option<i64>>;

    /// External user identities followed by the given user. A user
    /// following no one yields an empty list, never an error.
    async fn followed_user_ids(&self, user_id: i64) -> Result<Vec<i64>>;
}

/// SQLx-based directory reading the identity subsystem's tables.
pub struct SqlxUserDirectory {
    pool: DynDatabasePool,
}

impl SqlxUserDirectory {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed directory for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserDirectory> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserDirectory for SqlxUserDirectory {
    async fn find_user_id(&self, username: &str) -> Result<Option<i64>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_user_id_sqlite(self.pool.as_sqlite().unwrap(), username).await
            }
            DatabaseDriver::Mysql => {
                find_user_id_mysql(self.pool.as_mysql().unwrap(), username).await
            }
        }
    }

    async fn followed_user_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                followed_user_ids_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                followed_user_ids_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn find_user_id_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<i64>> {
    let row = sqlx::query("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to look up user by username")?;

    Ok(row.map(|row| row.get("id")))
}

async fn followed_user_ids_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT following_id FROM follows WHERE followed_by_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to load followed users")?;

    Ok(rows.iter().map(|row| row.get("following_id")).collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn find_user_id_mysql(pool: &MySqlPool, username: &str) -> Result<Option<i64>> {
    let row = sqlx::query("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to look up user by username")?;

    Ok(row.map(|row| row.get("id")))
}

async fn followed_user_ids_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT following_id FROM follows WHERE followed_by_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to load followed users")?;

    Ok(rows.iter().map(|row| row.get("following_id")).collect())
}
