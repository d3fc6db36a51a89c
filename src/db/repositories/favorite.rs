//! Favorite repository
//!
//! Favorite toggles plus the batch aggregation used by article listing.
//! Counts and per-viewer status are computed for a whole identifier set
//! in one query each so rendering a page never issues per-article
//! lookups.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::placeholders;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;

/// Favorite repository trait
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Favorite counts for a set of articles, as a map keyed by article
    /// id. Articles with zero favorites are absent. An empty input set
    /// yields an empty map without a query.
    async fn counts_for(&self, article_ids: &[i64]) -> Result<HashMap<i64, i64>>;

    /// Whether the given author has favorited each of the articles, as a
    /// map keyed by article id. False entries are absent. An empty input
    /// set or author id 0 yields an empty map without a query.
    async fn status_for(&self, article_ids: &[i64], author_id: i64)
        -> Result<HashMap<i64, bool>>;

    /// Record a favorite. Find-or-create on the (article, author) pair;
    /// repeat favoriting is a no-op, never an error.
    async fn favorite(&self, article_id: i64, author_id: i64) -> Result<()>;

    /// Remove a favorite. Succeeds even when no matching row exists.
    async fn unfavorite(&self, article_id: i64, author_id: i64) -> Result<()>;
}

/// SQLx-based favorite repository implementation
pub struct SqlxFavoriteRepository {
    pool: DynDatabasePool,
}

impl SqlxFavoriteRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FavoriteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FavoriteRepository for SqlxFavoriteRepository {
    async fn counts_for(&self, article_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                counts_for_sqlite(self.pool.as_sqlite().unwrap(), article_ids).await
            }
            DatabaseDriver::Mysql => {
                counts_for_mysql(self.pool.as_mysql().unwrap(), article_ids).await
            }
        }
    }

    async fn status_for(
        &self,
        article_ids: &[i64],
        author_id: i64,
    ) -> Result<HashMap<i64, bool>> {
        if article_ids.is_empty() || author_id == 0 {
            return Ok(HashMap::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                status_for_sqlite(self.pool.as_sqlite().unwrap(), article_ids, author_id).await
            }
            DatabaseDriver::Mysql => {
                status_for_mysql(self.pool.as_mysql().unwrap(), article_ids, author_id).await
            }
        }
    }

    async fn favorite(&self, article_id: i64, author_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                favorite_sqlite(self.pool.as_sqlite().unwrap(), article_id, author_id).await
            }
            DatabaseDriver::Mysql => {
                favorite_mysql(self.pool.as_mysql().unwrap(), article_id, author_id).await
            }
        }
    }

    async fn unfavorite(&self, article_id: i64, author_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                unfavorite_sqlite(self.pool.as_sqlite().unwrap(), article_id, author_id).await
            }
            DatabaseDriver::Mysql => {
                unfavorite_mysql(self.pool.as_mysql().unwrap(), article_id, author_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn counts_for_sqlite(pool: &SqlitePool, article_ids: &[i64]) -> Result<HashMap<i64, i64>> {
    let sql = format!(
        r#"
        SELECT article_id, COUNT(*) as count
        FROM favorites
        WHERE article_id IN ({})
        GROUP BY article_id
        "#,
        placeholders(article_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in article_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to count favorites")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("article_id"), row.get("count")))
        .collect())
}

async fn status_for_sqlite(
    pool: &SqlitePool,
    article_ids: &[i64],
    author_id: i64,
) -> Result<HashMap<i64, bool>> {
    let sql = format!(
        "SELECT article_id FROM favorites WHERE author_id = ? AND article_id IN ({})",
        placeholders(article_ids.len())
    );
    let mut query = sqlx::query(&sql).bind(author_id);
    for id in article_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load favorite status")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("article_id"), true))
        .collect())
}

async fn favorite_sqlite(pool: &SqlitePool, article_id: i64, author_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO favorites (article_id, author_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(article_id)
    .bind(author_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to favorite article")?;

    Ok(())
}

async fn unfavorite_sqlite(pool: &SqlitePool, article_id: i64, author_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM favorites WHERE article_id = ? AND author_id = ?")
        .bind(article_id)
        .bind(author_id)
        .execute(pool)
        .await
        .context("Failed to unfavorite article")?;

    Ok(())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn counts_for_mysql(pool: &MySqlPool, article_ids: &[i64]) -> Result<HashMap<i64, i64>> {
    let sql = format!(
        r#"
        SELECT article_id, COUNT(*) as count
        FROM favorites
        WHERE article_id IN ({})
        GROUP BY article_id
        "#,
        placeholders(article_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in article_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to count favorites")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("article_id"), row.get("count")))
        .collect())
}

async fn status_for_mysql(
    pool: &MySqlPool,
    article_ids: &[i64],
    author_id: i64,
) -> Result<HashMap<i64, bool>> {
    let sql = format!(
        "SELECT article_id FROM favorites WHERE author_id = ? AND article_id IN ({})",
        placeholders(article_ids.len())
    );
    let mut query = sqlx::query(&sql).bind(author_id);
    for id in article_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load favorite status")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("article_id"), true))
        .collect())
}

async fn favorite_mysql(pool: &MySqlPool, article_id: i64, author_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT IGNORE INTO favorites (article_id, author_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(article_id)
    .bind(author_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to favorite article")?;

    Ok(())
}

async fn unfavorite_mysql(pool: &MySqlPool, article_id: i64, author_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM favorites WHERE article_id = ? AND author_id = ?")
        .bind(article_id)
        .bind(author_id)
        .execute(pool)
        .await
        .context("Failed to unfavorite article")?;

    Ok(())
}
