//! Article author repository
//!
//! Resolves external user identities to the internal author rows that own
//! articles and favorites. Rows are created lazily on first reference and
//! never deleted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::placeholders;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::ArticleAuthor;

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Resolve an external user identity to its author row, creating the
    /// row if absent. Identity 0 short-circuits to the anonymous
    /// placeholder without touching storage. Concurrent calls for the
    /// same identity never produce duplicate rows.
    async fn get_or_create(&self, user_id: i64) -> Result<ArticleAuthor>;

    /// Get an author row by external user identity
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<ArticleAuthor>>;

    /// Resolve a set of external user identities to author ids in one
    /// query. Identities without an author row are simply absent from the
    /// result.
    async fn ids_for_users(&self, user_ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn get_or_create(&self, user_id: i64) -> Result<ArticleAuthor> {
        if user_id == 0 {
            return Ok(ArticleAuthor::anonymous());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_or_create_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                get_or_create_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<ArticleAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_user_id_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                get_by_user_id_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn ids_for_users(&self, user_ids: &[i64]) -> Result<Vec<i64>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                ids_for_users_sqlite(self.pool.as_sqlite().unwrap(), user_ids).await
            }
            DatabaseDriver::Mysql => {
                ids_for_users_mysql(self.pool.as_mysql().unwrap(), user_ids).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_or_create_sqlite(pool: &SqlitePool, user_id: i64) -> Result<ArticleAuthor> {
    // Insert-or-ignore plus re-read keeps concurrent callers duplicate-free
    sqlx::query("INSERT OR IGNORE INTO article_authors (user_id, created_at) VALUES (?, ?)")
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create article author")?;

    let row = sqlx::query("SELECT id, user_id, created_at FROM article_authors WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to load article author")?;

    row_to_author_sqlite(&row)
}

async fn get_by_user_id_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<ArticleAuthor>> {
    let row = sqlx::query("SELECT id, user_id, created_at FROM article_authors WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article author")?;

    match row {
        Some(row) => Ok(Some(row_to_author_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn ids_for_users_sqlite(pool: &SqlitePool, user_ids: &[i64]) -> Result<Vec<i64>> {
    let sql = format!(
        "SELECT id FROM article_authors WHERE user_id IN ({})",
        placeholders(user_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for user_id in user_ids {
        query = query.bind(user_id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to resolve author ids")?;

    Ok(rows.iter().map(|row| row.get("id")).collect())
}

fn row_to_author_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ArticleAuthor> {
    Ok(ArticleAuthor {
        id: row.get("id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_or_create_mysql(pool: &MySqlPool, user_id: i64) -> Result<ArticleAuthor> {
    sqlx::query("INSERT IGNORE INTO article_authors (user_id, created_at) VALUES (?, ?)")
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create article author")?;

    let row = sqlx::query("SELECT id, user_id, created_at FROM article_authors WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to load article author")?;

    row_to_author_mysql(&row)
}

async fn get_by_user_id_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<ArticleAuthor>> {
    let row = sqlx::query("SELECT id, user_id, created_at FROM article_authors WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article author")?;

    match row {
        Some(row) => Ok(Some(row_to_author_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn ids_for_users_mysql(pool: &MySqlPool, user_ids: &[i64]) -> Result<Vec<i64>> {
    let sql = format!(
        "SELECT id FROM article_authors WHERE user_id IN ({})",
        placeholders(user_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for user_id in user_ids {
        query = query.bind(user_id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to resolve author ids")?;

    Ok(rows.iter().map(|row| row.get("id")).collect())
}

fn row_to_author_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ArticleAuthor> {
    Ok(ArticleAuthor {
        id: row.get("id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, schema};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxAuthorRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        schema::create_schema(&pool)
            .await
            .expect("Failed to create schema");
        let repo = SqlxAuthorRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_get_or_create_creates_row() {
        let (_pool, repo) = setup_test_repo().await;

        let author = repo
            .get_or_create(42)
            .await
            .expect("Failed to get or create author");

        assert!(author.id > 0);
        assert_eq!(author.user_id, 42);
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (_pool, repo) = setup_test_repo().await;

        let first = repo.get_or_create(7).await.expect("First call failed");
        let second = repo.get_or_create(7).await.expect("Second call failed");

        assert_eq!(first.id, second.id);

        let found = repo
            .get_by_user_id(7)
            .await
            .expect("Failed to get author")
            .expect("Author should exist");
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_get_or_create_anonymous_short_circuits() {
        let (_pool, repo) = setup_test_repo().await;

        let author = repo.get_or_create(0).await.expect("Anonymous lookup failed");

        assert!(author.is_anonymous());
        // No row was written for the anonymous placeholder
        let found = repo.get_by_user_id(0).await.expect("Lookup failed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_ids_for_users_batch_resolution() {
        let (_pool, repo) = setup_test_repo().await;

        let a = repo.get_or_create(1).await.expect("Failed to create author");
        let b = repo.get_or_create(2).await.expect("Failed to create author");

        let ids = repo
            .ids_for_users(&[1, 2, 99])
            .await
            .expect("Failed to resolve ids");

        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
    }

    #[tokio::test]
    async fn test_ids_for_users_empty_input() {
        let (_pool, repo) = setup_test_repo().await;

        let ids = repo.ids_for_users(&[]).await.expect("Empty input failed");
        assert!(ids.is_empty());
    }
}
