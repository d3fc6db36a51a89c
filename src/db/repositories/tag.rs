//! Tag repository
//!
//! Tag storage plus the tag-assignment path used on article creation and
//! update. Tag rows are created on demand and never deleted; concurrent
//! creation of the same name is resolved by re-reading after an insert
//! conflict rather than by locking.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, MySqlPool, Row, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

use super::placeholders;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Tag;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, name: &str) -> Result<Tag>;

    /// Get tag by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Replace an article's tag associations with the requested names,
    /// creating missing tags.
    ///
    /// Requested names are not deduplicated; the returned list keeps one
    /// entry per requested occurrence, in input order. The association
    /// table itself cannot hold duplicates. Runs in a single transaction;
    /// a failure leaves the article's associations untouched.
    async fn set_for_article(&self, article_id: i64, names: &[String]) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, name: &str) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), name).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => get_by_name_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn set_for_article(&self, article_id: i64, names: &[String]) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_for_article_sqlite(self.pool.as_sqlite().unwrap(), article_id, names).await
            }
            DatabaseDriver::Mysql => {
                set_for_article_mysql(self.pool.as_mysql().unwrap(), article_id, names).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, name: &str) -> Result<Tag> {
    let created_at = Utc::now();
    let result = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(created_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create tag: {}", name))?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        created_at,
    })
}

async fn get_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by name")?;

    match row {
        Some(row) => Ok(Some(row_to_tag_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, created_at FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row_to_tag_sqlite(&row)?);
    }

    Ok(tags)
}

async fn set_for_article_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    names: &[String],
) -> Result<Vec<Tag>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // Replace semantics: the requested list becomes the association set
    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear tag associations")?;

    let mut known: HashMap<String, Tag> = HashMap::new();
    if !names.is_empty() {
        let sql = format!(
            "SELECT id, name, created_at FROM tags WHERE name IN ({})",
            placeholders(names.len())
        );
        let mut query = sqlx::query(&sql);
        for name in names {
            query = query.bind(name);
        }
        let rows = query
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch existing tags")?;
        for row in rows {
            let tag = row_to_tag_sqlite(&row)?;
            known.insert(tag.name.clone(), tag);
        }
    }

    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let tag = match known.get(name) {
            Some(tag) => tag.clone(),
            None => insert_or_refetch_sqlite(&mut tx, name).await?,
        };
        sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await
            .context("Failed to associate tag")?;
        result.push(tag);
    }

    tx.commit().await.context("Failed to commit tag assignment")?;
    Ok(result)
}

async fn insert_or_refetch_sqlite(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<Tag> {
    let created_at = Utc::now();
    let inserted = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(created_at)
        .execute(&mut **tx)
        .await;

    match inserted {
        Ok(result) => Ok(Tag {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            created_at,
        }),
        Err(insert_err) => {
            // Another writer (or an earlier occurrence of the same name in
            // this call) owns the row now; use it instead of failing
            let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await
                .context("Failed to refetch tag after insert conflict")?;
            match row {
                Some(row) => {
                    tracing::debug!(tag = name, "Tag insert conflicted, reusing existing row");
                    row_to_tag_sqlite(&row)
                }
                None => {
                    Err(insert_err).with_context(|| format!("Failed to create tag: {}", name))
                }
            }
        }
    }
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, name: &str) -> Result<Tag> {
    let created_at = Utc::now();
    let result = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(created_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create tag: {}", name))?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        name: name.to_string(),
        created_at,
    })
}

async fn get_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by name")?;

    match row {
        Some(row) => Ok(Some(row_to_tag_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, created_at FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row_to_tag_mysql(&row)?);
    }

    Ok(tags)
}

async fn set_for_article_mysql(
    pool: &MySqlPool,
    article_id: i64,
    names: &[String],
) -> Result<Vec<Tag>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear tag associations")?;

    let mut known: HashMap<String, Tag> = HashMap::new();
    if !names.is_empty() {
        let sql = format!(
            "SELECT id, name, created_at FROM tags WHERE name IN ({})",
            placeholders(names.len())
        );
        let mut query = sqlx::query(&sql);
        for name in names {
            query = query.bind(name);
        }
        let rows = query
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch existing tags")?;
        for row in rows {
            let tag = row_to_tag_mysql(&row)?;
            known.insert(tag.name.clone(), tag);
        }
    }

    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let tag = match known.get(name) {
            Some(tag) => tag.clone(),
            None => insert_or_refetch_mysql(&mut tx, name).await?,
        };
        sqlx::query("INSERT IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await
            .context("Failed to associate tag")?;
        result.push(tag);
    }

    tx.commit().await.context("Failed to commit tag assignment")?;
    Ok(result)
}

async fn insert_or_refetch_mysql(tx: &mut Transaction<'_, MySql>, name: &str) -> Result<Tag> {
    let created_at = Utc::now();
    let inserted = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(created_at)
        .execute(&mut **tx)
        .await;

    match inserted {
        Ok(result) => Ok(Tag {
            id: result.last_insert_id() as i64,
            name: name.to_string(),
            created_at,
        }),
        Err(insert_err) => {
            let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await
                .context("Failed to refetch tag after insert conflict")?;
            match row {
                Some(row) => {
                    tracing::debug!(tag = name, "Tag insert conflicted, reusing existing row");
                    row_to_tag_mysql(&row)
                }
                None => {
                    Err(insert_err).with_context(|| format!("Failed to create tag: {}", name))
                }
            }
        }
    }
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Tag> {
    Ok(Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    })
}
