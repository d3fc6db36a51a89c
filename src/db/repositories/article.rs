//! Article repository
//!
//! Storage for articles and the listing strategies behind the public
//! article index and the follow feed. Every listing strategy runs inside
//! one transaction so the total count and the fetched page describe the
//! same snapshot, and fetches its page with the author and tag relations
//! preloaded in batched queries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::placeholders;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    Article, ArticleAuthor, ArticleWithRelations, CreateArticleInput, PageParams, Tag,
};

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, input: &CreateArticleInput) -> Result<Article>;

    /// Get a live article by slug with author and tags preloaded
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleWithRelations>>;

    /// Persist the mutable fields of an article and bump `updated_at`
    async fn update(&self, article: &Article) -> Result<()>;

    /// Soft-delete by slug. Succeeds even when no live row matches.
    async fn delete_by_slug(&self, slug: &str) -> Result<()>;

    /// Page of articles carrying the named tag, plus the total match
    /// count. An unknown tag yields an empty page and zero, not an error.
    async fn list_by_tag(
        &self,
        tag: &str,
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)>;

    /// Page of articles owned by the given author, plus the total count
    async fn list_by_author(
        &self,
        author_id: i64,
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)>;

    /// Page of articles favorited by the given author, plus the total
    /// count
    async fn list_favorited_by(
        &self,
        author_id: i64,
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)>;

    /// Unfiltered page over the full article set, plus the total count.
    /// Applies offset/limit directly on the main listing query.
    async fn list_all(&self, page: PageParams) -> Result<(Vec<ArticleWithRelations>, i64)>;

    /// Page of articles authored by any of the given authors, most
    /// recently updated first, plus the total count. An empty author set
    /// yields an empty page and zero without a query.
    async fn feed(
        &self,
        author_ids: &[i64],
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, input: &CreateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleWithRelations>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn update(&self, article: &Article) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), article).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), article).await,
        }
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                delete_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list_by_tag(
        &self,
        tag: &str,
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_tag_sqlite(self.pool.as_sqlite().unwrap(), tag, page).await
            }
            DatabaseDriver::Mysql => {
                list_by_tag_mysql(self.pool.as_mysql().unwrap(), tag, page).await
            }
        }
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id, page).await
            }
            DatabaseDriver::Mysql => {
                list_by_author_mysql(self.pool.as_mysql().unwrap(), author_id, page).await
            }
        }
    }

    async fn list_favorited_by(
        &self,
        author_id: i64,
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_favorited_by_sqlite(self.pool.as_sqlite().unwrap(), author_id, page).await
            }
            DatabaseDriver::Mysql => {
                list_favorited_by_mysql(self.pool.as_mysql().unwrap(), author_id, page).await
            }
        }
    }

    async fn list_all(&self, page: PageParams) -> Result<(Vec<ArticleWithRelations>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_all_sqlite(self.pool.as_sqlite().unwrap(), page).await,
            DatabaseDriver::Mysql => list_all_mysql(self.pool.as_mysql().unwrap(), page).await,
        }
    }

    async fn feed(
        &self,
        author_ids: &[i64],
        page: PageParams,
    ) -> Result<(Vec<ArticleWithRelations>, i64)> {
        if author_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                feed_sqlite(self.pool.as_sqlite().unwrap(), author_ids, page).await
            }
            DatabaseDriver::Mysql => {
                feed_mysql(self.pool.as_mysql().unwrap(), author_ids, page).await
            }
        }
    }
}

// Shared query text. Both drivers speak `?` placeholders, so the SQL is
// written once; only the row mapping differs.

const SELECT_WITH_AUTHOR: &str = r#"
    SELECT a.id, a.slug, a.title, a.description, a.body, a.author_id,
           a.created_at, a.updated_at, a.deleted_at,
           au.user_id AS author_user_id, au.created_at AS author_created_at
    FROM articles a
    JOIN article_authors au ON au.id = a.author_id
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateArticleInput) -> Result<Article> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO articles (slug, title, description, body, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.body)
    .bind(input.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        title: input.title.clone(),
        description: input.description.clone(),
        body: input.body.clone(),
        author_id: input.author_id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    })
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<ArticleWithRelations>> {
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire connection")?;

    let sql = format!("{} WHERE a.slug = ? AND a.deleted_at IS NULL", SELECT_WITH_AUTHOR);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get article by slug")?;

    let record = match row {
        Some(row) => row_to_record_sqlite(&row)?,
        None => return Ok(None),
    };

    let mut records = vec![record];
    load_tags_sqlite(&mut conn, &mut records).await?;
    Ok(records.pop())
}

async fn update_sqlite(pool: &SqlitePool, article: &Article) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE articles
        SET slug = ?, title = ?, description = ?, body = ?, updated_at = ?
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.body)
    .bind(Utc::now())
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    Ok(())
}

async fn delete_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<()> {
    // Deleting a missing or already deleted article is a silent no-op
    sqlx::query("UPDATE articles SET deleted_at = ? WHERE slug = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(slug)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

async fn list_by_tag_sqlite(
    pool: &SqlitePool,
    tag: &str,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let tag_row = sqlx::query("SELECT id FROM tags WHERE name = ?")
        .bind(tag)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to resolve tag")?;
    let tag_id: i64 = match tag_row {
        Some(row) => row.get("id"),
        None => return Ok((Vec::new(), 0)),
    };

    let count_row = sqlx::query(
        r#"
        SELECT COUNT(*) as count
        FROM article_tags at
        JOIN articles a ON a.id = at.article_id
        WHERE at.tag_id = ? AND a.deleted_at IS NULL
        "#,
    )
    .bind(tag_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to count articles by tag")?;
    let total: i64 = count_row.get("count");

    let id_rows = sqlx::query(
        r#"
        SELECT a.id
        FROM articles a
        JOIN article_tags at ON at.article_id = a.id
        WHERE at.tag_id = ? AND a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(tag_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await
    .context("Failed to page articles by tag")?;
    let ids: Vec<i64> = id_rows.iter().map(|row| row.get("id")).collect();

    let articles = fetch_by_ids_sqlite(&mut tx, &ids).await?;
    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn list_by_author_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_row =
        sqlx::query("SELECT COUNT(*) as count FROM articles WHERE author_id = ? AND deleted_at IS NULL")
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count articles by author")?;
    let total: i64 = count_row.get("count");

    let id_rows = sqlx::query(
        r#"
        SELECT id FROM articles
        WHERE author_id = ? AND deleted_at IS NULL
        ORDER BY updated_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(author_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await
    .context("Failed to page articles by author")?;
    let ids: Vec<i64> = id_rows.iter().map(|row| row.get("id")).collect();

    let articles = fetch_by_ids_sqlite(&mut tx, &ids).await?;
    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn list_favorited_by_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_row = sqlx::query(
        r#"
        SELECT COUNT(*) as count
        FROM favorites f
        JOIN articles a ON a.id = f.article_id
        WHERE f.author_id = ? AND a.deleted_at IS NULL
        "#,
    )
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to count favorited articles")?;
    let total: i64 = count_row.get("count");

    let id_rows = sqlx::query(
        r#"
        SELECT a.id
        FROM favorites f
        JOIN articles a ON a.id = f.article_id
        WHERE f.author_id = ? AND a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(author_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await
    .context("Failed to page favorited articles")?;
    let ids: Vec<i64> = id_rows.iter().map(|row| row.get("id")).collect();

    let articles = fetch_by_ids_sqlite(&mut tx, &ids).await?;
    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn list_all_sqlite(
    pool: &SqlitePool,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE deleted_at IS NULL")
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count articles")?;
    let total: i64 = count_row.get("count");

    // No filter subject to resolve; offset/limit applies straight to the
    // main listing query
    let sql = format!(
        r#"{}
        WHERE a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
        SELECT_WITH_AUTHOR
    );
    let rows = sqlx::query(&sql)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_record_sqlite(&row)?);
    }
    load_tags_sqlite(&mut tx, &mut articles).await?;

    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn feed_sqlite(
    pool: &SqlitePool,
    author_ids: &[i64],
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_sql = format!(
        "SELECT COUNT(*) as count FROM articles WHERE author_id IN ({}) AND deleted_at IS NULL",
        placeholders(author_ids.len())
    );
    let mut count_query = sqlx::query(&count_sql);
    for id in author_ids {
        count_query = count_query.bind(id);
    }
    let count_row = count_query
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count feed articles")?;
    let total: i64 = count_row.get("count");

    let sql = format!(
        r#"{}
        WHERE a.author_id IN ({}) AND a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
        SELECT_WITH_AUTHOR,
        placeholders(author_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in author_ids {
        query = query.bind(id);
    }
    let rows = query
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list feed articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_record_sqlite(&row)?);
    }
    load_tags_sqlite(&mut tx, &mut articles).await?;

    tx.commit().await.context("Failed to commit feed listing")?;
    Ok((articles, total))
}

/// Batch-fetch full records for a page of ids, author joined, tags loaded
/// in one extra query.
async fn fetch_by_ids_sqlite(
    conn: &mut sqlx::SqliteConnection,
    ids: &[i64],
) -> Result<Vec<ArticleWithRelations>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"{}
        WHERE a.id IN ({})
        ORDER BY a.updated_at DESC, a.id DESC
        "#,
        SELECT_WITH_AUTHOR,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(&mut *conn)
        .await
        .context("Failed to fetch articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_record_sqlite(&row)?);
    }
    load_tags_sqlite(conn, &mut articles).await?;
    Ok(articles)
}

async fn load_tags_sqlite(
    conn: &mut sqlx::SqliteConnection,
    records: &mut [ArticleWithRelations],
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = records.iter().map(|r| r.article.id).collect();
    let sql = format!(
        r#"
        SELECT at.article_id, t.id, t.name, t.created_at
        FROM article_tags at
        JOIN tags t ON t.id = at.tag_id
        WHERE at.article_id IN ({})
        ORDER BY t.name
        "#,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in &ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load article tags")?;

    let mut tags_by_article: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        tags_by_article
            .entry(row.get("article_id"))
            .or_default()
            .push(Tag {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            });
    }

    for record in records.iter_mut() {
        record.tags = tags_by_article
            .remove(&record.article.id)
            .unwrap_or_default();
    }
    Ok(())
}

fn row_to_record_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ArticleWithRelations> {
    Ok(ArticleWithRelations {
        article: Article {
            id: row.get("id"),
            slug: row.get("slug"),
            title: row.get("title"),
            description: row.get("description"),
            body: row.get("body"),
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        },
        author: ArticleAuthor {
            id: row.get("author_id"),
            user_id: row.get("author_user_id"),
            created_at: row.get("author_created_at"),
        },
        tags: Vec::new(),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateArticleInput) -> Result<Article> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO articles (slug, title, description, body, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.body)
    .bind(input.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        title: input.title.clone(),
        description: input.description.clone(),
        body: input.body.clone(),
        author_id: input.author_id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    })
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<ArticleWithRelations>> {
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire connection")?;

    let sql = format!("{} WHERE a.slug = ? AND a.deleted_at IS NULL", SELECT_WITH_AUTHOR);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get article by slug")?;

    let record = match row {
        Some(row) => row_to_record_mysql(&row)?,
        None => return Ok(None),
    };

    let mut records = vec![record];
    load_tags_mysql(&mut conn, &mut records).await?;
    Ok(records.pop())
}

async fn update_mysql(pool: &MySqlPool, article: &Article) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE articles
        SET slug = ?, title = ?, description = ?, body = ?, updated_at = ?
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.body)
    .bind(Utc::now())
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    Ok(())
}

async fn delete_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<()> {
    sqlx::query("UPDATE articles SET deleted_at = ? WHERE slug = ? AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(slug)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

async fn list_by_tag_mysql(
    pool: &MySqlPool,
    tag: &str,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let tag_row = sqlx::query("SELECT id FROM tags WHERE name = ?")
        .bind(tag)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to resolve tag")?;
    let tag_id: i64 = match tag_row {
        Some(row) => row.get("id"),
        None => return Ok((Vec::new(), 0)),
    };

    let count_row = sqlx::query(
        r#"
        SELECT COUNT(*) as count
        FROM article_tags at
        JOIN articles a ON a.id = at.article_id
        WHERE at.tag_id = ? AND a.deleted_at IS NULL
        "#,
    )
    .bind(tag_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to count articles by tag")?;
    let total: i64 = count_row.get("count");

    let id_rows = sqlx::query(
        r#"
        SELECT a.id
        FROM articles a
        JOIN article_tags at ON at.article_id = a.id
        WHERE at.tag_id = ? AND a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(tag_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await
    .context("Failed to page articles by tag")?;
    let ids: Vec<i64> = id_rows.iter().map(|row| row.get("id")).collect();

    let articles = fetch_by_ids_mysql(&mut tx, &ids).await?;
    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn list_by_author_mysql(
    pool: &MySqlPool,
    author_id: i64,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_row =
        sqlx::query("SELECT COUNT(*) as count FROM articles WHERE author_id = ? AND deleted_at IS NULL")
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count articles by author")?;
    let total: i64 = count_row.get("count");

    let id_rows = sqlx::query(
        r#"
        SELECT id FROM articles
        WHERE author_id = ? AND deleted_at IS NULL
        ORDER BY updated_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(author_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await
    .context("Failed to page articles by author")?;
    let ids: Vec<i64> = id_rows.iter().map(|row| row.get("id")).collect();

    let articles = fetch_by_ids_mysql(&mut tx, &ids).await?;
    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn list_favorited_by_mysql(
    pool: &MySqlPool,
    author_id: i64,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_row = sqlx::query(
        r#"
        SELECT COUNT(*) as count
        FROM favorites f
        JOIN articles a ON a.id = f.article_id
        WHERE f.author_id = ? AND a.deleted_at IS NULL
        "#,
    )
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to count favorited articles")?;
    let total: i64 = count_row.get("count");

    let id_rows = sqlx::query(
        r#"
        SELECT a.id
        FROM favorites f
        JOIN articles a ON a.id = f.article_id
        WHERE f.author_id = ? AND a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(author_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await
    .context("Failed to page favorited articles")?;
    let ids: Vec<i64> = id_rows.iter().map(|row| row.get("id")).collect();

    let articles = fetch_by_ids_mysql(&mut tx, &ids).await?;
    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn list_all_mysql(
    pool: &MySqlPool,
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE deleted_at IS NULL")
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count articles")?;
    let total: i64 = count_row.get("count");

    let sql = format!(
        r#"{}
        WHERE a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
        SELECT_WITH_AUTHOR
    );
    let rows = sqlx::query(&sql)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_record_mysql(&row)?);
    }
    load_tags_mysql(&mut tx, &mut articles).await?;

    tx.commit().await.context("Failed to commit listing")?;
    Ok((articles, total))
}

async fn feed_mysql(
    pool: &MySqlPool,
    author_ids: &[i64],
    page: PageParams,
) -> Result<(Vec<ArticleWithRelations>, i64)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let count_sql = format!(
        "SELECT COUNT(*) as count FROM articles WHERE author_id IN ({}) AND deleted_at IS NULL",
        placeholders(author_ids.len())
    );
    let mut count_query = sqlx::query(&count_sql);
    for id in author_ids {
        count_query = count_query.bind(id);
    }
    let count_row = count_query
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count feed articles")?;
    let total: i64 = count_row.get("count");

    let sql = format!(
        r#"{}
        WHERE a.author_id IN ({}) AND a.deleted_at IS NULL
        ORDER BY a.updated_at DESC, a.id DESC
        LIMIT ? OFFSET ?
        "#,
        SELECT_WITH_AUTHOR,
        placeholders(author_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in author_ids {
        query = query.bind(id);
    }
    let rows = query
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list feed articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_record_mysql(&row)?);
    }
    load_tags_mysql(&mut tx, &mut articles).await?;

    tx.commit().await.context("Failed to commit feed listing")?;
    Ok((articles, total))
}

async fn fetch_by_ids_mysql(
    conn: &mut sqlx::MySqlConnection,
    ids: &[i64],
) -> Result<Vec<ArticleWithRelations>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"{}
        WHERE a.id IN ({})
        ORDER BY a.updated_at DESC, a.id DESC
        "#,
        SELECT_WITH_AUTHOR,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(&mut *conn)
        .await
        .context("Failed to fetch articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_record_mysql(&row)?);
    }
    load_tags_mysql(conn, &mut articles).await?;
    Ok(articles)
}

async fn load_tags_mysql(
    conn: &mut sqlx::MySqlConnection,
    records: &mut [ArticleWithRelations],
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = records.iter().map(|r| r.article.id).collect();
    let sql = format!(
        r#"
        SELECT at.article_id, t.id, t.name, t.created_at
        FROM article_tags at
        JOIN tags t ON t.id = at.tag_id
        WHERE at.article_id IN ({})
        ORDER BY t.name
        "#,
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in &ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load article tags")?;

    let mut tags_by_article: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        tags_by_article
            .entry(row.get("article_id"))
            .or_default()
            .push(Tag {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            });
    }

    for record in records.iter_mut() {
        record.tags = tags_by_article
            .remove(&record.article.id)
            .unwrap_or_default();
    }
    Ok(())
}

fn row_to_record_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ArticleWithRelations> {
    Ok(ArticleWithRelations {
        article: Article {
            id: row.get("id"),
            slug: row.get("slug"),
            title: row.get("title"),
            description: row.get("description"),
            body: row.get("body"),
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        },
        author: ArticleAuthor {
            id: row.get("author_id"),
            user_id: row.get("author_user_id"),
            created_at: row.get("author_created_at"),
        },
        tags: Vec::new(),
    })
}
