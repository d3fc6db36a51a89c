//! Schema bootstrap
//!
//! Creates the engine's tables with `CREATE TABLE IF NOT EXISTS`
//! statements embedded per driver. The `users` and `follows` tables are
//! minimal projections of the identity subsystem's schema; that subsystem
//! owns the full definitions, these exist so the engine and its tests can
//! run against a single store.

use anyhow::Result;

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

const SCHEMA_SQLITE: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username VARCHAR(255) NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS follows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        following_id INTEGER NOT NULL,
        followed_by_id INTEGER NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (following_id, followed_by_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug VARCHAR(255) NOT NULL,
        title VARCHAR(255) NOT NULL,
        description VARCHAR(2048) NOT NULL,
        body TEXT NOT NULL,
        author_id INTEGER NOT NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        deleted_at TIMESTAMP,
        FOREIGN KEY (author_id) REFERENCES article_authors(id)
    )
    "#,
    // Slug uniqueness holds only among live articles
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_live_slug
        ON articles(slug) WHERE deleted_at IS NULL
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_articles_updated_at ON articles(updated_at)",
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(255) NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_tags (
        article_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        PRIMARY KEY (article_id, tag_id),
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS favorites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL,
        author_id INTEGER NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (article_id, author_id),
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES article_authors(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_favorites_author_id ON favorites(author_id)",
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL,
        author_id INTEGER NOT NULL,
        body VARCHAR(2048) NOT NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES article_authors(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id)",
];

// MySQL has no partial indexes; slug uniqueness among live rows is the
// caller's concern there. Secondary indexes are declared inline so the
// statements stay idempotent.
const SCHEMA_MYSQL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        username VARCHAR(255) NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS follows (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        following_id BIGINT NOT NULL,
        followed_by_id BIGINT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_follows_pair (following_id, followed_by_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_authors (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        user_id BIGINT NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        slug VARCHAR(255) NOT NULL,
        title VARCHAR(255) NOT NULL,
        description VARCHAR(2048) NOT NULL,
        body TEXT NOT NULL,
        author_id BIGINT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        deleted_at TIMESTAMP NULL,
        INDEX idx_articles_slug (slug),
        INDEX idx_articles_author_id (author_id),
        INDEX idx_articles_updated_at (updated_at),
        FOREIGN KEY (author_id) REFERENCES article_authors(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        name VARCHAR(255) NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_tags (
        article_id BIGINT NOT NULL,
        tag_id BIGINT NOT NULL,
        PRIMARY KEY (article_id, tag_id),
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS favorites (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        article_id BIGINT NOT NULL,
        author_id BIGINT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_favorites_pair (article_id, author_id),
        INDEX idx_favorites_author_id (author_id),
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES article_authors(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id BIGINT PRIMARY KEY AUTO_INCREMENT,
        article_id BIGINT NOT NULL,
        author_id BIGINT NOT NULL,
        body VARCHAR(2048) NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX idx_comments_article_id (article_id),
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES article_authors(id)
    )
    "#,
];

/// Create all tables and indexes for the configured driver.
///
/// Safe to call on every startup; existing objects are left untouched.
pub async fn create_schema(pool: &DynDatabasePool) -> Result<()> {
    let statements = match pool.driver() {
        DatabaseDriver::Sqlite => SCHEMA_SQLITE,
        DatabaseDriver::Mysql => SCHEMA_MYSQL,
    };

    for statement in statements {
        pool.execute(statement).await?;
    }

    tracing::debug!("Database schema ready");
    Ok(())
}
