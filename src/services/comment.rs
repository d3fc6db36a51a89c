//! Comment service
//!
//! Plain CRUD over article comments with the author sub-record resolved;
//! present so articles keep their full shape for the serialization layer.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::db::repositories::{ArticleRepository, AuthorRepository, CommentRepository};
use crate::models::{CommentView, CommentWithAuthor};

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    articles: Arc<dyn ArticleRepository>,
    authors: Arc<dyn AuthorRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        articles: Arc<dyn ArticleRepository>,
        authors: Arc<dyn AuthorRepository>,
    ) -> Self {
        Self {
            comments,
            articles,
            authors,
        }
    }

    /// Add a comment to the article with the given slug.
    pub async fn add(
        &self,
        slug: &str,
        user_id: i64,
        body: &str,
    ) -> Result<CommentView, CommentServiceError> {
        let record = self
            .articles
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CommentServiceError::ArticleNotFound(slug.to_string()))?;

        let author = self
            .authors
            .get_or_create(user_id)
            .await
            .context("Failed to resolve comment author")?;

        let comment = self
            .comments
            .create(record.article.id, author.id, body)
            .await?;

        Ok(CommentView::from_record(CommentWithAuthor {
            comment,
            author,
        }))
    }

    /// Comments on the article with the given slug, oldest first.
    pub async fn list(&self, slug: &str) -> Result<Vec<CommentView>, CommentServiceError> {
        let record = self
            .articles
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CommentServiceError::ArticleNotFound(slug.to_string()))?;

        let comments = self.comments.list_for_article(record.article.id).await?;
        Ok(comments.into_iter().map(CommentView::from_record).collect())
    }

    /// Delete a comment by id. Succeeds even when no comment matches.
    pub async fn delete(&self, id: i64) -> Result<(), CommentServiceError> {
        self.comments.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxAuthorRepository, SqlxCommentRepository, SqlxFavoriteRepository,
        SqlxTagRepository, SqlxUserDirectory,
    };
    use crate::db::{create_test_pool, schema, DynDatabasePool};
    use crate::models::NewArticle;
    use crate::services::article::ArticleService;
    use crate::services::tag::TagService;

    async fn setup() -> (DynDatabasePool, ArticleService, CommentService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        schema::create_schema(&pool)
            .await
            .expect("Failed to create schema");

        let articles = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxFavoriteRepository::boxed(pool.clone()),
            SqlxUserDirectory::boxed(pool.clone()),
            TagService::new(SqlxTagRepository::boxed(pool.clone())),
        );
        let comments = CommentService::new(
            SqlxCommentRepository::boxed(pool.clone()),
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxAuthorRepository::boxed(pool.clone()),
        );
        (pool, articles, comments)
    }

    async fn create_user(pool: &DynDatabasePool, username: &str) -> i64 {
        let result = sqlx::query("INSERT INTO users (username) VALUES (?)")
            .bind(username)
            .execute(pool.as_sqlite().unwrap())
            .await
            .expect("Failed to create test user");
        result.last_insert_rowid()
    }

    async fn publish(articles: &ArticleService, user_id: i64, title: &str) -> String {
        let view = articles
            .create(
                user_id,
                NewArticle {
                    title: title.to_string(),
                    description: "Description".to_string(),
                    body: "Body".to_string(),
                    tag_list: Vec::new(),
                },
            )
            .await
            .expect("Failed to create article");
        view.slug
    }

    #[tokio::test]
    async fn test_add_and_list_comments() {
        let (pool, articles, comments) = setup().await;
        let writer = create_user(&pool, "writer").await;
        let commenter = create_user(&pool, "commenter").await;
        let slug = publish(&articles, writer, "Commented Article").await;

        comments
            .add(&slug, commenter, "first comment")
            .await
            .expect("Failed to add comment");
        comments
            .add(&slug, commenter, "second comment")
            .await
            .expect("Failed to add comment");

        let listed = comments.list(&slug).await.expect("Failed to list comments");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].body, "first comment");
        assert_eq!(listed[1].body, "second comment");
        assert_eq!(listed[0].author.user_id, commenter);
    }

    #[tokio::test]
    async fn test_add_to_unknown_slug_is_not_found() {
        let (pool, _articles, comments) = setup().await;
        let commenter = create_user(&pool, "commenter").await;

        let result = comments.add("missing", commenter, "hello").await;
        assert!(matches!(
            result,
            Err(CommentServiceError::ArticleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_comment_is_idempotent() {
        let (pool, articles, comments) = setup().await;
        let writer = create_user(&pool, "writer").await;
        let slug = publish(&articles, writer, "Quiet Article").await;

        let comment = comments
            .add(&slug, writer, "ephemeral")
            .await
            .expect("Failed to add comment");

        comments.delete(comment.id).await.expect("Delete failed");
        comments
            .delete(comment.id)
            .await
            .expect("Repeat delete should succeed");

        let listed = comments.list(&slug).await.expect("Failed to list comments");
        assert!(listed.is_empty());
    }
}
