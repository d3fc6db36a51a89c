//! Article service
//!
//! Orchestrates the listing strategies, the follow feed and article CRUD.
//! Listing picks exactly one strategy from the `ArticleFilter` enum,
//! resolves the filter subject, and attaches favorite counts and viewer
//! status to the resulting page through two batched aggregator calls, so
//! no per-article queries happen anywhere on the read path.
//!
//! An unknown filter subject (tag, author or favoriting user) is not an
//! error; it yields an empty page with a zero total.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::db::repositories::{
    ArticleRepository, AuthorRepository, FavoriteRepository, UserDirectory,
};
use crate::models::{
    ArticleFilter, ArticleView, ArticleWithRelations, CreateArticleInput, NewArticle, PageParams,
    UpdateArticle,
};

use super::tag::{TagService, TagServiceError};

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for ArticleServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::InternalError(e) => ArticleServiceError::InternalError(e),
        }
    }
}

/// Article service
pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    authors: Arc<dyn AuthorRepository>,
    favorites: Arc<dyn FavoriteRepository>,
    users: Arc<dyn UserDirectory>,
    tags: TagService,
}

impl ArticleService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        authors: Arc<dyn AuthorRepository>,
        favorites: Arc<dyn FavoriteRepository>,
        users: Arc<dyn UserDirectory>,
        tags: TagService,
    ) -> Self {
        Self {
            articles,
            authors,
            favorites,
            users,
            tags,
        }
    }

    /// Create an article owned by the given external user, deriving the
    /// slug from the title and assigning the requested tags.
    pub async fn create(
        &self,
        user_id: i64,
        input: NewArticle,
    ) -> Result<ArticleView, ArticleServiceError> {
        let author = self
            .authors
            .get_or_create(user_id)
            .await
            .context("Failed to resolve author")?;

        let article = self
            .articles
            .create(&CreateArticleInput {
                slug: generate_slug(&input.title),
                title: input.title,
                description: input.description,
                body: input.body,
                author_id: author.id,
            })
            .await?;

        let tags = self.tags.set_tags(article.id, &input.tag_list).await?;

        tracing::debug!(slug = %article.slug, "Created article");
        Ok(ArticleView::from_parts(
            ArticleWithRelations {
                article,
                author,
                tags,
            },
            false,
            0,
        ))
    }

    /// Get a single article by slug, with favorite data resolved for the
    /// given viewer (0 for no viewer).
    pub async fn get_by_slug(
        &self,
        slug: &str,
        viewer_user_id: i64,
    ) -> Result<Option<ArticleView>, ArticleServiceError> {
        let record = match self.articles.get_by_slug(slug).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        let mut views = self.to_views(vec![record], viewer_user_id).await?;
        Ok(views.pop())
    }

    /// List articles under exactly one filter strategy with pagination,
    /// returning the page and the total match count.
    pub async fn list(
        &self,
        filter: &ArticleFilter,
        page: PageParams,
        viewer_user_id: i64,
    ) -> Result<(Vec<ArticleView>, i64), ArticleServiceError> {
        let (records, total) = match filter {
            ArticleFilter::Tag(tag) => self.articles.list_by_tag(tag, page).await?,
            ArticleFilter::Author(username) => match self.resolve_author(username).await? {
                Some(author_id) => self.articles.list_by_author(author_id, page).await?,
                None => (Vec::new(), 0),
            },
            ArticleFilter::FavoritedBy(username) => match self.resolve_author(username).await? {
                Some(author_id) => self.articles.list_favorited_by(author_id, page).await?,
                None => (Vec::new(), 0),
            },
            ArticleFilter::Unfiltered => self.articles.list_all(page).await?,
        };

        tracing::debug!(?filter, total, returned = records.len(), "Listed articles");
        let views = self.to_views(records, viewer_user_id).await?;
        Ok((views, total))
    }

    /// Raw query-surface entry point: selects the filter by precedence
    /// and coerces string pagination parameters in one step.
    pub async fn list_from_query(
        &self,
        tag: &str,
        author: &str,
        favorited: &str,
        limit: &str,
        offset: &str,
        viewer_user_id: i64,
    ) -> Result<(Vec<ArticleView>, i64), ArticleServiceError> {
        self.list(
            &ArticleFilter::from_query(tag, author, favorited),
            PageParams::from_query(limit, offset),
            viewer_user_id,
        )
        .await
    }

    /// Raw query-surface entry point for the feed, with the same
    /// pagination coercion as `list_from_query`.
    pub async fn feed_from_query(
        &self,
        viewer_user_id: i64,
        limit: &str,
        offset: &str,
    ) -> Result<(Vec<ArticleView>, i64), ArticleServiceError> {
        self.feed(viewer_user_id, PageParams::from_query(limit, offset))
            .await
    }

    /// Articles by authors the viewer follows, most recently updated
    /// first. A viewer following no one gets an empty page and a zero
    /// total without touching the article table.
    pub async fn feed(
        &self,
        viewer_user_id: i64,
        page: PageParams,
    ) -> Result<(Vec<ArticleView>, i64), ArticleServiceError> {
        let followed = self
            .users
            .followed_user_ids(viewer_user_id)
            .await
            .context("Failed to load followed users")?;
        if followed.is_empty() {
            return Ok((Vec::new(), 0));
        }

        // One batched query maps the followed identities to author ids
        let author_ids = self
            .authors
            .ids_for_users(&followed)
            .await
            .context("Failed to resolve followed authors")?;
        let (records, total) = self.articles.feed(&author_ids, page).await?;

        tracing::debug!(viewer_user_id, total, "Built feed");
        let views = self.to_views(records, viewer_user_id).await?;
        Ok((views, total))
    }

    /// Apply a partial update to the article with the given slug. A new
    /// title regenerates the slug; a present tag list replaces the tag
    /// associations.
    pub async fn update(
        &self,
        slug: &str,
        viewer_user_id: i64,
        input: UpdateArticle,
    ) -> Result<ArticleView, ArticleServiceError> {
        let record = self
            .articles
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))?;

        let mut article = record.article;
        if let Some(title) = input.title {
            article.slug = generate_slug(&title);
            article.title = title;
        }
        if let Some(description) = input.description {
            article.description = description;
        }
        if let Some(body) = input.body {
            article.body = body;
        }

        self.articles.update(&article).await?;
        if let Some(tag_list) = input.tag_list {
            self.tags.set_tags(article.id, &tag_list).await?;
        }

        let updated = self
            .articles
            .get_by_slug(&article.slug)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(article.slug.clone()))?;
        let mut views = self.to_views(vec![updated], viewer_user_id).await?;
        views
            .pop()
            .ok_or_else(|| ArticleServiceError::NotFound(article.slug))
    }

    /// Soft-delete by slug. Succeeds even when no article matches.
    pub async fn delete(&self, slug: &str) -> Result<(), ArticleServiceError> {
        self.articles.delete_by_slug(slug).await?;
        Ok(())
    }

    /// Favorite an article for the given user. Repeat favoriting leaves
    /// exactly one favorite in place.
    pub async fn favorite(
        &self,
        slug: &str,
        user_id: i64,
    ) -> Result<ArticleView, ArticleServiceError> {
        let record = self
            .articles
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))?;

        let author = self
            .authors
            .get_or_create(user_id)
            .await
            .context("Failed to resolve favoriting author")?;
        self.favorites.favorite(record.article.id, author.id).await?;

        let mut views = self.to_views(vec![record], user_id).await?;
        views
            .pop()
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))
    }

    /// Remove a favorite. Unfavoriting an article that was never
    /// favorited is a no-op, not an error.
    pub async fn unfavorite(
        &self,
        slug: &str,
        user_id: i64,
    ) -> Result<ArticleView, ArticleServiceError> {
        let record = self
            .articles
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))?;

        let author = self
            .authors
            .get_or_create(user_id)
            .await
            .context("Failed to resolve favoriting author")?;
        self.favorites
            .unfavorite(record.article.id, author.id)
            .await?;

        let mut views = self.to_views(vec![record], user_id).await?;
        views
            .pop()
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))
    }

    /// Resolve a username to an article-author id through the external
    /// directory, creating the author shadow on first reference. An
    /// unknown username resolves to `None`.
    async fn resolve_author(&self, username: &str) -> Result<Option<i64>> {
        let user_id = match self
            .users
            .find_user_id(username)
            .await
            .context("Failed to look up user")?
        {
            Some(user_id) => user_id,
            None => return Ok(None),
        };

        let author = self
            .authors
            .get_or_create(user_id)
            .await
            .context("Failed to resolve author")?;
        Ok(Some(author.id))
    }

    /// Attach favorite counts and viewer status to a page of records in
    /// two batched aggregator calls and produce the exposed views.
    async fn to_views(
        &self,
        records: Vec<ArticleWithRelations>,
        viewer_user_id: i64,
    ) -> Result<Vec<ArticleView>, ArticleServiceError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = records.iter().map(|r| r.article.id).collect();
        let counts = self
            .favorites
            .counts_for(&ids)
            .await
            .context("Failed to load favorite counts")?;

        let viewer = self
            .authors
            .get_or_create(viewer_user_id)
            .await
            .context("Failed to resolve viewer")?;
        let status = self
            .favorites
            .status_for(&ids, viewer.id)
            .await
            .context("Failed to load favorite status")?;

        Ok(records
            .into_iter()
            .map(|record| {
                let id = record.article.id;
                // Absent means zero / not favorited
                let count = counts.get(&id).copied().unwrap_or(0);
                let favorited = status.get(&id).copied().unwrap_or(false);
                ArticleView::from_parts(record, favorited, count)
            })
            .collect())
    }
}

/// Derive a URL-friendly slug from an article title.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || !c.is_ascii() {
                c
            } else {
                '-'
            }
        })
        .collect();

    // Collapse runs of hyphens and trim them from both ends
    let mut result = String::new();
    let mut prev_hyphen = false;
    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxAuthorRepository, SqlxFavoriteRepository, SqlxTagRepository,
        SqlxUserDirectory,
    };
    use crate::db::{create_test_pool, schema, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, ArticleService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        schema::create_schema(&pool)
            .await
            .expect("Failed to create schema");

        let service = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxFavoriteRepository::boxed(pool.clone()),
            SqlxUserDirectory::boxed(pool.clone()),
            TagService::new(SqlxTagRepository::boxed(pool.clone())),
        );
        (pool, service)
    }

    async fn create_user(pool: &DynDatabasePool, username: &str) -> i64 {
        let result = sqlx::query("INSERT INTO users (username) VALUES (?)")
            .bind(username)
            .execute(pool.as_sqlite().unwrap())
            .await
            .expect("Failed to create test user");
        result.last_insert_rowid()
    }

    async fn follow(pool: &DynDatabasePool, follower: i64, following: i64) {
        sqlx::query("INSERT INTO follows (following_id, followed_by_id) VALUES (?, ?)")
            .bind(following)
            .bind(follower)
            .execute(pool.as_sqlite().unwrap())
            .await
            .expect("Failed to create follow");
    }

    fn new_article(title: &str, tags: &[&str]) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            description: "Description".to_string(),
            body: "Body".to_string(),
            tag_list: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Spaced   Out  "), "spaced-out");
        assert_eq!(generate_slug("already-a-slug"), "already-a-slug");
        assert_eq!(generate_slug("Rust 2024"), "rust-2024");
    }

    #[tokio::test]
    async fn test_create_article_with_tags() {
        let (pool, service) = setup().await;
        let user = create_user(&pool, "jane").await;

        let view = service
            .create(user, new_article("Test Article", &["web", "rust"]))
            .await
            .expect("Failed to create article");

        assert_eq!(view.slug, "test-article");
        assert_eq!(view.tag_list, vec!["rust", "web"]);
        assert!(!view.favorited);
        assert_eq!(view.favorites_count, 0);
        assert_eq!(view.author.user_id, user);
    }

    #[tokio::test]
    async fn test_unfiltered_listing_orders_by_recency() {
        let (pool, service) = setup().await;
        let user_a = create_user(&pool, "author-a").await;
        let user_b = create_user(&pool, "author-b").await;

        service
            .create(user_a, new_article("Article A", &[]))
            .await
            .expect("Failed to create article");
        service
            .create(user_b, new_article("Article B", &[]))
            .await
            .expect("Failed to create article");

        let (views, total) = service
            .list(&ArticleFilter::Unfiltered, PageParams::new(10, 0), 0)
            .await
            .expect("Listing failed");

        assert_eq!(total, 2);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].slug, "article-b");
        assert_eq!(views[1].slug, "article-a");
    }

    #[tokio::test]
    async fn test_tag_filter_wins_over_author() {
        let (pool, service) = setup().await;
        let tagger = create_user(&pool, "tagger").await;
        let other = create_user(&pool, "other").await;

        service
            .create(tagger, new_article("Tagged Article", &["special"]))
            .await
            .expect("Failed to create article");
        service
            .create(other, new_article("Other Article", &[]))
            .await
            .expect("Failed to create article");

        // Supplying a tag together with an author behaves exactly like
        // supplying the tag alone
        let combined = ArticleFilter::from_query("special", "other", "");
        let (views, total) = service
            .list(&combined, PageParams::default(), 0)
            .await
            .expect("Listing failed");

        assert_eq!(total, 1);
        assert_eq!(views[0].slug, "tagged-article");

        let (alone_views, alone_total) = service
            .list(
                &ArticleFilter::Tag("special".to_string()),
                PageParams::default(),
                0,
            )
            .await
            .expect("Listing failed");
        assert_eq!(alone_total, total);
        assert_eq!(alone_views[0].slug, views[0].slug);
    }

    #[tokio::test]
    async fn test_author_filter_by_username() {
        let (pool, service) = setup().await;
        let jane = create_user(&pool, "jane").await;
        let john = create_user(&pool, "john").await;

        service
            .create(jane, new_article("Janes Article", &[]))
            .await
            .expect("Failed to create article");
        service
            .create(john, new_article("Johns Article", &[]))
            .await
            .expect("Failed to create article");

        let (views, total) = service
            .list(
                &ArticleFilter::Author("jane".to_string()),
                PageParams::default(),
                0,
            )
            .await
            .expect("Listing failed");

        assert_eq!(total, 1);
        assert_eq!(views[0].slug, "janes-article");
    }

    #[tokio::test]
    async fn test_unknown_filter_subjects_yield_empty_not_error() {
        let (pool, service) = setup().await;
        let user = create_user(&pool, "someone").await;
        service
            .create(user, new_article("Existing Article", &[]))
            .await
            .expect("Failed to create article");

        for filter in [
            ArticleFilter::Tag("nonexistent".to_string()),
            ArticleFilter::Author("nobody".to_string()),
            ArticleFilter::FavoritedBy("nobody".to_string()),
        ] {
            let (views, total) = service
                .list(&filter, PageParams::default(), 0)
                .await
                .expect("Unknown subject should not error");
            assert!(views.is_empty());
            assert_eq!(total, 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_pagination_falls_back_to_defaults() {
        let (pool, service) = setup().await;
        let user = create_user(&pool, "writer").await;
        service
            .create(user, new_article("Sole Article", &[]))
            .await
            .expect("Failed to create article");

        let page = PageParams::from_query("invalid", "invalid");
        let (views, total) = service
            .list(&ArticleFilter::Unfiltered, page, 0)
            .await
            .expect("Listing with coerced params failed");

        assert_eq!(total, 1);
        assert_eq!(views.len(), 1);
    }

    #[tokio::test]
    async fn test_list_from_query_coerces_everything() {
        let (pool, service) = setup().await;
        let user = create_user(&pool, "writer").await;
        service
            .create(user, new_article("Query Article", &["q"]))
            .await
            .expect("Failed to create article");

        let (views, total) = service
            .list_from_query("", "", "", "invalid", "invalid", 0)
            .await
            .expect("Listing with malformed params failed");
        assert_eq!(total, 1);
        assert_eq!(views.len(), 1);

        // Tag beats author even through the raw surface
        let (views, total) = service
            .list_from_query("q", "nobody", "", "10", "0", 0)
            .await
            .expect("Listing failed");
        assert_eq!(total, 1);
        assert_eq!(views[0].slug, "query-article");
    }

    #[tokio::test]
    async fn test_feed_from_query_coerces_pagination() {
        let (pool, service) = setup().await;
        let reader = create_user(&pool, "reader").await;
        let followed = create_user(&pool, "followed").await;
        follow(&pool, reader, followed).await;
        service
            .create(followed, new_article("Feed Article", &[]))
            .await
            .expect("Failed to create article");

        let (views, total) = service
            .feed_from_query(reader, "invalid", "invalid")
            .await
            .expect("Feed with malformed params failed");
        assert_eq!(total, 1);
        assert_eq!(views.len(), 1);
    }

    #[tokio::test]
    async fn test_favorited_by_filter() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;
        let fan = create_user(&pool, "fan").await;

        let liked = service
            .create(writer, new_article("Liked Article", &[]))
            .await
            .expect("Failed to create article");
        service
            .create(writer, new_article("Ignored Article", &[]))
            .await
            .expect("Failed to create article");

        service
            .favorite(&liked.slug, fan)
            .await
            .expect("Failed to favorite");

        let (views, total) = service
            .list(
                &ArticleFilter::FavoritedBy("fan".to_string()),
                PageParams::default(),
                0,
            )
            .await
            .expect("Listing failed");

        assert_eq!(total, 1);
        assert_eq!(views[0].slug, "liked-article");
    }

    #[tokio::test]
    async fn test_favorite_twice_counts_once() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;
        let fan = create_user(&pool, "fan").await;

        let article = service
            .create(writer, new_article("Popular Article", &[]))
            .await
            .expect("Failed to create article");

        service
            .favorite(&article.slug, fan)
            .await
            .expect("First favorite failed");
        let view = service
            .favorite(&article.slug, fan)
            .await
            .expect("Repeat favorite should not fail");

        assert!(view.favorited);
        assert_eq!(view.favorites_count, 1);
    }

    #[tokio::test]
    async fn test_unfavorite_never_favorited_is_noop() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;
        let fan = create_user(&pool, "fan").await;

        let article = service
            .create(writer, new_article("Quiet Article", &[]))
            .await
            .expect("Failed to create article");

        let view = service
            .unfavorite(&article.slug, fan)
            .await
            .expect("Unfavorite without favorite should succeed");

        assert!(!view.favorited);
        assert_eq!(view.favorites_count, 0);
    }

    #[tokio::test]
    async fn test_favorite_unknown_slug_is_not_found() {
        let (pool, service) = setup().await;
        let fan = create_user(&pool, "fan").await;

        let result = service.favorite("missing-article", fan).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_by_slug_resolves_viewer_status() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;
        let fan = create_user(&pool, "fan").await;

        let article = service
            .create(writer, new_article("Viewed Article", &[]))
            .await
            .expect("Failed to create article");
        service
            .favorite(&article.slug, fan)
            .await
            .expect("Failed to favorite");

        let as_fan = service
            .get_by_slug(&article.slug, fan)
            .await
            .expect("Lookup failed")
            .expect("Article should exist");
        assert!(as_fan.favorited);
        assert_eq!(as_fan.favorites_count, 1);

        // Anonymous viewers never see a favorited flag
        let as_anon = service
            .get_by_slug(&article.slug, 0)
            .await
            .expect("Lookup failed")
            .expect("Article should exist");
        assert!(!as_anon.favorited);
        assert_eq!(as_anon.favorites_count, 1);
    }

    #[tokio::test]
    async fn test_feed_for_loner_is_empty() {
        let (pool, service) = setup().await;
        let loner = create_user(&pool, "loner").await;
        let writer = create_user(&pool, "writer").await;
        service
            .create(writer, new_article("Unrelated Article", &[]))
            .await
            .expect("Failed to create article");

        let (views, total) = service
            .feed(loner, PageParams::default())
            .await
            .expect("Feed should not error");

        assert!(views.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_feed_returns_followed_authors_articles() {
        let (pool, service) = setup().await;
        let reader = create_user(&pool, "reader").await;
        let followed = create_user(&pool, "followed").await;
        let stranger = create_user(&pool, "stranger").await;
        follow(&pool, reader, followed).await;

        service
            .create(followed, new_article("Followed One", &[]))
            .await
            .expect("Failed to create article");
        service
            .create(followed, new_article("Followed Two", &[]))
            .await
            .expect("Failed to create article");
        service
            .create(stranger, new_article("Stranger Article", &[]))
            .await
            .expect("Failed to create article");

        let (views, total) = service
            .feed(reader, PageParams::default())
            .await
            .expect("Feed failed");

        assert_eq!(total, 2);
        assert_eq!(views.len(), 2);
        // Most recently updated first
        assert_eq!(views[0].slug, "followed-two");
        assert_eq!(views[1].slug, "followed-one");
    }

    #[tokio::test]
    async fn test_update_regenerates_slug_and_replaces_tags() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;

        let article = service
            .create(writer, new_article("Original Title", &["old"]))
            .await
            .expect("Failed to create article");

        let updated = service
            .update(
                &article.slug,
                writer,
                UpdateArticle {
                    title: Some("Updated Title".to_string()),
                    tag_list: Some(vec!["new".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");

        assert_eq!(updated.slug, "updated-title");
        assert_eq!(updated.title, "Updated Title");
        assert_eq!(updated.tag_list, vec!["new"]);

        let old = service
            .get_by_slug("original-title", 0)
            .await
            .expect("Lookup failed");
        assert!(old.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_slug_is_not_found() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;

        let result = service
            .update("missing", writer, UpdateArticle::default())
            .await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_hides_article() {
        let (pool, service) = setup().await;
        let writer = create_user(&pool, "writer").await;

        let article = service
            .create(writer, new_article("Doomed Article", &[]))
            .await
            .expect("Failed to create article");

        service.delete(&article.slug).await.expect("Delete failed");
        service
            .delete(&article.slug)
            .await
            .expect("Repeat delete should succeed");
        service
            .delete("never-existed")
            .await
            .expect("Deleting a missing slug should succeed");

        let (views, total) = service
            .list(&ArticleFilter::Unfiltered, PageParams::default(), 0)
            .await
            .expect("Listing failed");
        assert!(views.is_empty());
        assert_eq!(total, 0);
    }
}
