//! Article model
//!
//! This module provides:
//! - `Article` entity and its relation-carrying variant
//! - Input types for creating and updating articles
//! - `ArticleFilter`, the mutually exclusive listing filter
//! - `PageParams` pagination with lenient string coercion
//! - `ArticleView`, the record handed to the serialization layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ArticleAuthor, Tag};

/// Default page size when the limit parameter is missing or malformed.
pub const DEFAULT_LIMIT: i64 = 20;

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug, unique among live articles
    pub slug: String,
    /// Article title
    pub title: String,
    /// Short description
    pub description: String,
    /// Article body
    pub body: String,
    /// Owning author identifier
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; deleted articles are invisible to all queries
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Article with its author and tags preloaded.
///
/// Produced by the batched listing fetches so that rendering a page never
/// issues per-row queries.
#[derive(Debug, Clone)]
pub struct ArticleWithRelations {
    pub article: Article,
    pub author: ArticleAuthor,
    pub tags: Vec<Tag>,
}

/// Input for creating a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
}

/// Storage-level insert record, assembled by the service once the slug
/// and the owning author are resolved.
#[derive(Debug, Clone)]
pub struct CreateArticleInput {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: i64,
}

/// Input for a partial article update. A changed title regenerates the
/// slug; a present tag list replaces the article's tag associations.
#[derive(Debug, Clone, Default)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
}

/// The listing filter selected from request parameters.
///
/// Exactly one strategy is ever active. Precedence when several
/// parameters are supplied is tag, then author, then favoriting user;
/// combined filters are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    /// Articles carrying the named tag
    Tag(String),
    /// Articles authored by the named user
    Author(String),
    /// Articles favorited by the named user
    FavoritedBy(String),
    /// The full article set
    Unfiltered,
}

impl ArticleFilter {
    /// Select the active filter from raw query parameters, applying the
    /// tag > author > favoritedBy precedence. Empty strings mean "not
    /// supplied".
    pub fn from_query(tag: &str, author: &str, favorited: &str) -> Self {
        if !tag.is_empty() {
            ArticleFilter::Tag(tag.to_string())
        } else if !author.is_empty() {
            ArticleFilter::Author(author.to_string())
        } else if !favorited.is_empty() {
            ArticleFilter::FavoritedBy(favorited.to_string())
        } else {
            ArticleFilter::Unfiltered
        }
    }
}

/// Pagination window for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageParams {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Coerce string-typed query parameters. Malformed input is not an
    /// error; it falls back to limit 20 and offset 0 respectively.
    pub fn from_query(limit: &str, offset: &str) -> Self {
        Self {
            limit: limit.parse().unwrap_or(DEFAULT_LIMIT),
            offset: offset.parse().unwrap_or(0),
        }
    }
}

/// Article record exposed to the serialization layer, with the author
/// sub-record resolved, tag names collected and favorite data attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: ArticleAuthor,
}

impl ArticleView {
    /// Assemble a view from a preloaded record and batch-resolved
    /// favorite data. Tag names are sorted for a stable output shape.
    pub fn from_parts(record: ArticleWithRelations, favorited: bool, favorites_count: i64) -> Self {
        let mut tag_list: Vec<String> = record.tags.into_iter().map(|t| t.name).collect();
        tag_list.sort();
        Self {
            slug: record.article.slug,
            title: record.article.title,
            description: record.article.description,
            body: record.article.body,
            tag_list,
            created_at: record.article.created_at,
            updated_at: record.article.updated_at,
            favorited,
            favorites_count,
            author: record.author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_filter_precedence_tag_wins() {
        let filter = ArticleFilter::from_query("rust", "jane", "john");
        assert_eq!(filter, ArticleFilter::Tag("rust".to_string()));
    }

    #[test]
    fn test_filter_precedence_author_over_favorited() {
        let filter = ArticleFilter::from_query("", "jane", "john");
        assert_eq!(filter, ArticleFilter::Author("jane".to_string()));
    }

    #[test]
    fn test_filter_favorited() {
        let filter = ArticleFilter::from_query("", "", "john");
        assert_eq!(filter, ArticleFilter::FavoritedBy("john".to_string()));
    }

    #[test]
    fn test_filter_unfiltered() {
        let filter = ArticleFilter::from_query("", "", "");
        assert_eq!(filter, ArticleFilter::Unfiltered);
    }

    #[test]
    fn test_page_params_coercion() {
        let page = PageParams::from_query("10", "5");
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 5);

        let page = PageParams::from_query("invalid", "invalid");
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);

        let page = PageParams::from_query("", "");
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let record = ArticleWithRelations {
            article: Article {
                id: 1,
                slug: "test-article".to_string(),
                title: "Test Article".to_string(),
                description: "desc".to_string(),
                body: "body".to_string(),
                author_id: 1,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            },
            author: crate::models::ArticleAuthor::anonymous(),
            tags: vec![crate::models::Tag::new("zeta".to_string()), {
                let mut t = crate::models::Tag::new("alpha".to_string());
                t.id = 2;
                t
            }],
        };

        let view = ArticleView::from_parts(record, true, 3);
        assert_eq!(view.tag_list, vec!["alpha", "zeta"]);

        let json = serde_json::to_value(&view).expect("Failed to serialize view");
        assert!(json.get("tagList").is_some());
        assert!(json.get("favoritesCount").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["favorited"], serde_json::json!(true));
    }

    proptest! {
        #[test]
        fn page_params_never_panic(limit in "\\PC*", offset in "\\PC*") {
            let page = PageParams::from_query(&limit, &offset);
            // Unparsable input falls back to the defaults
            if limit.parse::<i64>().is_err() {
                prop_assert_eq!(page.limit, DEFAULT_LIMIT);
            }
            if offset.parse::<i64>().is_err() {
                prop_assert_eq!(page.offset, 0);
            }
        }
    }
}
