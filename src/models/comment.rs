//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ArticleAuthor;

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with its author preloaded.
#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: ArticleAuthor,
}

/// Comment record exposed to the serialization layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: ArticleAuthor,
}

impl CommentView {
    pub fn from_record(record: CommentWithAuthor) -> Self {
        Self {
            id: record.comment.id,
            body: record.comment.body,
            created_at: record.comment.created_at,
            updated_at: record.comment.updated_at,
            author: record.author,
        }
    }
}
