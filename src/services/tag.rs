//! Tag service
//!
//! Business logic for tag assignment and the public tag index. The
//! requested name list is taken as given: it is not deduplicated and not
//! trimmed, and a repeated name yields a repeated entry in the result.
//! Callers wanting set semantics deduplicate before calling.

use crate::db::repositories::TagRepository;
use crate::models::Tag;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service
#[derive(Clone)]
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Replace an article's tags with the requested names, creating tags
    /// that do not exist yet. Concurrent creation of the same name is
    /// safe; the loser of the insert race reuses the winner's row. An
    /// empty list clears the association and is not an error.
    pub async fn set_tags(
        &self,
        article_id: i64,
        names: &[String],
    ) -> Result<Vec<Tag>, TagServiceError> {
        let tags = self
            .repo
            .set_for_article(article_id, names)
            .await
            .context("Failed to assign article tags")?;

        tracing::debug!(article_id, count = tags.len(), "Assigned article tags");
        Ok(tags)
    }

    /// All tag names, ordered by name.
    pub async fn list(&self) -> Result<Vec<String>, TagServiceError> {
        let tags = self.repo.list().await.context("Failed to list tags")?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }
}
