//! Article author model
//!
//! An `ArticleAuthor` is the internal identity that owns articles and
//! favorites. It shadows an external user identity 1:1 and is created
//! lazily on first reference; the external user record itself is owned by
//! the identity subsystem and never duplicated here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal author identity, keyed by the external user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAuthor {
    /// Unique identifier
    pub id: i64,
    /// External user identity this author shadows
    pub user_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ArticleAuthor {
    /// Zero-value placeholder for an unauthenticated caller.
    ///
    /// Never persisted. External identity 0 always resolves to this value
    /// without touching storage.
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            user_id: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Whether this is the unauthenticated placeholder.
    pub fn is_anonymous(&self) -> bool {
        self.id == 0
    }
}
