//! Repository layer
//!
//! Data access for the engine. Every repository is a trait with a
//! SQLx-backed implementation that dispatches on the configured driver,
//! so services depend on the traits only.

pub mod article;
pub mod author;
pub mod comment;
pub mod favorite;
pub mod tag;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use favorite::{FavoriteRepository, SqlxFavoriteRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserDirectory, UserDirectory};

/// Build a `?, ?, ?` placeholder list for an IN clause with `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
