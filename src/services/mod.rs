//! Services layer - Business logic
//!
//! Services coordinate the repositories and implement the engine's
//! contracts: filter precedence, pagination coercion, batched favorite
//! aggregation and the tag assignment flow. The embedding HTTP layer
//! talks to these types only.

pub mod article;
pub mod comment;
pub mod tag;

pub use article::{generate_slug, ArticleService, ArticleServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use tag::{TagService, TagServiceError};
