//! Domain entities - the core business objects.

mod excerpt;
mod id;
mod post;

pub use excerpt::{ELLIPSIS, EXCERPT_CHARS, excerpt, strip_tags};
pub use id::PostId;
pub use post::{Post, PostDraft};
