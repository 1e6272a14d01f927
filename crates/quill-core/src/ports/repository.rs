use async_trait::async_trait;

use crate::domain::{Post, PostDraft, PostId};
use crate::error::RepoError;

/// Durable storage for posts.
///
/// Absence is a normal outcome: lookups on an unknown id return `None` or
/// `false`, never an error. Implementations keep no state between calls that
/// could go stale relative to the backing medium.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Post>, RepoError>;

    /// Find a post by id.
    async fn get(&self, id: &PostId) -> Result<Option<Post>, RepoError>;

    /// Persist a new post with a fresh id and the current time.
    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError>;

    /// Replace title and content of an existing post. `None` if it does not
    /// exist; nothing is written in that case.
    async fn update(&self, id: &PostId, draft: PostDraft) -> Result<Option<Post>, RepoError>;

    /// Remove a post. `false` if there was nothing to remove.
    async fn delete(&self, id: &PostId) -> Result<bool, RepoError>;
}

/// Order posts newest first.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
