//! In-memory post repository - for tests and throwaway instances.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::domain::{Post, PostDraft, PostId};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, sort_newest_first};

/// Post repository held in a `HashMap` behind an async `RwLock`.
///
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<PostId, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    async fn get(&self, id: &PostId) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError> {
        let post = Post::new(draft);
        self.posts
            .write()
            .await
            .insert(post.id.clone(), post.clone());
        Ok(post)
    }

    async fn update(&self, id: &PostId, draft: PostDraft) -> Result<Option<Post>, RepoError> {
        let mut posts = self.posts.write().await;
        let Some(existing) = posts.remove(id) else {
            return Ok(None);
        };

        let post = existing.revise(draft);
        posts.insert(post.id.clone(), post.clone());
        Ok(Some(post))
    }

    async fn delete(&self, id: &PostId) -> Result<bool, RepoError> {
        Ok(self.posts.write().await.remove(id).is_some())
    }
}
