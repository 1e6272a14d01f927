//! Filesystem post repository - one pretty-printed JSON file per post.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use quill_core::domain::{Post, PostDraft, PostId};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, sort_newest_first};

const POST_EXT: &str = "json";

/// Post repository backed by a directory of `{id}.json` files.
///
/// The directory listing is the index. Every call goes back to disk, so
/// files edited or removed by hand are picked up immediately.
pub struct FsPostRepository {
    root: PathBuf,
}

impl FsPostRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn post_path(&self, id: &PostId) -> PathBuf {
        self.root.join(format!("{id}.{POST_EXT}"))
    }

    async fn ensure_dir(&self) -> Result<(), RepoError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RepoError::io(&self.root, e))
    }

    async fn read_post(&self, path: &Path) -> Result<Option<Post>, RepoError> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::io(path, e)),
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Corrupt post record");
            RepoError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn write_post(&self, post: &Post) -> Result<(), RepoError> {
        self.ensure_dir().await?;

        let content = serde_json::to_string_pretty(post)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let target = self.post_path(&post.id);

        // Atomic write; the temp name never ends in `.json` so list() skips it
        let tmp = self.root.join(format!(".{}-{}.tmp", post.id, Uuid::new_v4()));
        let written = match fs::write(&tmp, content).await {
            Ok(()) => fs::rename(&tmp, &target)
                .await
                .map_err(|e| RepoError::io(&target, e)),
            Err(e) => Err(RepoError::io(&tmp, e)),
        };

        if written.is_err() {
            if let Err(e) = fs::remove_file(&tmp).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), error = %e, "Failed to remove temp file");
                }
            }
        }

        written
    }
}

#[async_trait]
impl PostRepository for FsPostRepository {
    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(root = %self.root.display(), "Creating posts directory");
                self.ensure_dir().await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(RepoError::io(&self.root, e)),
        };

        let mut posts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepoError::io(&self.root, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(POST_EXT) {
                continue;
            }
            // Follows symlinks, like the read in get()
            let metadata = match fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(RepoError::io(&path, e)),
            };
            if !metadata.is_file() {
                continue;
            }

            // None only if the file vanished between listing and reading
            if let Some(post) = self.read_post(&path).await? {
                posts.push(post);
            }
        }

        sort_newest_first(&mut posts);
        tracing::debug!(count = posts.len(), "Listed posts");
        Ok(posts)
    }

    async fn get(&self, id: &PostId) -> Result<Option<Post>, RepoError> {
        self.read_post(&self.post_path(id)).await
    }

    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError> {
        let post = Post::new(draft);
        self.write_post(&post).await?;

        tracing::debug!(post_id = %post.id, "Created post");
        Ok(post)
    }

    async fn update(&self, id: &PostId, draft: PostDraft) -> Result<Option<Post>, RepoError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let post = existing.revise(draft);
        self.write_post(&post).await?;

        tracing::debug!(post_id = %post.id, "Updated post");
        Ok(Some(post))
    }

    async fn delete(&self, id: &PostId) -> Result<bool, RepoError> {
        let path = self.post_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(post_id = %id, "Deleted post");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RepoError::io(&path, e)),
        }
    }
}
