use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::excerpt::excerpt;
use super::id::PostId;
use crate::error::DomainError;

/// Post entity - a single blog post as persisted and served.
///
/// `excerpt` is always derived from `content`; there is no way to set it
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with a fresh id, stamped with the current time.
    pub fn new(draft: PostDraft) -> Self {
        Self::with_id(PostId::generate(), draft, Utc::now())
    }

    /// Build a post from explicit parts. Timestamps are kept to millisecond
    /// precision.
    pub fn with_id(id: PostId, draft: PostDraft, created_at: DateTime<Utc>) -> Self {
        let PostDraft { title, content } = draft;
        Self {
            id,
            excerpt: excerpt(&content),
            title,
            content,
            created_at: created_at.trunc_subsecs(3),
        }
    }

    /// Replace title and content, keeping `id` and `created_at`.
    pub fn revise(self, draft: PostDraft) -> Self {
        let PostDraft { title, content } = draft;
        Self {
            excerpt: excerpt(&content),
            title,
            content,
            ..self
        }
    }
}

/// Author input for creating or updating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    title: String,
    content: String,
}

impl PostDraft {
    /// Validate author input. Both fields must be non-empty; whitespace is
    /// kept as written.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Result<Self, DomainError> {
        let title = title.into();
        let content = content.into();

        if title.is_empty() || content.is_empty() {
            return Err(DomainError::Validation(
                "Title and content are required".to_string(),
            ));
        }

        Ok(Self { title, content })
    }
}

/// `createdAt` as `YYYY-MM-DDTHH:MM:SS.mmmZ`; any RFC 3339 string on read.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn draft(title: &str, content: &str) -> PostDraft {
        PostDraft::new(title, content).unwrap()
    }

    #[test]
    fn draft_requires_title_and_content() {
        assert!(PostDraft::new("", "x").is_err());
        assert!(PostDraft::new("Hi", "").is_err());
        assert!(PostDraft::new("Hi", "<p>Hi</p>").is_ok());
    }

    #[test]
    fn whitespace_only_fields_are_accepted() {
        let post = Post::new(draft(" ", "<p>x</p>"));

        assert_eq!(post.title, " ");
        assert!(PostDraft::new("Hi", "  ").is_ok());
    }

    #[test]
    fn new_post_derives_excerpt() {
        let post = Post::new(draft("Hi", "<p>Hi</p>"));

        assert_eq!(post.title, "Hi");
        assert_eq!(post.content, "<p>Hi</p>");
        assert_eq!(post.excerpt, "Hi");
    }

    #[test]
    fn revise_keeps_identity() {
        let original = Post::new(draft("Hi", "<p>Hi</p>"));
        let revised = original.clone().revise(draft("Hi2", "<p>Bye</p>"));

        assert_eq!(revised.id, original.id);
        assert_eq!(revised.created_at, original.created_at);
        assert_eq!(revised.title, "Hi2");
        assert_eq!(revised.excerpt, "Bye");
    }

    #[test]
    fn serializes_with_camel_case_and_millis() {
        let created_at = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .unwrap()
            .checked_add_signed(chrono::TimeDelta::microseconds(123_456))
            .unwrap();
        let post = Post::with_id(
            PostId::parse("1709296200123").unwrap(),
            draft("T", "<p>C</p>"),
            created_at,
        );

        let json = serde_json::to_value(&post).unwrap();

        assert_eq!(json["id"], "1709296200123");
        assert_eq!(json["excerpt"], "C");
        assert_eq!(json["createdAt"], "2024-03-01T12:30:00.123Z");
    }

    #[test]
    fn whole_seconds_keep_millis_field() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let post = Post::with_id(PostId::generate(), draft("T", "C"), created_at);

        let json = serde_json::to_value(&post).unwrap();

        assert_eq!(json["createdAt"], "2024-03-01T12:30:00.000Z");
    }

    #[test]
    fn reads_records_written_elsewhere() {
        let raw = r#"{
  "id": "1700000000000",
  "title": "Old",
  "content": "<p>Old</p>",
  "excerpt": "Old",
  "createdAt": "2023-11-14T22:13:20.000Z"
}"#;

        let post: Post = serde_json::from_str(raw).unwrap();

        assert_eq!(post.id.as_str(), "1700000000000");
        assert_eq!(post.created_at.timestamp_millis(), 1_700_000_000_000);
    }
}
