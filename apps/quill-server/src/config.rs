//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use quill_infra::{JwtConfig, RateLimitConfig};

/// Where posts are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// One JSON file per post under this directory.
    Fs { dir: PathBuf },
    /// Process memory only.
    Memory,
}

/// How the author password is supplied.
#[derive(Clone)]
pub enum AuthorSecret {
    /// Argon2 PHC string.
    Hash(String),
    /// Plaintext, hashed at startup.
    Plain(String),
}

impl std::fmt::Debug for AuthorSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorSecret::Hash(_) => f.write_str("Hash(..)"),
            AuthorSecret::Plain(_) => f.write_str("Plain(..)"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    /// `None` leaves the authoring routes open.
    pub author_secret: Option<AuthorSecret>,
    pub jwt: JwtConfig,
    pub login_rate_limit: RateLimitConfig,
    /// Key login throttling on `X-Forwarded-For`/`Forwarded` instead of
    /// the socket peer.
    pub trust_forwarded_for: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            store: Self::store_from_env(),
            author_secret: Self::author_secret_from_env(),
            jwt: JwtConfig::from_env(),
            login_rate_limit: RateLimitConfig::from_env(),
            trust_forwarded_for: env::var("TRUST_FORWARDED_FOR")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    fn store_from_env() -> StoreConfig {
        match env::var("POST_STORE").as_deref() {
            Ok("memory") => StoreConfig::Memory,
            Ok(other) if other != "fs" => {
                tracing::warn!(value = other, "Unknown POST_STORE, using filesystem store");
                Self::fs_store()
            }
            _ => Self::fs_store(),
        }
    }

    fn fs_store() -> StoreConfig {
        StoreConfig::Fs {
            dir: env::var("POSTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/posts")),
        }
    }

    fn author_secret_from_env() -> Option<AuthorSecret> {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());

        non_empty("AUTHOR_PASSWORD_HASH")
            .map(AuthorSecret::Hash)
            .or_else(|| non_empty("AUTHOR_PASSWORD").map(AuthorSecret::Plain))
    }
}
