//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{AuthError, PasswordService, PostRepository, RateLimiter};
use quill_infra::{
    Argon2PasswordService, FsPostRepository, InMemoryPostRepository, InMemoryRateLimiter,
    JwtTokenService,
};

use crate::config::{AppConfig, AuthorSecret, StoreConfig};
use crate::middleware::auth::AuthorGate;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    /// `None` when no author credential is configured.
    pub gate: Option<Arc<AuthorGate>>,
    pub login_limiter: Arc<dyn RateLimiter>,
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Build the application state with the configured implementations.
    pub fn build(config: &AppConfig) -> Result<Self, AuthError> {
        let posts: Arc<dyn PostRepository> = match &config.store {
            StoreConfig::Fs { dir } => {
                tracing::info!(dir = %dir.display(), "Using filesystem post store");
                Arc::new(FsPostRepository::new(dir.clone()))
            }
            StoreConfig::Memory => {
                tracing::warn!("Using in-memory post store. Posts are lost on restart.");
                Arc::new(InMemoryPostRepository::new())
            }
        };

        let gate = match &config.author_secret {
            Some(secret) => {
                let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
                let password_hash = match secret {
                    AuthorSecret::Hash(hash) => hash.clone(),
                    AuthorSecret::Plain(password) => {
                        tracing::warn!(
                            "AUTHOR_PASSWORD is set in plain text. Prefer AUTHOR_PASSWORD_HASH."
                        );
                        passwords.hash(password)?
                    }
                };
                let tokens = Arc::new(JwtTokenService::new(config.jwt.clone()));
                Some(Arc::new(AuthorGate::new(password_hash, passwords, tokens)))
            }
            None => {
                tracing::warn!(
                    "No author credential configured. Authoring routes are open to anyone."
                );
                None
            }
        };

        let login_limiter = Arc::new(InMemoryRateLimiter::new(config.login_rate_limit.clone()));
        if config.trust_forwarded_for {
            tracing::info!("Login throttling keyed on forwarded client addresses");
        }

        tracing::info!("Application state initialized");

        Ok(Self {
            posts,
            gate,
            login_limiter,
            trust_forwarded_for: config.trust_forwarded_for,
        })
    }
}
