//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use actix_web::web;

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Author session routes
            .service(
                web::scope("/auth")
                    .wrap(RateLimitMiddleware::new(
                        state.login_limiter.clone(),
                        state.trust_forwarded_for,
                    ))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Posts: reads are public, writes need an author session
            .service(
                web::resource("/posts")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource("/posts/{id}")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::update_post))
                    .route(web::delete().to(posts::delete_post)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use quill_core::domain::{Post, PostDraft, PostId};
    use quill_core::error::RepoError;
    use quill_core::ports::{PasswordService, PostRepository};
    use quill_infra::{
        Argon2PasswordService, FsPostRepository, InMemoryPostRepository, InMemoryRateLimiter,
        JwtConfig, JwtTokenService, RateLimitConfig,
    };
    use quill_shared::dto::AuthResponse;

    use super::*;
    use crate::middleware::auth::AuthorGate;

    const PASSWORD: &str = "HelloW0rld";

    macro_rules! test_app {
        ($state:expr) => {{
            let state: AppState = $state;
            test::init_service(
                App::new()
                    .app_data(web::Data::new(state.clone()))
                    .configure(|cfg| configure_routes(cfg, &state)),
            )
            .await
        }};
    }

    fn limiter(max_requests: u32) -> Arc<InMemoryRateLimiter> {
        Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        }))
    }

    fn open_state(posts: Arc<dyn PostRepository>) -> AppState {
        AppState {
            posts,
            gate: None,
            login_limiter: limiter(100),
            trust_forwarded_for: false,
        }
    }

    fn gated_state() -> AppState {
        let passwords = Arc::new(Argon2PasswordService::new());
        let hash = passwords.hash(PASSWORD).unwrap();
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "handler-tests".to_string(),
            ..JwtConfig::default()
        }));

        AppState {
            posts: Arc::new(InMemoryPostRepository::new()),
            gate: Some(Arc::new(AuthorGate::new(hash, passwords, tokens))),
            login_limiter: limiter(100),
            trust_forwarded_for: false,
        }
    }

    struct BrokenRepository;

    fn broken() -> RepoError {
        RepoError::Corrupt {
            path: "/srv/posts/broken.json".to_string(),
            reason: "expected value at line 1".to_string(),
        }
    }

    #[async_trait]
    impl PostRepository for BrokenRepository {
        async fn list(&self) -> Result<Vec<Post>, RepoError> {
            Err(broken())
        }

        async fn get(&self, _id: &PostId) -> Result<Option<Post>, RepoError> {
            Err(broken())
        }

        async fn create(&self, _draft: PostDraft) -> Result<Post, RepoError> {
            Err(broken())
        }

        async fn update(&self, _id: &PostId, _draft: PostDraft) -> Result<Option<Post>, RepoError> {
            Err(broken())
        }

        async fn delete(&self, _id: &PostId) -> Result<bool, RepoError> {
            Err(broken())
        }
    }

    #[actix_rt::test]
    async fn post_lifecycle_over_http() {
        let dir = TempDir::new().unwrap();
        let app = test_app!(open_state(Arc::new(FsPostRepository::new(dir.path()))));

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "", "content": "x" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "Hi", "content": "<p>Hi</p>" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let created: Post = test::read_body_json(res).await;
        assert_eq!(created.excerpt, "Hi");
        assert!(dir.path().join(format!("{}.json", created.id)).is_file());

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}", created.id))
            .set_json(json!({ "title": "Hi2", "content": "<p>Bye</p>" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let updated: Post = test::read_body_json(res).await;
        assert_eq!(updated.excerpt, "Bye");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);

        let delete = || {
            test::TestRequest::delete()
                .uri(&format!("/api/posts/{}", created.id))
                .to_request()
        };
        let res = test::call_service(&app, delete()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "success": true }));

        assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn missing_or_malformed_body_is_bad_request() {
        let app = test_app!(open_state(Arc::new(InMemoryPostRepository::new())));

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "No content" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["detail"], "Title and content are required");

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{ nope")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn whitespace_title_is_stored_as_written() {
        let app = test_app!(open_state(Arc::new(InMemoryPostRepository::new())));

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": " ", "content": "<p>x</p>" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["title"], " ");
        assert_eq!(body["excerpt"], "x");
    }

    #[actix_rt::test]
    async fn update_validates_before_lookup() {
        let app = test_app!(open_state(Arc::new(InMemoryPostRepository::new())));

        let req = test::TestRequest::put()
            .uri("/api/posts/nonexistent")
            .set_json(json!({ "title": "T", "content": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/api/posts/nonexistent")
            .set_json(json!({ "title": "T", "content": "C" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn list_and_get_posts() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let first = repo
            .create(PostDraft::new("First", "<p>one</p>").unwrap())
            .await
            .unwrap();
        let app = test_app!(open_state(repo));

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let posts: Vec<Post> = test::read_body_json(res).await;
        assert_eq!(posts, vec![first.clone()]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", first.id))
            .to_request();
        let fetched: Post = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, first);

        for uri in ["/api/posts/unknown", "/api/posts/bad.id"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }
    }

    #[actix_rt::test]
    async fn storage_failure_is_generic_server_error() {
        let app = test_app!(open_state(Arc::new(BrokenRepository)));

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["title"], "Internal Server Error");
        assert!(!body.to_string().contains("/srv/posts"));

        let req = test::TestRequest::delete().uri("/api/posts/x").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_rt::test]
    async fn writes_require_author_session() {
        let app = test_app!(gated_state());
        let payload = json!({ "title": "Hi", "content": "<p>Hi</p>" });

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "password": "wrong" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "password": PASSWORD }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let session: AuthResponse = test::read_body_json(res).await;
        assert_eq!(session.token_type, "Bearer");
        let bearer = format!("Bearer {}", session.access_token);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["subject"], "author");

        // Reads stay public
        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let posts: Vec<Post> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(posts.len(), 1);
    }

    #[actix_rt::test]
    async fn login_without_credential_is_bad_request() {
        let app = test_app!(open_state(Arc::new(InMemoryPostRepository::new())));

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "password": PASSWORD }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn login_is_rate_limited() {
        let state = AppState {
            login_limiter: limiter(1),
            ..open_state(Arc::new(InMemoryPostRepository::new()))
        };
        let app = test_app!(state);
        let login = || {
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "password": "x" }))
                .to_request()
        };

        assert_eq!(test::call_service(&app, login()).await.status(), StatusCode::BAD_REQUEST);

        let res = test::call_service(&app, login()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(res.headers().get("X-RateLimit-Remaining").unwrap(), "0");
    }

    fn login_from(peer: &str, forwarded_for: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .peer_addr(peer.parse().unwrap())
            .insert_header(("X-Forwarded-For", forwarded_for))
            .set_json(json!({ "password": "x" }))
    }

    #[actix_rt::test]
    async fn rotating_forwarded_for_does_not_evade_login_limit() {
        let state = AppState {
            login_limiter: limiter(1),
            ..open_state(Arc::new(InMemoryPostRepository::new()))
        };
        let app = test_app!(state);

        let mut throttled = 0;
        for i in 0..20 {
            let req = login_from("10.0.0.9:4000", &format!("203.0.113.{i}")).to_request();
            if test::call_service(&app, req).await.status() == StatusCode::TOO_MANY_REQUESTS {
                throttled += 1;
            }
        }

        assert_eq!(throttled, 19);
    }

    #[actix_rt::test]
    async fn forwarded_for_is_used_when_trusted() {
        let state = AppState {
            login_limiter: limiter(1),
            trust_forwarded_for: true,
            ..open_state(Arc::new(InMemoryPostRepository::new()))
        };
        let app = test_app!(state);

        let first = test::call_service(
            &app,
            login_from("10.0.0.1:4000", "203.0.113.1").to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);
        assert_eq!(first.headers().get("X-RateLimit-Remaining").unwrap(), "0");

        let other = test::call_service(
            &app,
            login_from("10.0.0.1:4000", "203.0.113.2").to_request(),
        )
        .await;
        assert_eq!(other.status(), StatusCode::BAD_REQUEST);

        let repeat = test::call_service(
            &app,
            login_from("10.0.0.1:4000", "203.0.113.1").to_request(),
        )
        .await;
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_rt::test]
    async fn health_reports_ok() {
        let app = test_app!(open_state(Arc::new(InMemoryPostRepository::new())));

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
    }
}
