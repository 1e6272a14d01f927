//! Post CRUD handlers.

use actix_web::{HttpResponse, web};

use quill_core::DomainError;
use quill_core::domain::{PostDraft, PostId};
use quill_shared::Acknowledgement;
use quill_shared::dto::PostPayload;

use crate::middleware::auth::Author;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn post_not_found(id: &str) -> AppError {
    DomainError::NotFound {
        entity_type: "Post",
        id: id.to_string(),
    }
    .into()
}

/// Ids that cannot name a stored post are reported as missing.
fn parse_id(raw: &str) -> AppResult<PostId> {
    PostId::parse(raw).ok_or_else(|| post_not_found(raw))
}

fn into_draft(payload: PostPayload) -> AppResult<PostDraft> {
    let PostPayload { title, content } = payload;
    Ok(PostDraft::new(
        title.unwrap_or_default(),
        content.unwrap_or_default(),
    )?)
}

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let post = state
        .posts
        .get(&id)
        .await?
        .ok_or_else(|| post_not_found(id.as_str()))?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts - Protected route
pub async fn create_post(
    author: Author,
    state: web::Data<AppState>,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let draft = into_draft(body.into_inner())?;
    let post = state.posts.create(draft).await?;

    tracing::info!(post_id = %post.id, author = %author.subject, "Post published");
    Ok(HttpResponse::Ok().json(post))
}

/// PUT /api/posts/{id} - Protected route
pub async fn update_post(
    author: Author,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let draft = into_draft(body.into_inner())?;
    let id = parse_id(&path)?;
    let post = state
        .posts
        .update(&id, draft)
        .await?
        .ok_or_else(|| post_not_found(id.as_str()))?;

    tracing::info!(post_id = %post.id, author = %author.subject, "Post updated");
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id} - Protected route
pub async fn delete_post(
    author: Author,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    if !state.posts.delete(&id).await? {
        return Err(post_not_found(id.as_str()));
    }

    tracing::info!(post_id = %id, author = %author.subject, "Post deleted");
    Ok(HttpResponse::Ok().json(Acknowledgement::ok()))
}
