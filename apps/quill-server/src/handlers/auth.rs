//! Author session handlers.

use actix_web::{HttpResponse, web};

use quill_shared::dto::{AuthResponse, LoginRequest, SessionResponse};

use crate::middleware::auth::Author;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let gate = state.gate.as_ref().ok_or_else(|| {
        AppError::BadRequest("No author credential is configured".to_string())
    })?;

    let token = gate.login(&body.password).map_err(|e| {
        tracing::warn!("Rejected author login: {}", e);
        AppError::from(e)
    })?;

    tracing::info!("Author session opened");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: gate.expiration_seconds().max(0) as u64,
    }))
}

/// GET /api/auth/me - Protected route
pub async fn me(author: Author) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(SessionResponse {
        subject: author.subject,
        roles: author.roles,
    }))
}
