//! Author gate and the extractor guarding authoring routes.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};
use std::sync::Arc;

use quill_core::ports::{AuthError, PasswordService, TokenClaims, TokenService};
use quill_shared::ErrorResponse;

use crate::state::AppState;

/// Subject of every token issued by the gate.
pub const AUTHOR_SUBJECT: &str = "author";

/// Role required by authoring routes.
pub const AUTHOR_ROLE: &str = "author";

/// Checks the author password and issues session tokens.
pub struct AuthorGate {
    password_hash: String,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AuthorGate {
    pub fn new(
        password_hash: String,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            password_hash,
            passwords,
            tokens,
        }
    }

    /// Exchange the author password for a session token.
    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        if !self.passwords.verify(password, &self.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.tokens
            .generate_token(AUTHOR_SUBJECT, vec![AUTHOR_ROLE.to_string()])
    }

    /// Validate a bearer token and require the author role.
    pub fn authenticate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.tokens.validate_token(token)?;
        if !claims.roles.iter().any(|r| r == AUTHOR_ROLE) {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(claims)
    }

    pub fn expiration_seconds(&self) -> i64 {
        self.tokens.expiration_seconds()
    }
}

/// The caller of an authoring route.
///
/// Use this in handlers to require an author session:
/// ```ignore
/// async fn protected_route(author: Author) -> impl Responder {
///     format!("Hello, {}!", author.subject)
/// }
/// ```
/// When no credential is configured every caller is let through as
/// [`Author::open`].
#[derive(Debug, Clone)]
pub struct Author {
    pub subject: String,
    pub roles: Vec<String>,
}

impl Author {
    /// Identity used while the gate is open.
    pub fn open() -> Self {
        Self {
            subject: "anonymous".to_string(),
            roles: Vec::new(),
        }
    }
}

impl From<TokenClaims> for Author {
    fn from(claims: TokenClaims) -> Self {
        Self {
            subject: claims.subject,
            roles: claims.roles,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AuthenticationError(pub AuthError);

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match &self.0 {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingAuth
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Please log in again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth | AuthError::InvalidCredentials => {
                ErrorResponse::new(401, "Authentication Required")
                    .with_detail("Please provide a valid Bearer token in the Authorization header.")
            }
            AuthError::InsufficientPermissions => ErrorResponse::forbidden(),
            AuthError::HashingError(msg) => {
                tracing::error!("Authentication backend error: {}", msg);
                ErrorResponse::internal_error()
            }
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

impl FromRequest for Author {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate_request(req))
    }
}

fn authenticate_request(req: &HttpRequest) -> Result<Author, AuthenticationError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthenticationError(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        )));
    };

    let Some(gate) = state.gate.as_ref() else {
        return Ok(Author::open());
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthenticationError(AuthError::MissingAuth))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        AuthenticationError(AuthError::InvalidToken(
            "Invalid authorization header".to_string(),
        ))
    })?;

    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AuthenticationError(AuthError::InvalidToken(
            "Expected Bearer token".to_string(),
        ))
    })?;

    gate.authenticate(token)
        .map(Author::from)
        .map_err(AuthenticationError)
}

#[cfg(test)]
mod tests {
    use quill_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

    use super::*;

    fn gate(password: &str) -> AuthorGate {
        let passwords = Arc::new(Argon2PasswordService::new());
        let hash = passwords.hash(password).unwrap();
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "gate-test".to_string(),
            ..JwtConfig::default()
        }));
        AuthorGate::new(hash, passwords, tokens)
    }

    #[test]
    fn login_with_correct_password_issues_author_token() {
        let gate = gate("HelloW0rld");

        let token = gate.login("HelloW0rld").unwrap();
        let claims = gate.authenticate(&token).unwrap();

        assert_eq!(claims.subject, AUTHOR_SUBJECT);
        assert_eq!(claims.roles, vec![AUTHOR_ROLE.to_string()]);
    }

    #[test]
    fn login_with_wrong_password_fails() {
        let gate = gate("HelloW0rld");

        assert!(matches!(
            gate.login("guess"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn tokens_without_author_role_are_refused() {
        let passwords = Arc::new(Argon2PasswordService::new());
        let tokens = Arc::new(JwtTokenService::new(JwtConfig::default()));
        let gate = AuthorGate::new(
            passwords.hash("pw").unwrap(),
            passwords,
            tokens.clone(),
        );

        let token = tokens.generate_token("reader", vec![]).unwrap();

        assert!(matches!(
            gate.authenticate(&token),
            Err(AuthError::InsufficientPermissions)
        ));
    }
}
