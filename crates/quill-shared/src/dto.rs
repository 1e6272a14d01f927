//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/posts` and `PUT /api/posts/{id}`.
///
/// Both fields are optional on the wire so that a missing field is reported
/// as a validation error rather than a JSON decoding failure. Unknown fields
/// (such as a full post echoed back by an editor) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Request to open an author session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Response containing an author session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// The current author session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub subject: String,
    pub roles: Vec<String>,
}
