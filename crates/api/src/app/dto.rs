use serde::{Deserialize, Serialize};

use folio_auth::{Collaborator, TokenPair, User};
use folio_core::UserId;
use folio_documents::{DocumentQuery, DocumentStatus, Stage};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub version: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentListParams {
    pub project_id: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl DocumentListParams {
    /// Filter fields of the query; the caller fills in the visible projects.
    pub fn to_query(&self) -> Result<DocumentQuery, ApiError> {
        let stage = match self.stage.as_deref() {
            Some(raw) => Some(
                Stage::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("unknown stage '{raw}'")))?,
            ),
            None => None,
        };
        let status = match self.status.as_deref() {
            Some(raw) => Some(
                DocumentStatus::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("unknown status '{raw}'")))?,
            ),
            None => None,
        };
        Ok(DocumentQuery {
            projects: Vec::new(),
            stage,
            status,
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Collaborator with its granted actions spelled out.
#[derive(Debug, Serialize)]
pub struct CollaboratorView {
    #[serde(flatten)]
    pub collaborator: Collaborator,
    pub granted: Vec<&'static str>,
}

impl From<Collaborator> for CollaboratorView {
    fn from(collaborator: Collaborator) -> Self {
        let granted = collaborator.permissions.granted().iter().map(|a| a.as_str()).collect();
        Self { collaborator, granted }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub authenticated: bool,
    pub user_id: Option<UserId>,
    pub email: Option<String>,
}

// -------------------------
// Helpers
// -------------------------

pub fn parse_id<T: core::str::FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest(format!("invalid {what} id")))
}
