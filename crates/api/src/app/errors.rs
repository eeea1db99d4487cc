use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use folio_auth::{AccessError, AuthenticationError, MembershipError, SessionError};
use folio_core::InfrastructureError;
use folio_documents::VersioningError;

/// Every failure a handler can surface, mapped to a stable `{error, message}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    Versioning(#[from] VersioningError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Authentication(e) => (status(e.status_code()), e.kind()),
            Self::Access(e) => match e {
                AccessError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                AccessError::Denied(reason) => (status(reason.status_code()), reason.kind()),
                AccessError::Infrastructure(infra) => (StatusCode::INTERNAL_SERVER_ERROR, infra.kind()),
            },
            Self::Session(e) => (status(e.status_code()), e.kind()),
            Self::Membership(e) => match e {
                MembershipError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                MembershipError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                MembershipError::AlreadyMember => (StatusCode::CONFLICT, "already_member"),
                MembershipError::Denied(reason) => (status(reason.status_code()), reason.kind()),
                MembershipError::Infrastructure(infra) => (StatusCode::INTERNAL_SERVER_ERROR, infra.kind()),
            },
            Self::Versioning(e) => (status(e.status_code()), e.kind()),
            Self::Infrastructure(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.kind()),
        }
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            // Store details stay in the logs.
            error!(error = %self, kind = code, "request failed");
            return json_error(status, code, "internal server error");
        }
        json_error(status, code, self.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_auth::{Action, AuthorizationError};
    use folio_documents::Stage;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn error_statuses() {
        assert_eq!(status_of(AuthenticationError::Revoked.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthenticationError::AccountDisabled.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AccessError::Denied(AuthorizationError::InsufficientPermission(Action::Edit)).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(AccessError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(VersioningError::DuplicateStage(Stage::Discovery).into()), StatusCode::CONFLICT);
        assert_eq!(status_of(SessionError::EmailTaken.into()), StatusCode::CONFLICT);
        assert_eq!(status_of(MembershipError::AlreadyMember.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(InfrastructureError::store("connection refused").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(ApiError::BadRequest("bad".into())), StatusCode::BAD_REQUEST);
    }
}
