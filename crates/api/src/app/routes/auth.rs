use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use folio_auth::{Identity, RegisterInput};

use crate::app::dto::{self, AuthResponse, SessionView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, SessionContext};

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", post(change_password))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let (user, tokens) = services.sessions.register(body).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let (user, tokens) = services.sessions.login(&body.email, &body.password).await?;
    Ok(Json(AuthResponse { user, tokens }))
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let tokens = services.sessions.refresh(&body.refresh_token).await?;
    Ok(Json(serde_json::json!({ "tokens": tokens })))
}

/// Revoke the caller's access token and, if supplied, their refresh token.
///
/// An empty body is allowed.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::LogoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    services
        .sessions
        .logout(principal.user_id(), principal.access_token(), body.refresh_token.as_deref())
        .await;
    StatusCode::NO_CONTENT
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    services
        .sessions
        .change_password(principal.user_id(), &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(principal.user().clone())
}

/// Who the caller is, without failing for anonymous requests.
pub async fn session(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    let view = match session.identity() {
        Identity::User(user) => SessionView {
            authenticated: true,
            user_id: Some(user.id),
            email: Some(user.email.clone()),
        },
        Identity::Anonymous => SessionView {
            authenticated: false,
            user_id: None,
            email: None,
        },
    };
    Json(view)
}
