use axum::Router;

pub mod auth;
pub mod documents;
pub mod projects;
pub mod system;

/// Router for all endpoints that require an authenticated user.
pub fn router() -> Router {
    Router::new()
        .merge(auth::protected_router())
        .nest("/projects", projects::router())
        .nest("/documents", documents::router())
}
