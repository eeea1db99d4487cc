//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, StartupError, Stores};

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        gate: services.gate.clone(),
    };
    let services = Arc::new(services);

    // Protected routes: require an authenticated user.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::auth_middleware,
    ));

    // Optional auth: anonymous callers get an anonymous identity.
    let optional = Router::new()
        .route("/auth/session", get(routes::auth::session))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::optional_auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::auth::public_router())
        .merge(optional)
        .merge(protected)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
