use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use folio_auth::{AuthGate, GateError};

use crate::app::errors::ApiError;
use crate::context::{PrincipalContext, SessionContext};

#[derive(Clone)]
pub struct AuthState {
    pub gate: AuthGate,
}

/// Require an authenticated user; rejects with 401/403 otherwise.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = extract_bearer(req.headers()).map(str::to_string);

    let user = match state.gate.authenticate(token.as_deref()).await {
        Ok(user) => user,
        Err(GateError::Rejected(err)) => return ApiError::Authentication(err).into_response(),
        Err(GateError::Infrastructure(err)) => return ApiError::Infrastructure(err).into_response(),
    };

    // Under dev-bypass the header was never verified.
    let token = token.filter(|_| !state.gate.is_dev_bypass());
    req.extensions_mut().insert(PrincipalContext::new(user, token));
    next.run(req).await
}

/// Attach whatever identity the request carries; never rejects on bad tokens.
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = extract_bearer(req.headers()).map(str::to_string);

    let identity = match state.gate.authenticate_optional(token.as_deref()).await {
        Ok(identity) => identity,
        Err(err) => return ApiError::Infrastructure(err).into_response(),
    };

    req.extensions_mut().insert(SessionContext::new(identity));
    next.run(req).await
}

/// The token from `Authorization: Bearer <token>`, if well-formed.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();

    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
