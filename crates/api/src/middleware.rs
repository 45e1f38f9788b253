//! Bearer-token authentication for the protected route tree.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use buildmart_auth::{Actor, TokenValidator};

use crate::app::errors::json_error;
use crate::context::ActorContext;

#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<dyn TokenValidator>,
}

/// Validates the `Authorization: Bearer ...` header and stashes the
/// resulting [`ActorContext`] on the request. All failures collapse into a
/// single 401 so callers cannot enumerate which tokens exist.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized();
    };

    let claims = match state.validator.validate(token, Utc::now()) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "token rejected");
            return unauthorized();
        }
    };

    req.extensions_mut()
        .insert(ActorContext::new(Actor::new(claims.sub, claims.role)));

    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn unauthorized() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "missing or invalid bearer token",
    )
}
