//! Router assembly.
//!
//! `services.rs` wires the service graph, `routes/` holds one handler file
//! per area, `dto.rs` the request shapes, and `errors.rs` the single
//! domain-error-to-HTTP mapping.

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use buildmart_auth::TokenValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Assemble the full router. The pricing quote surface stays outside the
/// auth middleware; everything else under `routes::router()` requires a
/// valid bearer token.
pub fn build_app(validator: Arc<dyn TokenValidator>, services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState { validator };

    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(services.clone()))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::pricing::public_router().layer(Extension(services)))
        .merge(protected)
}
