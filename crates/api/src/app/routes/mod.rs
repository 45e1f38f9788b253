use axum::{Router, routing::get};

pub mod geocode;
pub mod orders;
pub mod pricing;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/geocode", geocode::router())
}
