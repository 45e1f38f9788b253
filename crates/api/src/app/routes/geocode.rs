use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use buildmart_auth::ActorRole;
use buildmart_core::Pincode;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear", post(cache_clear))
        .route("/:pincode", get(validate))
}

/// Resolve a pincode to coordinates; the validity flag reflects whether the
/// provider recognized it or the regional fallback kicked in.
pub async fn validate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(pincode): Path<String>,
) -> axum::response::Response {
    let pincode = match Pincode::new(&pincode) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let resolved = services.geocoder.resolve(&pincode).await;
    Json(serde_json::json!({
        "pincode": pincode,
        "valid": !resolved.is_approximate,
        "location": resolved.location,
        "formatted_address": resolved.formatted_address,
        "is_approximate": resolved.is_approximate,
    }))
    .into_response()
}

pub async fn cache_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if ctx.role() != ActorRole::Admin {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "admin only");
    }
    Json(services.geocoder.stats()).into_response()
}

pub async fn cache_clear(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if ctx.role() != ActorRole::Admin {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "admin only");
    }
    services.geocoder.clear();
    StatusCode::NO_CONTENT.into_response()
}
