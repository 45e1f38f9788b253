use std::sync::Arc;

use axum::{Json, Router, extract::Extension, response::IntoResponse, routing::post};

use buildmart_core::Pincode;
use buildmart_pricing::ItemPricing;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Delivery pricing is a public quote surface; no auth required.
pub fn public_router() -> Router {
    Router::new().route("/pricing/quote", post(quote))
}

/// Caller-supplied amounts on an unauthenticated endpoint: checked
/// arithmetic, so an overflowing subtotal is a 400 rather than a wrap past
/// the free-delivery threshold.
fn quote_subtotal(items: &[dto::QuoteItemRequest]) -> Result<u64, buildmart_core::DomainError> {
    items.iter().try_fold(0u64, |acc, i| {
        i.unit_price
            .unwrap_or(0)
            .checked_mul(i.quantity as u64)
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| {
                buildmart_core::DomainError::validation(format!(
                    "order subtotal overflows for item '{}'",
                    i.item_ref
                ))
            })
    })
}

pub async fn quote(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PricingQuoteRequest>,
) -> axum::response::Response {
    let pincode = match Pincode::new(&body.pincode) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let resolved = services.geocoder.resolve(&pincode).await;
    let subtotal = match quote_subtotal(&body.items) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut total_delivery_charge: u64 = 0;
    let items: Vec<serde_json::Value> = body
        .items
        .iter()
        .map(|item| {
            let pricing = services
                .pricing
                .price_item(&item.category, resolved.location, subtotal);
            if let ItemPricing::Quoted(quote) = &pricing {
                total_delivery_charge += quote.charge;
            }
            serde_json::json!({
                "item_ref": item.item_ref,
                "pricing": pricing,
            })
        })
        .collect();

    Json(serde_json::json!({
        "pincode": pincode,
        "destination": resolved,
        "subtotal": subtotal,
        "items": items,
        "total_delivery_charge": total_delivery_charge,
    }))
    .into_response()
}
