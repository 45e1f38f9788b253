use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use buildmart_core::{LeadId, Pincode, VendorId};
use buildmart_orders::{DeliveryDetails, FleetDetails, OrderItem, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:lead_id", get(get_order))
        .route("/:lead_id/place", post(place_order))
        .route("/:lead_id/accept", post(vendor_accept))
        .route("/:lead_id/reject", post(vendor_reject))
        .route("/:lead_id/payment", post(mark_payment_done))
        .route("/:lead_id/confirm", post(admin_confirm))
        .route("/:lead_id/shipping", post(update_shipping))
        .route("/:lead_id/cancel", post(admin_cancel))
        .route("/:lead_id/delivery", get(get_delivery).patch(amend_delivery))
        .route("/:lead_id/history", get(history))
}

fn parse_lead(id: &str) -> Result<LeadId, axum::response::Response> {
    id.parse::<LeadId>().map_err(errors::domain_error_to_response)
}

fn parse_delivery_details(
    body: dto::DeliveryDetailsRequest,
) -> Result<DeliveryDetails, axum::response::Response> {
    let pincode = Pincode::new(&body.pincode).map_err(errors::domain_error_to_response)?;
    Ok(DeliveryDetails {
        address: body.address,
        pincode,
        expected_date: body.expected_date,
    })
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let vendor_id: VendorId = match body.vendor_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor id");
        }
    };
    let items = body
        .items
        .into_iter()
        .map(|i| OrderItem {
            item_ref: i.item_ref,
            category: i.category,
            quantity: i.quantity,
            unit_price: None,
            loading_charges: i.loading_charges,
        })
        .collect();

    match services.machine.create_order(ctx.actor(), vendor_id, items) {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.machine.list_orders(ctx.actor()) {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Order summary: the aggregate plus its delivery and payment sub-records.
pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let order = match services.machine.get_order(ctx.actor(), &lead_id) {
        Ok(order) => order,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let delivery = match services.machine.get_delivery(ctx.actor(), &lead_id) {
        Ok(delivery) => delivery,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let payment = match services.machine.get_payment(ctx.actor(), &lead_id) {
        Ok(payment) => payment,
        Err(e) => return errors::domain_error_to_response(e),
    };
    Json(serde_json::json!({
        "order": order,
        "delivery": delivery,
        "payment": payment,
    }))
    .into_response()
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    Json(body): Json<dto::DeliveryDetailsRequest>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let details = match parse_delivery_details(body) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.machine.place_order(ctx.actor(), &lead_id, details).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn vendor_accept(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    body: Option<Json<dto::VendorDecisionRequest>>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let remarks = body.and_then(|Json(b)| b.remarks);
    match services.machine.vendor_accept(ctx.actor(), &lead_id, remarks) {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn vendor_reject(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    body: Option<Json<dto::VendorDecisionRequest>>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let remarks = body.and_then(|Json(b)| b.remarks);
    match services.machine.vendor_reject(ctx.actor(), &lead_id, remarks) {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn mark_payment_done(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    Json(body): Json<dto::PaymentRequest>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.machine.mark_payment_done(
        ctx.actor(),
        &lead_id,
        body.amount_paid,
        body.method,
        &body.transaction_id,
    ) {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn admin_confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    Json(body): Json<dto::ConfirmOrderRequest>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let dto::ConfirmOrderRequest { items, remarks } = body;
    match services
        .machine
        .admin_confirm(ctx.actor(), &lead_id, &items, remarks)
    {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_shipping(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    Json(body): Json<dto::ShippingUpdateRequest>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let target: OrderStatus = match body.status.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let fleet = FleetDetails {
        driver_name: body.driver_name,
        driver_phone: body.driver_phone,
        truck_number: body.truck_number,
        vehicle_capacity: body.vehicle_capacity,
    };
    match services
        .machine
        .update_shipping_status(ctx.actor(), &lead_id, target, fleet)
    {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn admin_cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    body: Option<Json<dto::CancelOrderRequest>>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let remarks = body.and_then(|Json(b)| b.remarks);
    match services.machine.admin_cancel(ctx.actor(), &lead_id, remarks) {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.machine.get_delivery(ctx.actor(), &lead_id) {
        Ok(Some(delivery)) => Json(delivery).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "no delivery record"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn amend_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
    Json(body): Json<dto::DeliveryDetailsRequest>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let details = match parse_delivery_details(body) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.machine.amend_delivery(ctx.actor(), &lead_id, details) {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(lead_id): Path<String>,
) -> axum::response::Response {
    let lead_id = match parse_lead(&lead_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.machine.history(ctx.actor(), &lead_id) {
        Ok(events) => Json(events).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
