use chrono::{DateTime, Utc};
use serde::Deserialize;

use buildmart_orders::{LineItemPrice, PaymentMethod};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub vendor_id: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub item_ref: String,
    pub category: String,
    pub quantity: u32,
    #[serde(default)]
    pub loading_charges: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryDetailsRequest {
    pub address: String,
    pub pincode: String,
    pub expected_date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VendorDecisionRequest {
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount_paid: u64,
    pub method: PaymentMethod,
    pub transaction_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmOrderRequest {
    pub items: Vec<LineItemPrice>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShippingUpdateRequest {
    pub status: String,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub truck_number: Option<String>,
    pub vehicle_capacity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderRequest {
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PricingQuoteRequest {
    pub pincode: String,
    pub items: Vec<QuoteItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteItemRequest {
    pub item_ref: String,
    pub category: String,
    pub quantity: u32,
    /// Unit price when already known; drives the free-delivery threshold.
    pub unit_price: Option<u64>,
}
