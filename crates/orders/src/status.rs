//! Order lifecycle status.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use buildmart_core::DomainError;

/// Lifecycle position of an order. Single source of truth; transitions are
/// monotonic within the directed graph enforced by [`crate::transitions`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Cart, not yet placed.
    Pending,
    OrderPlaced,
    VendorAccepted,
    PaymentDone,
    OrderConfirmed,
    TruckLoading,
    InTransit,
    Shipped,
    OutForDelivery,
    Delivered,
    /// Terminal alternate, reachable from any pre-delivered state.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 11] = [
        OrderStatus::Pending,
        OrderStatus::OrderPlaced,
        OrderStatus::VendorAccepted,
        OrderStatus::PaymentDone,
        OrderStatus::OrderConfirmed,
        OrderStatus::TruckLoading,
        OrderStatus::InTransit,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::OrderPlaced => "order_placed",
            OrderStatus::VendorAccepted => "vendor_accepted",
            OrderStatus::PaymentDone => "payment_done",
            OrderStatus::OrderConfirmed => "order_confirmed",
            OrderStatus::TruckLoading => "truck_loading",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position within the shipping phase, for statuses a vendor moves an
    /// order through after admin confirmation. Higher means later.
    pub fn shipping_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::OrderConfirmed => Some(0),
            OrderStatus::TruckLoading => Some(1),
            OrderStatus::InTransit => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::OutForDelivery => Some(4),
            OrderStatus::Delivered => Some(5),
            _ => None,
        }
    }

    /// Statuses a vendor may move an order *to* via a shipping update.
    pub fn is_shipping_target(&self) -> bool {
        matches!(
            self,
            OrderStatus::TruckLoading
                | OrderStatus::InTransit
                | OrderStatus::Shipped
                | OrderStatus::OutForDelivery
                | OrderStatus::Delivered
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}
