//! Delivery sub-record, one per order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buildmart_core::{DomainError, DomainResult, LeadId};

use crate::status::OrderStatus;

/// Fulfilment sub-state, tracked independently of the order lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
    Returned,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::OutForDelivery => "out_for_delivery",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Returned => "returned",
        }
    }

    /// Progress rank; `Failed` and `Returned` sit outside the happy path and
    /// have no rank.
    fn rank(&self) -> Option<u8> {
        match self {
            DeliveryStatus::Pending => Some(0),
            DeliveryStatus::PickedUp => Some(1),
            DeliveryStatus::InTransit => Some(2),
            DeliveryStatus::OutForDelivery => Some(3),
            DeliveryStatus::Delivered => Some(4),
            DeliveryStatus::Failed | DeliveryStatus::Returned => None,
        }
    }

    /// The delivery sub-state an order shipping status maps onto, where one
    /// exists.
    pub fn for_order_status(status: OrderStatus) -> Option<DeliveryStatus> {
        match status {
            OrderStatus::TruckLoading => Some(DeliveryStatus::PickedUp),
            OrderStatus::InTransit | OrderStatus::Shipped => Some(DeliveryStatus::InTransit),
            OrderStatus::OutForDelivery => Some(DeliveryStatus::OutForDelivery),
            OrderStatus::Delivered => Some(DeliveryStatus::Delivered),
            _ => None,
        }
    }
}

impl core::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carrier assignment supplied by the vendor alongside a shipping update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetDetails {
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub truck_number: Option<String>,
    /// Load capacity in tonnes.
    pub vehicle_capacity: Option<f64>,
}

impl FleetDetails {
    fn is_empty(&self) -> bool {
        self.driver_name.is_none()
            && self.driver_phone.is_none()
            && self.truck_number.is_none()
            && self.vehicle_capacity.is_none()
    }
}

/// Per-order delivery record, keyed by lead id. Grows independently of the
/// order aggregate so carrier churn never rewrites the order itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDelivery {
    pub lead_id: LeadId,
    pub status: DeliveryStatus,
    pub fleet: FleetDetails,
    pub tracking_note: Option<String>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDelivery {
    pub fn new(lead_id: LeadId) -> Self {
        let now = Utc::now();
        Self {
            lead_id,
            status: DeliveryStatus::Pending,
            fleet: FleetDetails::default(),
            tracking_note: None,
            picked_up_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the delivery sub-state. Happy-path statuses move forward
    /// only; `Failed`/`Returned` are reachable from any non-final state.
    pub fn advance(&mut self, next: DeliveryStatus) -> DomainResult<()> {
        if matches!(
            self.status,
            DeliveryStatus::Delivered | DeliveryStatus::Failed | DeliveryStatus::Returned
        ) {
            return Err(DomainError::state_conflict(
                self.status.as_str(),
                "delivery record is final",
            ));
        }
        if next == self.status {
            return Ok(());
        }
        if let (Some(current_rank), Some(next_rank)) = (self.status.rank(), next.rank()) {
            if next_rank < current_rank {
                return Err(DomainError::state_conflict(
                    self.status.as_str(),
                    format!("delivery status cannot move backwards to '{next}'"),
                ));
            }
        }

        let now = Utc::now();
        if matches!(next, DeliveryStatus::PickedUp) && self.picked_up_at.is_none() {
            self.picked_up_at = Some(now);
        }
        if matches!(next, DeliveryStatus::Delivered) {
            self.delivered_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Merge carrier details; only supplied fields overwrite.
    pub fn assign_fleet(&mut self, fleet: FleetDetails) {
        if fleet.is_empty() {
            return;
        }
        if fleet.driver_name.is_some() {
            self.fleet.driver_name = fleet.driver_name;
        }
        if fleet.driver_phone.is_some() {
            self.fleet.driver_phone = fleet.driver_phone;
        }
        if fleet.truck_number.is_some() {
            self.fleet.truck_number = fleet.truck_number;
        }
        if fleet.vehicle_capacity.is_some() {
            self.fleet.vehicle_capacity = fleet.vehicle_capacity;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_advances_and_stamps_timestamps() {
        let mut delivery = OrderDelivery::new(LeadId::generate());
        delivery.advance(DeliveryStatus::PickedUp).unwrap();
        assert!(delivery.picked_up_at.is_some());
        delivery.advance(DeliveryStatus::InTransit).unwrap();
        delivery.advance(DeliveryStatus::OutForDelivery).unwrap();
        delivery.advance(DeliveryStatus::Delivered).unwrap();
        assert!(delivery.delivered_at.is_some());
    }

    #[test]
    fn delivery_status_never_moves_backwards() {
        let mut delivery = OrderDelivery::new(LeadId::generate());
        delivery.advance(DeliveryStatus::OutForDelivery).unwrap();
        assert!(delivery.advance(DeliveryStatus::PickedUp).is_err());
    }

    #[test]
    fn final_states_accept_no_further_advance() {
        let mut delivery = OrderDelivery::new(LeadId::generate());
        delivery.advance(DeliveryStatus::Failed).unwrap();
        assert!(delivery.advance(DeliveryStatus::InTransit).is_err());

        let mut delivered = OrderDelivery::new(LeadId::generate());
        delivered.advance(DeliveryStatus::Delivered).unwrap();
        assert!(delivered.advance(DeliveryStatus::Returned).is_err());
    }

    #[test]
    fn repeating_the_current_status_is_a_no_op() {
        let mut delivery = OrderDelivery::new(LeadId::generate());
        delivery.advance(DeliveryStatus::InTransit).unwrap();
        let before = delivery.clone();
        delivery.advance(DeliveryStatus::InTransit).unwrap();
        assert_eq!(delivery.status, before.status);
        assert_eq!(delivery.picked_up_at, before.picked_up_at);
    }

    #[test]
    fn fleet_assignment_merges_partially() {
        let mut delivery = OrderDelivery::new(LeadId::generate());
        delivery.assign_fleet(FleetDetails {
            driver_name: Some("Ramesh Kumar".to_string()),
            truck_number: Some("MH-04-AB-1234".to_string()),
            ..FleetDetails::default()
        });
        delivery.assign_fleet(FleetDetails {
            driver_phone: Some("+91-9812345678".to_string()),
            ..FleetDetails::default()
        });
        assert_eq!(delivery.fleet.driver_name.as_deref(), Some("Ramesh Kumar"));
        assert_eq!(delivery.fleet.driver_phone.as_deref(), Some("+91-9812345678"));
        assert_eq!(delivery.fleet.truck_number.as_deref(), Some("MH-04-AB-1234"));
    }

    #[test]
    fn order_statuses_map_onto_delivery_substates() {
        assert_eq!(
            DeliveryStatus::for_order_status(OrderStatus::TruckLoading),
            Some(DeliveryStatus::PickedUp)
        );
        assert_eq!(
            DeliveryStatus::for_order_status(OrderStatus::Shipped),
            Some(DeliveryStatus::InTransit)
        );
        assert_eq!(DeliveryStatus::for_order_status(OrderStatus::Pending), None);
    }
}
