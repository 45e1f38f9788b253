//! Append-only status-history ledger.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buildmart_auth::ActorRole;
use buildmart_core::{ActorId, InvoiceNumber, LeadId};

use crate::status::OrderStatus;

/// One recorded transition. Events are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    pub lead_id: LeadId,
    pub invoice_number: Option<InvoiceNumber>,
    pub actor_id: ActorId,
    pub actor_role: ActorRole,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub remarks: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only ledger of status transitions, per order. Supports exactly
/// two operations: append and read in ascending timestamp order. There is
/// deliberately no update or delete surface.
#[derive(Debug, Default)]
pub struct StatusHistoryLedger {
    events: RwLock<HashMap<LeadId, Vec<OrderStatusEvent>>>,
}

impl StatusHistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transition(
        &self,
        lead_id: LeadId,
        invoice_number: Option<InvoiceNumber>,
        actor_id: ActorId,
        actor_role: ActorRole,
        from_status: OrderStatus,
        to_status: OrderStatus,
        remarks: Option<String>,
    ) {
        let event = OrderStatusEvent {
            lead_id: lead_id.clone(),
            invoice_number,
            actor_id,
            actor_role,
            from_status,
            to_status,
            remarks,
            recorded_at: Utc::now(),
        };
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.entry(lead_id).or_default().push(event);
    }

    /// All events for an order, oldest first. Appends preserve insertion
    /// order, which is ascending-timestamp by construction.
    pub fn history(&self, lead_id: &LeadId) -> Vec<OrderStatusEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lead_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_preserves_append_order() {
        let ledger = StatusHistoryLedger::new();
        let lead = LeadId::generate();
        let actor = ActorId::new();

        ledger.record_transition(
            lead.clone(),
            None,
            actor,
            ActorRole::Customer,
            OrderStatus::Pending,
            OrderStatus::OrderPlaced,
            None,
        );
        ledger.record_transition(
            lead.clone(),
            None,
            actor,
            ActorRole::Vendor,
            OrderStatus::OrderPlaced,
            OrderStatus::VendorAccepted,
            Some("accepted same day".to_string()),
        );

        let history = ledger.history(&lead);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to_status, OrderStatus::OrderPlaced);
        assert_eq!(history[1].to_status, OrderStatus::VendorAccepted);
        assert_eq!(history[1].actor_role, ActorRole::Vendor);
        assert!(history[0].recorded_at <= history[1].recorded_at);
    }

    #[test]
    fn unknown_lead_has_empty_history() {
        let ledger = StatusHistoryLedger::new();
        assert!(ledger.history(&LeadId::generate()).is_empty());
    }

    #[test]
    fn histories_are_isolated_per_order() {
        let ledger = StatusHistoryLedger::new();
        let a = LeadId::generate();
        let b = LeadId::generate();
        let actor = ActorId::new();

        ledger.record_transition(a.clone(), None, actor, ActorRole::Customer, OrderStatus::Pending, OrderStatus::OrderPlaced, None);
        assert_eq!(ledger.history(&a).len(), 1);
        assert!(ledger.history(&b).is_empty());
    }
}
