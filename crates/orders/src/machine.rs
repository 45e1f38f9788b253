//! The order state machine service.
//!
//! Every lifecycle mutation enters here. The sequence is fixed: role check,
//! load, ownership check, transition resolution, satellite-record
//! validation, then commit (order update + ledger append + delivery/payment
//! writes as one logical unit), and only after the commit a fire-and-forget
//! sync dispatch.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use buildmart_auth::{Actor, ActorRole};
use buildmart_core::{CustomerId, DomainError, DomainResult, InvoiceNumber, LeadId, VendorId};
use buildmart_pricing::{DeliveryPricingEngine, GeocodingCache, ItemPricing};

use crate::delivery::{DeliveryStatus, FleetDetails, OrderDelivery};
use crate::dispatch::{SyncDispatcher, SyncKind, SyncTrigger};
use crate::ledger::{OrderStatusEvent, StatusHistoryLedger};
use crate::order::{DeliveryDetails, LineItemPrice, Order, OrderItem, PricingLine, PricingSnapshot};
use crate::payment::{OrderPayment, PaymentMethod};
use crate::status::OrderStatus;
use crate::storage::{DeliveryStore, OrderStore, PaymentStore};
use crate::transitions::{OrderAction, RequiredRole, Resolution, SideEffect, resolve};

/// Window within which a customer may amend delivery details after placement.
const AMENDMENT_WINDOW_HOURS: i64 = 48;

pub struct OrderStateMachine {
    orders: Arc<dyn OrderStore>,
    deliveries: Arc<dyn DeliveryStore>,
    payments: Arc<dyn PaymentStore>,
    ledger: Arc<StatusHistoryLedger>,
    pricing: Arc<DeliveryPricingEngine>,
    geocoder: Arc<GeocodingCache>,
    dispatcher: Arc<dyn SyncDispatcher>,
}

impl OrderStateMachine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        deliveries: Arc<dyn DeliveryStore>,
        payments: Arc<dyn PaymentStore>,
        ledger: Arc<StatusHistoryLedger>,
        pricing: Arc<DeliveryPricingEngine>,
        geocoder: Arc<GeocodingCache>,
        dispatcher: Arc<dyn SyncDispatcher>,
    ) -> Self {
        Self {
            orders,
            deliveries,
            payments,
            ledger,
            pricing,
            geocoder,
            dispatcher,
        }
    }

    pub fn ledger(&self) -> &StatusHistoryLedger {
        &self.ledger
    }

    /// Create a `pending` cart order owned by the calling customer.
    #[instrument(skip(self, actor, items), fields(actor = %actor.id))]
    pub fn create_order(
        &self,
        actor: &Actor,
        vendor_id: VendorId,
        items: Vec<OrderItem>,
    ) -> DomainResult<Order> {
        if actor.role != ActorRole::Customer {
            return Err(DomainError::Unauthorized);
        }
        let order = Order::new(customer_of(actor), vendor_id, items)?;
        self.orders.insert(order.clone())?;
        info!(lead_id = %order.lead_id, "order created");
        Ok(order)
    }

    /// Place a pending order: geocode the destination, lock in the pricing
    /// snapshot, assign the invoice number, and move to `order_placed`.
    #[instrument(skip(self, actor, details), fields(actor = %actor.id, lead_id = %lead_id))]
    pub async fn place_order(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        details: DeliveryDetails,
    ) -> DomainResult<Order> {
        ensure_role(actor, OrderAction::Place)?;
        let mut order = self.orders.get(lead_id)?;
        ensure_owned(actor, &order)?;

        let next = match resolve(order.status, OrderAction::Place)? {
            Resolution::AlreadyApplied => return Ok(order),
            Resolution::Apply { next, .. } => next,
        };

        if details.expected_date <= Utc::now() {
            return Err(DomainError::validation("expected delivery date must be in the future"));
        }

        let resolved = self.geocoder.resolve(&details.pincode).await;
        let subtotal = order.subtotal();
        let mut lines = Vec::with_capacity(order.items.len());
        for item in &order.items {
            match self.pricing.price_item(&item.category, resolved.location, subtotal) {
                ItemPricing::Quoted(quote) => lines.push(PricingLine {
                    item_ref: item.item_ref.clone(),
                    warehouse_id: quote.warehouse_id,
                    distance_km: quote.distance_km,
                    delivery_charge: quote.charge,
                    estimated_days: quote.estimated_days,
                }),
                ItemPricing::Undeliverable { category } => {
                    return Err(DomainError::validation(format!(
                        "no warehouse serves category '{category}' for item '{}'",
                        item.item_ref
                    )));
                }
            }
        }
        let snapshot = PricingSnapshot {
            total_delivery_charge: lines.iter().map(|l| l.delivery_charge).sum(),
            lines,
            is_approximate: resolved.is_approximate,
            captured_at: Utc::now(),
        };

        if order.invoice_number.is_none() {
            let sequence = self.orders.next_invoice_sequence()?;
            order.invoice_number = Some(InvoiceNumber::from_sequence(sequence));
        }

        let from = order.status;
        order.status = next;
        order.delivery = Some(details);
        order.placed_at = Some(Utc::now());
        order.pricing = Some(snapshot);
        order.touch();
        self.orders.update(order.clone())?;
        self.deliveries.upsert(OrderDelivery::new(order.lead_id.clone()))?;
        self.record(&order, actor, from, next, None);
        Ok(order)
    }

    #[instrument(skip(self, actor, remarks), fields(actor = %actor.id, lead_id = %lead_id))]
    pub fn vendor_accept(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        remarks: Option<String>,
    ) -> DomainResult<Order> {
        self.simple_transition(actor, lead_id, OrderAction::VendorAccept, remarks)
    }

    #[instrument(skip(self, actor, remarks), fields(actor = %actor.id, lead_id = %lead_id))]
    pub fn vendor_reject(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        remarks: Option<String>,
    ) -> DomainResult<Order> {
        self.simple_transition(actor, lead_id, OrderAction::VendorReject, remarks)
    }

    /// Record a payment and move to `payment_done`.
    #[instrument(skip_all, fields(actor = %actor.id, lead_id = %lead_id))]
    pub fn mark_payment_done(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        amount_paid: u64,
        method: PaymentMethod,
        transaction_id: &str,
    ) -> DomainResult<Order> {
        ensure_role(actor, OrderAction::MarkPaymentDone)?;
        let mut order = self.orders.get(lead_id)?;
        ensure_owned(actor, &order)?;

        let next = match resolve(order.status, OrderAction::MarkPaymentDone)? {
            Resolution::AlreadyApplied => return Ok(order),
            Resolution::Apply { next, .. } => next,
        };

        let invoice_number = order
            .invoice_number
            .clone()
            .ok_or_else(|| DomainError::internal("placed order has no invoice number"))?;
        let payment = OrderPayment::new(
            invoice_number,
            order.lead_id.clone(),
            amount_paid,
            method,
            transaction_id,
        )?;
        if self.payments.get(&payment.invoice_number)?.is_some() {
            return Err(DomainError::conflict(format!(
                "payment already recorded for invoice '{}'",
                payment.invoice_number
            )));
        }

        let from = order.status;
        order.status = next;
        order.touch();
        self.orders.update(order.clone())?;
        self.payments.insert(payment)?;
        self.record(&order, actor, from, next, None);
        Ok(order)
    }

    /// Confirm the order with final line-item pricing.
    #[instrument(skip_all, fields(actor = %actor.id, lead_id = %lead_id))]
    pub fn admin_confirm(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        line_pricing: &[LineItemPrice],
        remarks: Option<String>,
    ) -> DomainResult<Order> {
        ensure_role(actor, OrderAction::AdminConfirm)?;
        let mut order = self.orders.get(lead_id)?;
        ensure_owned(actor, &order)?;

        let next = match resolve(order.status, OrderAction::AdminConfirm)? {
            Resolution::AlreadyApplied => return Ok(order),
            Resolution::Apply { next, .. } => next,
        };

        order.apply_line_item_pricing(line_pricing)?;
        let from = order.status;
        order.status = next;
        order.touch();
        self.orders.update(order.clone())?;
        self.record(&order, actor, from, next, remarks);
        Ok(order)
    }

    /// Vendor shipping update. Mutates the delivery sub-record in the same
    /// logical unit as the order status and fires document sync when the
    /// order crosses `out_for_delivery`.
    #[instrument(skip_all, fields(actor = %actor.id, lead_id = %lead_id, target = %target))]
    pub fn update_shipping_status(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        target: OrderStatus,
        fleet: FleetDetails,
    ) -> DomainResult<Order> {
        let action = OrderAction::UpdateShipping(target);
        ensure_role(actor, action)?;
        let mut order = self.orders.get(lead_id)?;
        ensure_owned(actor, &order)?;

        let (next, effects) = match resolve(order.status, action)? {
            Resolution::AlreadyApplied => return Ok(order),
            Resolution::Apply { next, effects } => (next, effects),
        };

        let mut delivery = self
            .deliveries
            .get(lead_id)?
            .unwrap_or_else(|| OrderDelivery::new(lead_id.clone()));
        delivery.assign_fleet(fleet);
        if let Some(substate) = DeliveryStatus::for_order_status(next) {
            delivery.advance(substate)?;
        }

        let from = order.status;
        order.status = next;
        order.touch();
        self.orders.update(order.clone())?;
        self.deliveries.upsert(delivery)?;
        self.record(&order, actor, from, next, None);
        self.dispatch_effects(&order, &effects);
        Ok(order)
    }

    /// Cancel from any non-terminal state; the order is soft-deleted, never
    /// removed.
    #[instrument(skip(self, actor, remarks), fields(actor = %actor.id, lead_id = %lead_id))]
    pub fn admin_cancel(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        remarks: Option<String>,
    ) -> DomainResult<Order> {
        self.simple_transition(actor, lead_id, OrderAction::AdminCancel, remarks)
    }

    /// Amend delivery address/date within the 48-hour window. The pincode
    /// must match the placed pincode so the pricing snapshot stays valid.
    /// Not a lifecycle transition; no ledger entry is written.
    #[instrument(skip(self, actor, details), fields(actor = %actor.id, lead_id = %lead_id))]
    pub fn amend_delivery(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        details: DeliveryDetails,
    ) -> DomainResult<Order> {
        if actor.role != ActorRole::Customer {
            return Err(DomainError::Unauthorized);
        }
        let mut order = self.orders.get(lead_id)?;
        ensure_owned(actor, &order)?;
        if order.status.is_terminal() {
            return Err(DomainError::state_conflict(
                order.status.as_str(),
                "delivery details of a closed order cannot change",
            ));
        }

        let placed_at = order
            .placed_at
            .ok_or_else(|| DomainError::validation("order has not been placed"))?;
        if Utc::now() - placed_at > Duration::hours(AMENDMENT_WINDOW_HOURS) {
            return Err(DomainError::validation(format!(
                "delivery details can only change within {AMENDMENT_WINDOW_HOURS} hours of placement"
            )));
        }
        let current = order
            .delivery
            .as_ref()
            .ok_or_else(|| DomainError::internal("placed order has no delivery details"))?;
        if details.pincode != current.pincode {
            return Err(DomainError::validation(
                "delivery pincode cannot change after placement",
            ));
        }
        if details.expected_date <= Utc::now() {
            return Err(DomainError::validation("expected delivery date must be in the future"));
        }

        order.delivery = Some(details);
        order.touch();
        self.orders.update(order.clone())?;
        info!(lead_id = %order.lead_id, "delivery details amended");
        Ok(order)
    }

    pub fn get_order(&self, actor: &Actor, lead_id: &LeadId) -> DomainResult<Order> {
        let order = self.orders.get(lead_id)?;
        ensure_visible(actor, &order)?;
        Ok(order)
    }

    pub fn list_orders(&self, actor: &Actor) -> DomainResult<Vec<Order>> {
        let orders = self.orders.list()?;
        Ok(orders
            .into_iter()
            .filter(|o| ensure_visible(actor, o).is_ok())
            .collect())
    }

    pub fn history(&self, actor: &Actor, lead_id: &LeadId) -> DomainResult<Vec<OrderStatusEvent>> {
        let order = self.orders.get(lead_id)?;
        ensure_visible(actor, &order)?;
        Ok(self.ledger.history(lead_id))
    }

    pub fn get_delivery(&self, actor: &Actor, lead_id: &LeadId) -> DomainResult<Option<OrderDelivery>> {
        let order = self.orders.get(lead_id)?;
        ensure_visible(actor, &order)?;
        self.deliveries.get(lead_id)
    }

    pub fn get_payment(&self, actor: &Actor, lead_id: &LeadId) -> DomainResult<Option<OrderPayment>> {
        let order = self.orders.get(lead_id)?;
        ensure_visible(actor, &order)?;
        match &order.invoice_number {
            Some(invoice) => self.payments.get(invoice),
            None => Ok(None),
        }
    }

    /// Shared path for transitions that touch nothing but the order row and
    /// the ledger.
    fn simple_transition(
        &self,
        actor: &Actor,
        lead_id: &LeadId,
        action: OrderAction,
        remarks: Option<String>,
    ) -> DomainResult<Order> {
        ensure_role(actor, action)?;
        let mut order = self.orders.get(lead_id)?;
        ensure_owned(actor, &order)?;

        let (next, effects) = match resolve(order.status, action)? {
            Resolution::AlreadyApplied => return Ok(order),
            Resolution::Apply { next, effects } => (next, effects),
        };

        let from = order.status;
        order.status = next;
        if next == OrderStatus::Cancelled {
            order.is_active = false;
        }
        order.touch();
        self.orders.update(order.clone())?;
        self.record(&order, actor, from, next, remarks);
        self.dispatch_effects(&order, &effects);
        Ok(order)
    }

    fn record(
        &self,
        order: &Order,
        actor: &Actor,
        from: OrderStatus,
        to: OrderStatus,
        remarks: Option<String>,
    ) {
        self.ledger.record_transition(
            order.lead_id.clone(),
            order.invoice_number.clone(),
            actor.id,
            actor.role,
            from,
            to,
            remarks,
        );
        info!(
            lead_id = %order.lead_id,
            from = %from,
            to = %to,
            role = ?actor.role,
            "order transition committed"
        );
    }

    fn dispatch_effects(&self, order: &Order, effects: &[SideEffect]) {
        for effect in effects {
            let kind = match effect {
                SideEffect::QuoteAndSalesOrderSync => SyncKind::QuoteAndSalesOrder,
                SideEffect::InvoiceAndEwayBillSync => SyncKind::InvoiceAndEwayBill,
                // Delivery finalization commits with the transition itself.
                SideEffect::FinalizeDelivery => continue,
            };
            self.dispatcher.dispatch(SyncTrigger {
                lead_id: order.lead_id.clone(),
                kind,
                status: order.status,
            });
        }
    }
}

fn customer_of(actor: &Actor) -> CustomerId {
    CustomerId::from(Uuid::from(actor.id))
}

fn vendor_of(actor: &Actor) -> VendorId {
    VendorId::from(Uuid::from(actor.id))
}

/// Role enforcement runs before any order is loaded, so a forbidden caller
/// learns nothing about order state.
fn ensure_role(actor: &Actor, action: OrderAction) -> DomainResult<()> {
    let allowed = matches!(
        (action.required_role(), actor.role),
        (RequiredRole::Customer, ActorRole::Customer)
            | (RequiredRole::Vendor, ActorRole::Vendor)
            | (RequiredRole::Admin, ActorRole::Admin)
    );
    if allowed { Ok(()) } else { Err(DomainError::Unauthorized) }
}

/// Party ownership check. Reports not-found rather than unauthorized so an
/// actor cannot distinguish "exists but not yours" from "does not exist".
fn ensure_owned(actor: &Actor, order: &Order) -> DomainResult<()> {
    let owned = match actor.role {
        ActorRole::Customer => order.customer_id == customer_of(actor),
        ActorRole::Vendor => order.vendor_id == vendor_of(actor),
        ActorRole::Admin => true,
    };
    if owned { Ok(()) } else { Err(DomainError::not_found()) }
}

fn ensure_visible(actor: &Actor, order: &Order) -> DomainResult<()> {
    ensure_owned(actor, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::RecordingDispatcher;
    use crate::storage::{InMemoryDeliveryStore, InMemoryOrderStore, InMemoryPaymentStore};
    use async_trait::async_trait;
    use buildmart_core::{ActorId, GeoPoint, Pincode};
    use buildmart_pricing::{DeliveryConfig, GeocodeError, GeocodeProvider, GeocodeResult, Warehouse};
    use buildmart_core::WarehouseId;

    struct FixedProvider;

    #[async_trait]
    impl GeocodeProvider for FixedProvider {
        async fn lookup(&self, _pincode: &Pincode) -> Result<GeocodeResult, GeocodeError> {
            Ok(GeocodeResult {
                location: GeoPoint::new(19.0, 72.8),
                formatted_address: "Mumbai 400001".to_string(),
            })
        }
    }

    struct Fixture {
        machine: OrderStateMachine,
        dispatcher: Arc<RecordingDispatcher>,
        customer: Actor,
        vendor: Actor,
        admin: Actor,
    }

    fn fixture() -> Fixture {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let warehouse = Warehouse {
            id: WarehouseId::new("WH-BOM"),
            name: "Bhiwandi".to_string(),
            location: GeoPoint::new(19.05, 72.85),
            served_categories: vec!["cement".to_string(), "steel".to_string()],
            delivery: DeliveryConfig {
                base_charge: 50,
                per_km_charge: 10,
                free_delivery_radius_km: 2.0,
                free_delivery_threshold: u64::MAX,
                minimum_order_value: 0,
            },
        };
        let machine = OrderStateMachine::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryDeliveryStore::new()),
            Arc::new(InMemoryPaymentStore::new()),
            Arc::new(StatusHistoryLedger::new()),
            Arc::new(DeliveryPricingEngine::new(vec![warehouse])),
            Arc::new(GeocodingCache::new(Arc::new(FixedProvider))),
            dispatcher.clone(),
        );
        Fixture {
            machine,
            dispatcher,
            customer: Actor { id: ActorId::new(), role: ActorRole::Customer },
            vendor: Actor { id: ActorId::new(), role: ActorRole::Vendor },
            admin: Actor { id: ActorId::new(), role: ActorRole::Admin },
        }
    }

    fn items() -> Vec<OrderItem> {
        vec![OrderItem {
            item_ref: "opc-53".to_string(),
            category: "cement".to_string(),
            quantity: 100,
            unit_price: None,
            loading_charges: 0,
        }]
    }

    fn details() -> DeliveryDetails {
        DeliveryDetails {
            address: "Plot 14, MIDC, Thane".to_string(),
            pincode: Pincode::new("400001").unwrap(),
            expected_date: Utc::now() + Duration::days(5),
        }
    }

    fn create(f: &Fixture) -> Order {
        f.machine
            .create_order(&f.customer, vendor_of(&f.vendor), items())
            .unwrap()
    }

    async fn place(f: &Fixture) -> Order {
        let order = create(f);
        f.machine
            .place_order(&f.customer, &order.lead_id, details())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn full_lifecycle_reaches_delivered_with_sync_triggers() {
        let f = fixture();
        let order = place(&f).await;
        let lead = &order.lead_id;
        assert_eq!(order.status, OrderStatus::OrderPlaced);
        assert!(order.invoice_number.is_some());
        assert!(order.pricing.is_some());

        f.machine.vendor_accept(&f.vendor, lead, None).unwrap();
        f.machine
            .mark_payment_done(&f.admin, lead, 450_000, PaymentMethod::BankTransfer, "TXN-1")
            .unwrap();
        f.machine
            .admin_confirm(
                &f.admin,
                lead,
                &[LineItemPrice {
                    item_ref: "opc-53".to_string(),
                    unit_price: 4_500,
                    loading_charges: 0,
                }],
                None,
            )
            .unwrap();
        for target in [
            OrderStatus::TruckLoading,
            OrderStatus::InTransit,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            f.machine
                .update_shipping_status(&f.vendor, lead, target, FleetDetails::default())
                .unwrap();
        }

        let order = f.machine.get_order(&f.admin, lead).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);

        let kinds: Vec<SyncKind> = f.dispatcher.recorded().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![SyncKind::QuoteAndSalesOrder, SyncKind::InvoiceAndEwayBill]);

        let history = f.machine.history(&f.admin, lead).unwrap();
        assert_eq!(history.len(), 9);
        assert_eq!(history[0].from_status, OrderStatus::Pending);
        assert_eq!(history.last().unwrap().to_status, OrderStatus::Delivered);

        let delivery = f.machine.get_delivery(&f.admin, lead).unwrap().unwrap();
        assert_eq!(delivery.status, DeliveryStatus::Delivered);
        assert!(delivery.delivered_at.is_some());

        let payment = f.machine.get_payment(&f.admin, lead).unwrap().unwrap();
        assert_eq!(payment.amount_paid, 450_000);
    }

    #[tokio::test]
    async fn placement_captures_the_worked_pricing_example() {
        let f = fixture();
        let order = place(&f).await;
        let snapshot = order.pricing.unwrap();
        assert_eq!(snapshot.lines.len(), 1);
        assert!(!snapshot.is_approximate);
        // Warehouse ~7.8 km away: 50 + 10 * (d - 2), rounded.
        let line = &snapshot.lines[0];
        assert_eq!(line.warehouse_id, WarehouseId::new("WH-BOM"));
        assert!(line.delivery_charge > 50);
        assert_eq!(snapshot.total_delivery_charge, line.delivery_charge);
    }

    #[tokio::test]
    async fn placement_rejects_past_delivery_date() {
        let f = fixture();
        let order = create(&f);
        let mut bad = details();
        bad.expected_date = Utc::now() - Duration::days(1);
        let err = f
            .machine
            .place_order(&f.customer, &order.lead_id, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            f.machine.get_order(&f.admin, &order.lead_id).unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn placement_fails_when_an_item_is_undeliverable() {
        let f = fixture();
        let order = f
            .machine
            .create_order(
                &f.customer,
                vendor_of(&f.vendor),
                vec![OrderItem {
                    item_ref: "aac-block".to_string(),
                    category: "blocks".to_string(),
                    quantity: 10,
                    unit_price: None,
                    loading_charges: 0,
                }],
            )
            .unwrap();
        let err = f
            .machine
            .place_order(&f.customer, &order.lead_id, details())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn role_is_checked_before_state() {
        let f = fixture();
        let order = place(&f).await;
        // Vendor attempting an admin action on a state where it would also
        // be illegal: the role failure must win.
        let err = f
            .machine
            .admin_confirm(&f.vendor, &order.lead_id, &[], None)
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn any_admin_can_confirm_after_ownership_check() {
        let f = fixture();
        let order = place(&f).await;
        let lead = &order.lead_id;
        f.machine.vendor_accept(&f.vendor, lead, None).unwrap();
        f.machine
            .mark_payment_done(&f.admin, lead, 450_000, PaymentMethod::BankTransfer, "TXN-1")
            .unwrap();
        // Confirmation runs the same ownership check as every other
        // transition; admins pass it for orders they are not a party to.
        let second_admin = Actor { id: ActorId::new(), role: ActorRole::Admin };
        let order = f
            .machine
            .admin_confirm(
                &second_admin,
                lead,
                &[LineItemPrice {
                    item_ref: "opc-53".to_string(),
                    unit_price: 4_500,
                    loading_charges: 0,
                }],
                None,
            )
            .unwrap();
        assert_eq!(order.status, OrderStatus::OrderConfirmed);
    }

    #[tokio::test]
    async fn foreign_vendor_cannot_see_or_move_the_order() {
        let f = fixture();
        let order = place(&f).await;
        let other_vendor = Actor { id: ActorId::new(), role: ActorRole::Vendor };
        assert!(matches!(
            f.machine.vendor_accept(&other_vendor, &order.lead_id, None),
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            f.machine.get_order(&other_vendor, &order.lead_id),
            Err(DomainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn repeated_accept_is_a_no_op_without_resync() {
        let f = fixture();
        let order = place(&f).await;
        f.machine.vendor_accept(&f.vendor, &order.lead_id, None).unwrap();
        let before = f.machine.history(&f.admin, &order.lead_id).unwrap().len();

        let after_repeat = f.machine.vendor_accept(&f.vendor, &order.lead_id, None).unwrap();
        assert_eq!(after_repeat.status, OrderStatus::VendorAccepted);
        assert_eq!(f.machine.history(&f.admin, &order.lead_id).unwrap().len(), before);
        assert_eq!(f.dispatcher.recorded().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_order_rejects_further_transitions_and_is_inactive() {
        let f = fixture();
        let order = place(&f).await;
        let cancelled = f
            .machine
            .admin_cancel(&f.admin, &order.lead_id, Some("customer request".to_string()))
            .unwrap();
        assert!(!cancelled.is_active);
        assert!(matches!(
            f.machine.vendor_accept(&f.vendor, &order.lead_id, None),
            Err(DomainError::StateConflict { .. })
        ));
        assert!(matches!(
            f.machine.admin_cancel(&f.admin, &order.lead_id, None),
            Err(DomainError::StateConflict { .. })
        ));
    }

    #[tokio::test]
    async fn amendment_allowed_within_window_same_pincode() {
        let f = fixture();
        let order = place(&f).await;
        let mut amended = details();
        amended.address = "Gate 2, Warehouse Rd, Thane".to_string();
        let updated = f
            .machine
            .amend_delivery(&f.customer, &order.lead_id, amended)
            .unwrap();
        assert_eq!(
            updated.delivery.unwrap().address,
            "Gate 2, Warehouse Rd, Thane"
        );
        // Amendments are not lifecycle transitions.
        assert_eq!(f.machine.history(&f.admin, &order.lead_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn amendment_rejects_pincode_change() {
        let f = fixture();
        let order = place(&f).await;
        let mut amended = details();
        amended.pincode = Pincode::new("110001").unwrap();
        assert!(matches!(
            f.machine.amend_delivery(&f.customer, &order.lead_id, amended),
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn amendment_rejected_outside_window() {
        let f = fixture();
        let order = place(&f).await;
        // Age the placement past the window.
        let mut aged = f.machine.get_order(&f.admin, &order.lead_id).unwrap();
        aged.placed_at = Some(Utc::now() - Duration::hours(AMENDMENT_WINDOW_HOURS + 1));
        aged.touch();
        f.machine.orders.update(aged).unwrap();

        assert!(matches!(
            f.machine.amend_delivery(&f.customer, &order.lead_id, details()),
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let f = fixture();
        let order = place(&f).await;
        let other_customer = Actor { id: ActorId::new(), role: ActorRole::Customer };

        assert_eq!(f.machine.list_orders(&f.customer).unwrap().len(), 1);
        assert_eq!(f.machine.list_orders(&f.vendor).unwrap().len(), 1);
        assert_eq!(f.machine.list_orders(&f.admin).unwrap().len(), 1);
        assert!(f.machine.list_orders(&other_customer).unwrap().is_empty());
        drop(order);
    }

    #[tokio::test]
    async fn duplicate_payment_is_a_conflict() {
        let f = fixture();
        let order = place(&f).await;
        f.machine.vendor_accept(&f.vendor, &order.lead_id, None).unwrap();
        f.machine
            .mark_payment_done(&f.admin, &order.lead_id, 450_000, PaymentMethod::Upi, "TXN-1")
            .unwrap();
        // Repeat of the current status short-circuits before the payment
        // stores anything new.
        let repeat = f
            .machine
            .mark_payment_done(&f.admin, &order.lead_id, 450_000, PaymentMethod::Upi, "TXN-2")
            .unwrap();
        assert_eq!(repeat.status, OrderStatus::PaymentDone);
        let payment = f.machine.get_payment(&f.admin, &order.lead_id).unwrap().unwrap();
        assert_eq!(payment.transaction_id, "TXN-1");
    }
}
