//! Repository traits and in-memory implementations.
//!
//! In-memory stores back dev and tests; a database-backed implementation
//! slots in behind the same traits.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

use buildmart_core::{DomainError, DomainResult, InvoiceNumber, LeadId};

use crate::delivery::OrderDelivery;
use crate::order::{DocumentKind, Order};
use crate::payment::OrderPayment;

/// Order persistence with optimistic concurrency.
pub trait OrderStore: Send + Sync {
    /// Insert a brand-new order. Fails on duplicate lead id.
    fn insert(&self, order: Order) -> DomainResult<()>;

    fn get(&self, lead_id: &LeadId) -> DomainResult<Order>;

    fn list(&self) -> DomainResult<Vec<Order>>;

    /// Persist an updated order. The caller must have bumped `version` via
    /// [`Order::touch`]; the store rejects the write unless the stored
    /// version is exactly one behind. External document ids already present
    /// in the stored copy always win over absent ones in the update, so a
    /// concurrent sync completion is never erased by a lifecycle write.
    fn update(&self, order: Order) -> DomainResult<()>;

    /// Record an external document id if not already set. Returns whether
    /// this call set it; false means an id was already present.
    fn set_external_ref(
        &self,
        lead_id: &LeadId,
        kind: DocumentKind,
        external_id: &str,
    ) -> DomainResult<bool>;

    /// Next value of the monotonically increasing invoice sequence.
    fn next_invoice_sequence(&self) -> DomainResult<u64>;
}

/// Delivery records keyed by lead id.
pub trait DeliveryStore: Send + Sync {
    fn upsert(&self, delivery: OrderDelivery) -> DomainResult<()>;
    fn get(&self, lead_id: &LeadId) -> DomainResult<Option<OrderDelivery>>;
}

/// Payment records keyed by invoice number.
pub trait PaymentStore: Send + Sync {
    /// Insert a payment. Fails with a conflict when the invoice already has
    /// one.
    fn insert(&self, payment: OrderPayment) -> DomainResult<()>;
    fn get(&self, invoice_number: &InvoiceNumber) -> DomainResult<Option<OrderPayment>>;
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<LeadId, Order>>,
    invoice_sequence: AtomicU64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) -> DomainResult<()> {
        let mut orders = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        if orders.contains_key(&order.lead_id) {
            return Err(DomainError::conflict(format!(
                "order '{}' already exists",
                order.lead_id
            )));
        }
        orders.insert(order.lead_id.clone(), order);
        Ok(())
    }

    fn get(&self, lead_id: &LeadId) -> DomainResult<Order> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lead_id)
            .cloned()
            .ok_or_else(DomainError::not_found)
    }

    fn list(&self) -> DomainResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    fn update(&self, mut order: Order) -> DomainResult<()> {
        let mut orders = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        let stored = orders
            .get(&order.lead_id)
            .ok_or_else(DomainError::not_found)?;
        if stored.version + 1 != order.version {
            return Err(DomainError::conflict(format!(
                "stale write for order '{}': stored version {}, update version {}",
                order.lead_id, stored.version, order.version
            )));
        }

        // First-written external refs win.
        for kind in [
            DocumentKind::Quote,
            DocumentKind::SalesOrder,
            DocumentKind::Invoice,
            DocumentKind::EwayBill,
        ] {
            if order.external.get(kind).is_none() {
                if let Some(existing) = stored.external.get(kind) {
                    order.external.set_if_absent(kind, existing);
                }
            }
        }

        orders.insert(order.lead_id.clone(), order);
        Ok(())
    }

    fn set_external_ref(
        &self,
        lead_id: &LeadId,
        kind: DocumentKind,
        external_id: &str,
    ) -> DomainResult<bool> {
        let mut orders = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        let order = orders.get_mut(lead_id).ok_or_else(DomainError::not_found)?;
        let set = order.external.set_if_absent(kind, external_id);
        if set {
            order.version += 1;
            order.updated_at = chrono::Utc::now();
        }
        Ok(set)
    }

    fn next_invoice_sequence(&self) -> DomainResult<u64> {
        Ok(self.invoice_sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDeliveryStore {
    deliveries: RwLock<HashMap<LeadId, OrderDelivery>>,
}

impl InMemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeliveryStore for InMemoryDeliveryStore {
    fn upsert(&self, delivery: OrderDelivery) -> DomainResult<()> {
        self.deliveries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(delivery.lead_id.clone(), delivery);
        Ok(())
    }

    fn get(&self, lead_id: &LeadId) -> DomainResult<Option<OrderDelivery>> {
        Ok(self
            .deliveries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lead_id)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<InvoiceNumber, OrderPayment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn insert(&self, payment: OrderPayment) -> DomainResult<()> {
        let mut payments = self.payments.write().unwrap_or_else(PoisonError::into_inner);
        if payments.contains_key(&payment.invoice_number) {
            return Err(DomainError::conflict(format!(
                "payment already recorded for invoice '{}'",
                payment.invoice_number
            )));
        }
        payments.insert(payment.invoice_number.clone(), payment);
        Ok(())
    }

    fn get(&self, invoice_number: &InvoiceNumber) -> DomainResult<Option<OrderPayment>> {
        Ok(self
            .payments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(invoice_number)
            .cloned())
    }
}
