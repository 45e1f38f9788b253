//! External sync orchestration.
//!
//! Mirrors committed order transitions into the accounting backend. There
//! is no durable retry queue: a failed run leaves the corresponding ids
//! unset and a later trigger for the same order completes the work. The
//! persisted set-at-most-once ids are the idempotence guard.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use buildmart_core::DomainError;
use buildmart_orders::{DocumentKind, Order, OrderStore, SyncKind, SyncTrigger};

use crate::client::{AccountingClient, AccountingError};
use crate::notify::Notifier;

/// Upper bound on a single accounting call.
pub const SYNC_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("accounting call timed out")]
    Timeout,

    #[error(transparent)]
    Accounting(#[from] AccountingError),

    #[error("order store error: {0}")]
    Store(#[from] DomainError),
}

pub struct SyncOrchestrator {
    orders: Arc<dyn OrderStore>,
    client: Arc<dyn AccountingClient>,
    notifier: Arc<dyn Notifier>,
}

impl SyncOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        client: Arc<dyn AccountingClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orders,
            client,
            notifier,
        }
    }

    /// Process one trigger to completion. Failures are logged and swallowed;
    /// the caller never observes them and the transition that produced the
    /// trigger is already committed.
    #[instrument(skip(self), fields(lead_id = %trigger.lead_id, kind = ?trigger.kind))]
    pub async fn process(&self, trigger: SyncTrigger) {
        let order = match self.orders.get(&trigger.lead_id) {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "sync trigger for unknown order dropped");
                return;
            }
        };

        let result = match trigger.kind {
            SyncKind::QuoteAndSalesOrder => self.quote_and_sales_order(&order).await,
            SyncKind::InvoiceAndEwayBill => self.invoice_and_eway_bill(&order).await,
        };

        if let Err(err) = result {
            warn!(error = %err, "external sync incomplete; a later trigger finishes it");
        }
    }

    async fn quote_and_sales_order(&self, order: &Order) -> Result<(), SyncError> {
        if order.external.get(DocumentKind::Quote).is_some()
            && order.external.get(DocumentKind::SalesOrder).is_some()
        {
            debug!("quote and sales order already mirrored");
            return Ok(());
        }
        bounded(self.client.create_or_get_customer(&order.customer_id)).await?;
        if order.external.get(DocumentKind::Quote).is_none() {
            let id = bounded(self.client.create_quote(order)).await?;
            self.persist(order, DocumentKind::Quote, &id)?;
        }
        if order.external.get(DocumentKind::SalesOrder).is_none() {
            let id = bounded(self.client.create_sales_order(order)).await?;
            self.persist(order, DocumentKind::SalesOrder, &id)?;
        }
        Ok(())
    }

    async fn invoice_and_eway_bill(&self, order: &Order) -> Result<(), SyncError> {
        if order.external.get(DocumentKind::Invoice).is_some()
            && order.external.get(DocumentKind::EwayBill).is_some()
        {
            debug!("invoice and e-way bill already mirrored");
            return Ok(());
        }
        if order.external.get(DocumentKind::Invoice).is_none() {
            let id = bounded(self.client.create_invoice(order)).await?;
            self.persist(order, DocumentKind::Invoice, &id)?;
        }
        if order.external.get(DocumentKind::EwayBill).is_none() {
            let id = bounded(self.client.create_eway_bill(order)).await?;
            self.persist(order, DocumentKind::EwayBill, &id)?;
        }
        Ok(())
    }

    fn persist(&self, order: &Order, kind: DocumentKind, external_id: &str) -> Result<(), SyncError> {
        let set = self.orders.set_external_ref(&order.lead_id, kind, external_id)?;
        if set {
            info!(lead_id = %order.lead_id, kind = %kind, external_id, "external document id recorded");
            self.notifier.document_created(&order.lead_id, kind, external_id);
        } else {
            // Lost a race against an earlier completion; the stored id wins
            // and the freshly created document is orphaned on purpose.
            debug!(lead_id = %order.lead_id, kind = %kind, "external id already set, keeping first");
        }
        Ok(())
    }
}

async fn bounded<F>(call: F) -> Result<String, SyncError>
where
    F: Future<Output = Result<String, AccountingError>>,
{
    match tokio::time::timeout(SYNC_CALL_TIMEOUT, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SyncError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryAccountingClient;
    use crate::notify::LoggingNotifier;
    use buildmart_core::{CustomerId, VendorId};
    use buildmart_orders::{InMemoryOrderStore, OrderItem, OrderStatus};
    use std::sync::atomic::Ordering;

    struct Fixture {
        orders: Arc<InMemoryOrderStore>,
        client: Arc<InMemoryAccountingClient>,
        orchestrator: SyncOrchestrator,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderStore::new());
        let client = Arc::new(InMemoryAccountingClient::new());
        let orchestrator = SyncOrchestrator::new(
            orders.clone(),
            client.clone(),
            Arc::new(LoggingNotifier),
        );
        Fixture {
            orders,
            client,
            orchestrator,
        }
    }

    fn accepted_order(f: &Fixture) -> Order {
        let mut order = Order::new(
            CustomerId::new(),
            VendorId::new(),
            vec![OrderItem {
                item_ref: "opc-53".to_string(),
                category: "cement".to_string(),
                quantity: 10,
                unit_price: Some(4_500),
                loading_charges: 0,
            }],
        )
        .unwrap();
        order.status = OrderStatus::VendorAccepted;
        f.orders.insert(order.clone()).unwrap();
        order
    }

    fn trigger(order: &Order, kind: SyncKind) -> SyncTrigger {
        SyncTrigger {
            lead_id: order.lead_id.clone(),
            kind,
            status: order.status,
        }
    }

    #[tokio::test]
    async fn quote_and_sales_order_created_exactly_once() {
        let f = fixture();
        let order = accepted_order(&f);

        f.orchestrator.process(trigger(&order, SyncKind::QuoteAndSalesOrder)).await;
        f.orchestrator.process(trigger(&order, SyncKind::QuoteAndSalesOrder)).await;

        assert_eq!(f.client.quotes_created.load(Ordering::SeqCst), 1);
        assert_eq!(f.client.sales_orders_created.load(Ordering::SeqCst), 1);

        let stored = f.orders.get(&order.lead_id).unwrap();
        assert!(stored.external.get(DocumentKind::Quote).is_some());
        assert!(stored.external.get(DocumentKind::SalesOrder).is_some());
        assert!(stored.external.get(DocumentKind::Invoice).is_none());
    }

    #[tokio::test]
    async fn invoice_and_eway_bill_only_on_their_trigger() {
        let f = fixture();
        let order = accepted_order(&f);

        f.orchestrator.process(trigger(&order, SyncKind::InvoiceAndEwayBill)).await;

        assert_eq!(f.client.quotes_created.load(Ordering::SeqCst), 0);
        assert_eq!(f.client.invoices_created.load(Ordering::SeqCst), 1);
        assert_eq!(f.client.eway_bills_created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_leaves_ids_unset_and_a_later_trigger_completes() {
        let f = fixture();
        let order = accepted_order(&f);

        f.client.fail.store(true, Ordering::SeqCst);
        f.orchestrator.process(trigger(&order, SyncKind::QuoteAndSalesOrder)).await;
        let stored = f.orders.get(&order.lead_id).unwrap();
        assert!(stored.external.get(DocumentKind::Quote).is_none());
        assert!(stored.external.get(DocumentKind::SalesOrder).is_none());

        f.client.fail.store(false, Ordering::SeqCst);
        f.orchestrator.process(trigger(&order, SyncKind::QuoteAndSalesOrder)).await;
        let stored = f.orders.get(&order.lead_id).unwrap();
        assert!(stored.external.get(DocumentKind::Quote).is_some());
        assert!(stored.external.get(DocumentKind::SalesOrder).is_some());
        assert_eq!(f.client.quotes_created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pre_existing_quote_id_skips_quote_creation() {
        let f = fixture();
        let order = accepted_order(&f);
        assert!(f
            .orders
            .set_external_ref(&order.lead_id, DocumentKind::Quote, "QT-EXISTING")
            .unwrap());

        f.orchestrator.process(trigger(&order, SyncKind::QuoteAndSalesOrder)).await;

        assert_eq!(f.client.quotes_created.load(Ordering::SeqCst), 0);
        assert_eq!(f.client.sales_orders_created.load(Ordering::SeqCst), 1);
        let stored = f.orders.get(&order.lead_id).unwrap();
        assert_eq!(stored.external.get(DocumentKind::Quote), Some("QT-EXISTING"));
    }

    #[tokio::test]
    async fn trigger_for_unknown_order_is_dropped() {
        let f = fixture();
        let ghost = SyncTrigger {
            lead_id: buildmart_core::LeadId::generate(),
            kind: SyncKind::QuoteAndSalesOrder,
            status: OrderStatus::VendorAccepted,
        };
        f.orchestrator.process(ghost).await;
        assert_eq!(f.client.customers_created.load(Ordering::SeqCst), 0);
    }
}
