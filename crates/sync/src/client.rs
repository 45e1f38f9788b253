//! Accounting-system client seam.
//!
//! The wire format of the accounting backend is out of scope; this crate
//! only needs "create this document, give me its id". Production plugs a
//! real client behind [`AccountingClient`]; the in-memory implementation
//! backs dev and tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use buildmart_core::CustomerId;
use buildmart_orders::Order;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountingError {
    #[error("accounting backend unavailable: {0}")]
    Unavailable(String),

    #[error("accounting backend rejected the document: {0}")]
    Rejected(String),
}

/// External accounting document creation. Each call either yields the
/// external document id or fails; the orchestrator owns idempotence via the
/// persisted ids, so implementations need not dedupe.
#[async_trait]
pub trait AccountingClient: Send + Sync {
    /// Idempotent on the backend side: returns the existing external
    /// customer id when one is already registered.
    async fn create_or_get_customer(&self, customer_id: &CustomerId) -> Result<String, AccountingError>;

    async fn create_quote(&self, order: &Order) -> Result<String, AccountingError>;
    async fn create_sales_order(&self, order: &Order) -> Result<String, AccountingError>;
    async fn create_invoice(&self, order: &Order) -> Result<String, AccountingError>;
    async fn create_eway_bill(&self, order: &Order) -> Result<String, AccountingError>;
}

/// Counting stub backend. Every creation succeeds with a sequential id
/// unless the failure flag is set.
#[derive(Debug, Default)]
pub struct InMemoryAccountingClient {
    sequence: AtomicU64,
    pub customers_created: AtomicU64,
    pub quotes_created: AtomicU64,
    pub sales_orders_created: AtomicU64,
    pub invoices_created: AtomicU64,
    pub eway_bills_created: AtomicU64,
    pub fail: std::sync::atomic::AtomicBool,
}

impl InMemoryAccountingClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn check_available(&self) -> Result<(), AccountingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AccountingError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountingClient for InMemoryAccountingClient {
    async fn create_or_get_customer(&self, _customer_id: &CustomerId) -> Result<String, AccountingError> {
        self.check_available()?;
        self.customers_created.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_id("CUST"))
    }

    async fn create_quote(&self, _order: &Order) -> Result<String, AccountingError> {
        self.check_available()?;
        self.quotes_created.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_id("QT"))
    }

    async fn create_sales_order(&self, _order: &Order) -> Result<String, AccountingError> {
        self.check_available()?;
        self.sales_orders_created.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_id("SO"))
    }

    async fn create_invoice(&self, _order: &Order) -> Result<String, AccountingError> {
        self.check_available()?;
        self.invoices_created.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_id("ACC-INV"))
    }

    async fn create_eway_bill(&self, _order: &Order) -> Result<String, AccountingError> {
        self.check_available()?;
        self.eway_bills_created.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_id("EWB"))
    }
}
