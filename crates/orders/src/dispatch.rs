//! Seam for post-commit external synchronization.
//!
//! The state machine commits a transition, then hands a trigger to a
//! dispatcher. Dispatch is fire-and-forget: it must never block, fail the
//! transition, or be retried by the caller.

use buildmart_core::LeadId;

use crate::status::OrderStatus;

/// What the orchestrator should mirror into the accounting system.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncKind {
    /// Quote followed by sales order; fired on vendor acceptance.
    QuoteAndSalesOrder,
    /// Invoice followed by e-way bill; fired when the order goes out for
    /// delivery.
    InvoiceAndEwayBill,
}

/// A committed transition that requires document generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTrigger {
    pub lead_id: LeadId,
    pub kind: SyncKind,
    pub status: OrderStatus,
}

/// Accepts sync triggers after a transition commits.
pub trait SyncDispatcher: Send + Sync {
    fn dispatch(&self, trigger: SyncTrigger);
}

/// Dispatcher that drops every trigger. Used when no accounting backend is
/// configured, and in unit tests.
#[derive(Debug, Default)]
pub struct NullSyncDispatcher;

impl SyncDispatcher for NullSyncDispatcher {
    fn dispatch(&self, _trigger: SyncTrigger) {}
}
