//! `buildmart-sync`: accounting-system synchronization.
//!
//! Consumes the sync triggers the order state machine emits after a
//! transition commits and mirrors the order into the accounting backend as
//! quote, sales order, invoice, and e-way-bill documents. Deliberately
//! retry-less: the persisted document ids are the only idempotence state.

pub mod client;
pub mod notify;
pub mod orchestrator;
pub mod worker;

pub use client::{AccountingClient, AccountingError, InMemoryAccountingClient};
pub use notify::{LoggingNotifier, Notifier};
pub use orchestrator::{SYNC_CALL_TIMEOUT, SyncError, SyncOrchestrator};
pub use worker::{SyncHandle, spawn};
