//! Background sync worker.
//!
//! One spawned task drains an unbounded channel and runs the orchestrator
//! on each trigger. The single consumer serializes document creation per
//! order, which closes the duplicate window for concurrent triggers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use buildmart_orders::{SyncDispatcher, SyncTrigger};

use crate::orchestrator::SyncOrchestrator;

/// Sending half of the worker channel. Implements the dispatcher seam the
/// state machine hands triggers to.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncTrigger>,
}

impl SyncDispatcher for SyncHandle {
    fn dispatch(&self, trigger: SyncTrigger) {
        if self.tx.send(trigger).is_err() {
            // Worker task is gone; the trigger is lost by design and a later
            // trigger for the same order completes the sync.
            warn!("sync worker unavailable, trigger dropped");
        }
    }
}

/// Spawn the worker task and return its dispatch handle. The task runs
/// until every handle is dropped.
pub fn spawn(orchestrator: Arc<SyncOrchestrator>) -> SyncHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<SyncTrigger>();
    tokio::spawn(async move {
        info!("sync worker started");
        while let Some(trigger) = rx.recv().await {
            orchestrator.process(trigger).await;
        }
        info!("sync worker stopped");
    });
    SyncHandle { tx }
}
