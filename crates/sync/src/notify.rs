//! Post-sync notification seam.

use buildmart_core::LeadId;
use buildmart_orders::DocumentKind;
use tracing::info;

/// Notified after an external document lands. Implementations must not
/// fail; a lost notification is acceptable, a blocked sync is not.
pub trait Notifier: Send + Sync {
    fn document_created(&self, lead_id: &LeadId, kind: DocumentKind, external_id: &str);
}

/// Default notifier: structured log lines only.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn document_created(&self, lead_id: &LeadId, kind: DocumentKind, external_id: &str) {
        info!(lead_id = %lead_id, kind = %kind, external_id, "external document created");
    }
}
