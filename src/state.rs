use std::sync::Arc;

use crate::api::invoices::repository::InvoiceStore;
use crate::api::invoices::service::InvoiceService;
use crate::services::email_service::Notifier;

/// Per-process application state shared across request handlers. Holds no
/// mutable data; the collaborators are injected at construction so tests can
/// run the full router against in-memory fakes.
pub struct AppState {
    pub invoices: InvoiceService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        notifier: Arc<dyn Notifier>,
        sender_address: impl Into<String>,
    ) -> Self {
        Self {
            invoices: InvoiceService::new(store, notifier, sender_address),
        }
    }
}
