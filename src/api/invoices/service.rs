use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use tracing::{info, warn};

use crate::api::invoices::error_handling::InvoiceError;
use crate::api::invoices::models::{CreateInvoiceRequest, Invoice, NewInvoice};
use crate::api::invoices::repository::{InvoiceStore, StoreError};
use crate::services::email_service::{Notifier, OutgoingEmail};

/// Cap on id-generation attempts. The space holds 9000 ids, so hitting this
/// means the store is close to exhaustion and looping further would not help.
const MAX_ID_ATTEMPTS: u32 = 100;

const DEFAULT_STATUS: &str = "Pending";
const SENDER_NAME: &str = "NovHawk Billing";

// ============================================================================
// INVOICE SERVICE
// ============================================================================

/// Invoice lifecycle: creation with retry-until-unique id generation, listing,
/// and email dispatch. Store and notifier are injected collaborators.
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
    notifier: Arc<dyn Notifier>,
    sender_address: String,
}

impl InvoiceService {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        notifier: Arc<dyn Notifier>,
        sender_address: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            sender_address: sender_address.into(),
        }
    }

    pub async fn create(&self, request: CreateInvoiceRequest) -> Result<Invoice, InvoiceError> {
        let customer = request.customer.as_deref().map(str::trim).unwrap_or("");
        let email = request.email.as_deref().map(str::trim).unwrap_or("");

        let amount = match request.amount {
            Some(amount) if !customer.is_empty() && !email.is_empty() => amount,
            _ => {
                warn!("Invoice creation rejected: missing required fields");
                return Err(InvoiceError::Validation {
                    message: "Customer, email, and amount are required".to_string(),
                });
            }
        };

        let id = self.generate_invoice_id().await?;

        let status = match request.status {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_STATUS.to_string(),
        };

        let invoice = NewInvoice {
            id,
            customer: customer.to_string(),
            email: email.to_string(),
            amount,
            status,
            date: resolve_invoice_date(request.date.as_deref()),
        };

        // The existence check above narrows the race window but the store's
        // uniqueness constraint is the actual correctness mechanism. A losing
        // concurrent insert surfaces as a 409, never a silent overwrite.
        let invoice = self.store.create(invoice).await.map_err(|e| match e {
            StoreError::DuplicateId { id } => InvoiceError::DuplicateId { id },
            StoreError::Unavailable(detail) => {
                InvoiceError::store("Failed to create invoice", detail)
            }
        })?;

        info!("✅ Invoice saved: {}", invoice.id);
        Ok(invoice)
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, InvoiceError> {
        self.store
            .find_all()
            .await
            .map_err(|e| InvoiceError::store("Failed to fetch invoices", e.to_string()))
    }

    /// Emails the invoice to its stored customer address. Returns the id for
    /// the confirmation message.
    pub async fn send(&self, id: &str) -> Result<String, InvoiceError> {
        let invoice = self
            .store
            .find_one(id)
            .await
            .map_err(|e| InvoiceError::store("Failed to send invoice email", e.to_string()))?
            .ok_or_else(|| InvoiceError::NotFound { id: id.to_string() })?;

        let email = compose_invoice_email(&self.sender_address, &invoice);

        self.notifier
            .send(email)
            .await
            .map_err(|e| InvoiceError::Dispatch {
                detail: e.to_string(),
            })?;

        info!("📧 Invoice email sent: {}", invoice.id);
        Ok(invoice.id)
    }

    /// Draws uniformly random `INV-####` candidates until one is unused.
    /// Retries only against the existence check; the insert itself is covered
    /// by the store's uniqueness constraint.
    async fn generate_invoice_id(&self) -> Result<String, InvoiceError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = {
                let mut rng = rand::thread_rng();
                format!("INV-{}", rng.gen_range(1000..=9999))
            };

            let taken = self
                .store
                .exists(&candidate)
                .await
                .map_err(|e| InvoiceError::store("Failed to create invoice", e.to_string()))?;

            if !taken {
                return Ok(candidate);
            }
        }

        Err(InvoiceError::IdSpaceExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

// ============================================================================
// DATE RESOLUTION
// ============================================================================

/// Client-supplied date wins when it is non-empty after trimming and parses to
/// a valid calendar date; otherwise the creation instant is used.
pub fn resolve_invoice_date(raw: Option<&str>) -> DateTime<Utc> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => parse_client_date(s).unwrap_or_else(Utc::now),
        _ => Utc::now(),
    }
}

fn parse_client_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

// ============================================================================
// MESSAGE COMPOSITION
// ============================================================================

/// Fixed HTML template embedding the invoice fields, with the date rendered as
/// a locale-independent short date (day-of-week, month, day, year).
pub fn compose_invoice_email(sender_address: &str, invoice: &Invoice) -> OutgoingEmail {
    let html_body = format!(
        r#"
        <h2>Invoice Details</h2>
        <p><strong>Invoice ID:</strong> {id}</p>
        <p><strong>Customer:</strong> {customer}</p>
        <p><strong>Amount:</strong> ₹{amount}</p>
        <p><strong>Status:</strong> {status}</p>
        <p><strong>Date:</strong> {date}</p>
        <br/>
        <p>Thank you for choosing <b>NovHawk Billing</b>.</p>
        "#,
        id = invoice.id,
        customer = invoice.customer,
        amount = invoice.amount,
        status = invoice.status,
        date = invoice.date.format("%a %b %d %Y"),
    );

    OutgoingEmail {
        from: format!("{} <{}>", SENDER_NAME, sender_address),
        to: invoice.email.clone(),
        subject: format!("Invoice {}", invoice.id),
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::invoices::test_support::{MemoryInvoiceStore, RecordingNotifier};
    use chrono::TimeZone;

    fn service_with(
        store: Arc<MemoryInvoiceStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> InvoiceService {
        InvoiceService::new(store, notifier, "billing@novhawk.test")
    }

    fn valid_request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            customer: Some("Acme".to_string()),
            email: Some("a@acme.com".to_string()),
            amount: Some(250.0),
            status: None,
            date: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_defaults() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store.clone(), Arc::new(RecordingNotifier::default()));

        let before = Utc::now();
        let invoice = service.create(valid_request()).await.unwrap();

        assert!(invoice.id.starts_with("INV-"));
        assert_eq!(invoice.id.len(), 8);
        assert!(invoice.id[4..].chars().all(|c| c.is_ascii_digit()));
        let number: u32 = invoice.id[4..].parse().unwrap();
        assert!((1000..=9999).contains(&number));

        assert_eq!(invoice.status, "Pending");
        assert_eq!(invoice.amount, 250.0);
        assert!(invoice.date >= before && invoice.date <= Utc::now());
    }

    #[tokio::test]
    async fn create_trims_customer_and_email() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store, Arc::new(RecordingNotifier::default()));

        let invoice = service
            .create(CreateInvoiceRequest {
                customer: Some("  Acme  ".to_string()),
                email: Some(" a@acme.com ".to_string()),
                ..valid_request()
            })
            .await
            .unwrap();

        assert_eq!(invoice.customer, "Acme");
        assert_eq!(invoice.email, "a@acme.com");
    }

    #[tokio::test]
    async fn create_rejects_missing_required_fields() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store.clone(), Arc::new(RecordingNotifier::default()));

        let cases = [
            CreateInvoiceRequest {
                customer: None,
                ..valid_request()
            },
            CreateInvoiceRequest {
                customer: Some("   ".to_string()),
                ..valid_request()
            },
            CreateInvoiceRequest {
                email: Some(String::new()),
                ..valid_request()
            },
            CreateInvoiceRequest {
                amount: None,
                ..valid_request()
            },
        ];

        for request in cases {
            let err = service.create(request).await.unwrap_err();
            assert!(matches!(err, InvoiceError::Validation { .. }));
        }

        // Nothing was persisted on any rejected attempt.
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_keeps_supplied_status_and_date() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store, Arc::new(RecordingNotifier::default()));

        let invoice = service
            .create(CreateInvoiceRequest {
                status: Some("Paid".to_string()),
                date: Some("2025-04-04".to_string()),
                ..valid_request()
            })
            .await
            .unwrap();

        assert_eq!(invoice.status, "Paid");
        assert_eq!(invoice.date, Utc.with_ymd_and_hms(2025, 4, 4, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn create_falls_back_to_now_for_unparseable_date() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store, Arc::new(RecordingNotifier::default()));

        let before = Utc::now();
        let invoice = service
            .create(CreateInvoiceRequest {
                date: Some("not a date".to_string()),
                ..valid_request()
            })
            .await
            .unwrap();

        assert!(invoice.date >= before && invoice.date <= Utc::now());
    }

    #[tokio::test]
    async fn generated_ids_avoid_existing_ones() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store.clone(), Arc::new(RecordingNotifier::default()));

        let mut seen = std::collections::HashSet::new();
        for _ in 0..25 {
            let invoice = service.create(valid_request()).await.unwrap();
            assert!(seen.insert(invoice.id.clone()), "id {} reused", invoice.id);
        }
    }

    #[tokio::test]
    async fn create_fails_distinctly_when_id_space_is_exhausted() {
        let store = Arc::new(MemoryInvoiceStore::default());
        store.claim_entire_id_space();
        let service = service_with(store.clone(), Arc::new(RecordingNotifier::default()));

        let err = service.create(valid_request()).await.unwrap_err();
        match err {
            InvoiceError::IdSpaceExhausted { attempts } => assert_eq!(attempts, MAX_ID_ATTEMPTS),
            other => panic!("expected exhausted id space, got {:?}", other),
        }

        // The loop gave up at the existence check; no insert was attempted.
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_surfaces_duplicate_key_from_insert() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store.clone(), Arc::new(RecordingNotifier::default()));

        let first = service.create(valid_request()).await.unwrap();

        store.fail_next_insert_with_duplicate();
        let err = service.create(valid_request()).await.unwrap_err();
        assert!(matches!(err, InvoiceError::DuplicateId { .. }));

        // First invoice unaffected by the losing request.
        let stored = store.find_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, first.id);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let service = service_with(store, Arc::new(RecordingNotifier::default()));

        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(service.create(valid_request()).await.unwrap());
        }

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 3);

        let expected: Vec<_> = created.iter().rev().map(|i| i.id.clone()).collect();
        let actual: Vec<_> = listed.iter().map(|i| i.id.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn send_targets_stored_email() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service_with(store, notifier.clone());

        let invoice = service.create(valid_request()).await.unwrap();
        service.send(&invoice.id).await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@acme.com");
        assert_eq!(sent[0].subject, format!("Invoice {}", invoice.id));
        assert!(sent[0].from.starts_with("NovHawk Billing <"));
        assert!(sent[0].html_body.contains(&invoice.id));
        assert!(sent[0].html_body.contains("₹250"));
    }

    #[tokio::test]
    async fn send_unknown_id_is_not_found_and_dispatches_nothing() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service_with(store, notifier.clone());

        let err = service.send("INV-9999").await.unwrap_err();
        assert!(matches!(err, InvoiceError::NotFound { .. }));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn send_wraps_notifier_failure() {
        let store = Arc::new(MemoryInvoiceStore::default());
        let notifier = Arc::new(RecordingNotifier::failing("relay refused"));
        let service = service_with(store, notifier);

        let invoice = service.create(valid_request()).await.unwrap();
        let err = service.send(&invoice.id).await.unwrap_err();

        match err {
            InvoiceError::Dispatch { detail } => assert!(detail.contains("relay refused")),
            other => panic!("expected dispatch error, got {:?}", other),
        }
    }

    #[test]
    fn client_dates_parse_across_common_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 4, 4, 0, 0, 0).unwrap();
        assert_eq!(parse_client_date("2025-04-04"), Some(expected));
        assert_eq!(parse_client_date("04/04/2025"), Some(expected));
        assert_eq!(
            parse_client_date("2025-04-04T10:30:00"),
            Some(Utc.with_ymd_and_hms(2025, 4, 4, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_client_date("2025-04-04T10:30:00Z"),
            Some(Utc.with_ymd_and_hms(2025, 4, 4, 10, 30, 0).unwrap())
        );
        assert_eq!(parse_client_date("yesterday"), None);
    }

    #[test]
    fn composed_email_renders_short_date() {
        let invoice = Invoice {
            id: "INV-1234".to_string(),
            customer: "Acme".to_string(),
            email: "a@acme.com".to_string(),
            amount: 250.0,
            status: "Pending".to_string(),
            date: Utc.with_ymd_and_hms(2025, 4, 4, 10, 30, 0).unwrap(),
            created_at: Utc::now(),
        };

        let email = compose_invoice_email("billing@novhawk.test", &invoice);
        assert!(email.html_body.contains("Fri Apr 04 2025"));
        assert_eq!(email.from, "NovHawk Billing <billing@novhawk.test>");
    }
}
