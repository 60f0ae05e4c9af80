use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// INVOICE ENTITY
// ============================================================================

/// A stored invoice. Immutable once created; `created_at` is assigned by the
/// store at insertion and only used for newest-first ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub customer: String,
    pub email: String,
    pub amount: f64,
    pub status: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Invoice data assembled by the service, before the store stamps `created_at`.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub id: String,
    pub customer: String,
    pub email: String,
    pub amount: f64,
    pub status: String,
    pub date: DateTime<Utc>,
}

// ============================================================================
// REQUEST/RESPONSE MODELS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceResponse {
    pub success: bool,
    pub message: String,
    pub data: Invoice,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListInvoicesResponse {
    pub success: bool,
    pub data: Vec<Invoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendInvoiceResponse {
    pub success: bool,
    pub message: String,
}

/// Error envelope shared by every failure path. `error` carries the underlying
/// detail string and is omitted for validation/not-found/duplicate cases.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// AMOUNT COERCION
// ============================================================================

/// Accepts `amount` either as a JSON number or as a numeric string
/// (`"250"` -> 250.0). Anything unparseable is treated as absent so the
/// required-field validation rejects it.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
