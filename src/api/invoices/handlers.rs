use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::api::invoices::error_handling::InvoiceError;
use crate::api::invoices::models::{
    CreateInvoiceRequest, CreateInvoiceResponse, ListInvoicesResponse, SendInvoiceResponse,
};
use crate::state::AppState;

// ============================================================================
// HANDLER FUNCTIONS
// ============================================================================

/// POST /api/invoices
pub async fn create_invoice_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, ResponseJson<CreateInvoiceResponse>), InvoiceError> {
    let invoice = app_state.invoices.create(request).await?;

    Ok((
        StatusCode::CREATED,
        ResponseJson(CreateInvoiceResponse {
            success: true,
            message: format!("Invoice {} created successfully", invoice.id),
            data: invoice,
        }),
    ))
}

/// GET /api/invoices
pub async fn list_invoices_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<ResponseJson<ListInvoicesResponse>, InvoiceError> {
    let invoices = app_state.invoices.list().await?;

    Ok(ResponseJson(ListInvoicesResponse {
        success: true,
        data: invoices,
    }))
}

/// POST /api/invoices/send/:id
pub async fn send_invoice_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ResponseJson<SendInvoiceResponse>, InvoiceError> {
    let id = app_state.invoices.send(&id).await?;

    Ok(ResponseJson(SendInvoiceResponse {
        success: true,
        message: format!("Invoice {} sent successfully", id),
    }))
}

// ============================================================================
// ROUTER CONFIGURATION
// ============================================================================

pub fn create_invoice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_invoice_handler))
        .route("/", get(list_invoices_handler))
        .route("/send/:id", post(send_invoice_handler))
}
