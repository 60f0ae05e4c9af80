use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub mod invoices;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new().nest("/api/invoices", invoices::create_invoice_router())
}
