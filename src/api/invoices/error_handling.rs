use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::invoices::models::ErrorResponse;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Duplicate invoice id: {id}")]
    DuplicateId { id: String },

    #[error("Invoice not found: {id}")]
    NotFound { id: String },

    #[error("No unused invoice id found after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },

    #[error("Email dispatch failed: {detail}")]
    Dispatch { detail: String },

    #[error("{message}: {detail}")]
    Store { message: String, detail: String },
}

impl InvoiceError {
    pub fn store(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            InvoiceError::Validation { .. } => StatusCode::BAD_REQUEST,
            InvoiceError::DuplicateId { .. } => StatusCode::CONFLICT,
            InvoiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InvoiceError::IdSpaceExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            InvoiceError::Dispatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            InvoiceError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// HTTP RESPONSE CONVERSION
// ============================================================================

impl IntoResponse for InvoiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            InvoiceError::Validation { message } => ErrorResponse {
                success: false,
                message,
                error: None,
            },
            InvoiceError::DuplicateId { id } => {
                tracing::error!("❌ Invoice Save Error: duplicate id {}", id);
                ErrorResponse {
                    success: false,
                    message: "Duplicate invoice ID. Please try again.".to_string(),
                    error: None,
                }
            }
            InvoiceError::NotFound { .. } => ErrorResponse {
                success: false,
                message: "Invoice not found".to_string(),
                error: None,
            },
            InvoiceError::IdSpaceExhausted { attempts } => {
                tracing::error!("❌ Invoice id space exhausted after {} attempts", attempts);
                ErrorResponse {
                    success: false,
                    message: "Failed to create invoice".to_string(),
                    error: Some(format!(
                        "no unused invoice id found after {} attempts",
                        attempts
                    )),
                }
            }
            InvoiceError::Dispatch { detail } => {
                tracing::error!("❌ Email Send Error: {}", detail);
                ErrorResponse {
                    success: false,
                    message: "Failed to send invoice email".to_string(),
                    error: Some(detail),
                }
            }
            InvoiceError::Store { message, detail } => {
                tracing::error!("❌ Store Error: {}", detail);
                ErrorResponse {
                    success: false,
                    message,
                    error: Some(detail),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
