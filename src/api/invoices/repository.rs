use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::error;

use crate::api::invoices::models::{Invoice, NewInvoice};

// ============================================================================
// STORE CONTRACT
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    /// The uniqueness constraint on the invoice id rejected the insert. Two
    /// concurrent requests picked the same candidate id before either commit.
    #[error("duplicate invoice id: {id}")]
    DuplicateId { id: String },

    #[error("{0}")]
    Unavailable(String),
}

/// Persistence collaborator holding invoice documents. Injected into the
/// service so tests can substitute an in-memory fake.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Inserts the invoice and returns it with the store-assigned `created_at`.
    /// Fails with `StoreError::DuplicateId` if the id is already taken.
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice, StoreError>;

    /// All invoices, newest first by `created_at`.
    async fn find_all(&self) -> Result<Vec<Invoice>, StoreError>;

    async fn find_one(&self, id: &str) -> Result<Option<Invoice>, StoreError>;
}

// ============================================================================
// POSTGRES IMPLEMENTATION
// ============================================================================

pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_invoice(row: &sqlx::postgres::PgRow) -> Result<Invoice, sqlx::Error> {
    Ok(Invoice {
        id: row.try_get("id")?,
        customer: row.try_get("customer")?,
        email: row.try_get("email")?,
        amount: row.try_get("amount")?,
        status: row.try_get("status")?,
        date: row.try_get::<DateTime<Utc>, _>("date")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn map_store_error(e: sqlx::Error) -> StoreError {
    error!("Invoice store error: {}", e);
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM invoices WHERE id = $1) AS taken")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_store_error)?;

        row.try_get("taken").map_err(map_store_error)
    }

    async fn create(&self, invoice: NewInvoice) -> Result<Invoice, StoreError> {
        let query = r#"
            INSERT INTO invoices (id, customer, email, amount, status, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, customer, email, amount, status, date, created_at
        "#;

        let row = sqlx::query(query)
            .bind(&invoice.id)
            .bind(&invoice.customer)
            .bind(&invoice.email)
            .bind(invoice.amount)
            .bind(&invoice.status)
            .bind(invoice.date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false)
                {
                    StoreError::DuplicateId {
                        id: invoice.id.clone(),
                    }
                } else {
                    map_store_error(e)
                }
            })?;

        row_to_invoice(&row).map_err(map_store_error)
    }

    async fn find_all(&self) -> Result<Vec<Invoice>, StoreError> {
        let query = r#"
            SELECT id, customer, email, amount, status, date, created_at
            FROM invoices
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_store_error)?;

        rows.iter()
            .map(|row| row_to_invoice(row).map_err(map_store_error))
            .collect()
    }

    async fn find_one(&self, id: &str) -> Result<Option<Invoice>, StoreError> {
        let query = r#"
            SELECT id, customer, email, amount, status, date, created_at
            FROM invoices
            WHERE id = $1
        "#;

        match sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_error)?
        {
            Some(row) => Ok(Some(row_to_invoice(&row).map_err(map_store_error)?)),
            None => Ok(None),
        }
    }
}
