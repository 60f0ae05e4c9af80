pub mod error_handling;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::create_invoice_router;

// ============================================================================
// TEST SUPPORT - in-memory collaborator fakes
// ============================================================================
