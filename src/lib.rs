//! OpenSASE Orders
//!
//! Order lifecycle and inventory reconciliation engine for the OpenSASE
//! storefront.
//!
//! ## Features
//! - Sequential human-readable order ids (`F00001`) under concurrent checkout
//! - Best-effort stock and purchased-count reconciliation per line item
//! - Order status state machine with milestone timestamps and hand-off actors
//! - Guest customer profiles keyed by email
//! - Postgres and in-memory storage backends

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod services;
pub mod store;

pub use domain::value_objects::OrderId;
pub use services::OrderService;
pub use store::StoreError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("No free order id within {probes} probes of {start}")]
    IdSpaceExhausted { start: OrderId, probes: u32 },

    #[error("Storage error: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
