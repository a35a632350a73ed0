//! Storage collaborators consumed by the order engine.
//!
//! Each trait is the minimum surface the engine needs from a document store.
//! Implementations must make [`ProductStore::increment`] a single atomic
//! field-level update and [`OrderStore::insert`] must reject duplicate ids
//! with [`StoreError::Conflict`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{GuestCustomer, GuestOrder, Order, OrderStatus, Product, StatusChange, StockDelta};
use crate::domain::value_objects::{OrderId, ProductKey};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryGuestStore, MemoryOrderStore, MemoryProductStore};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Conflict(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::Conflict(db.message().to_string()),
            _ => Self::Unavailable(e.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, key: &ProductKey) -> StoreResult<Option<Product>>;

    /// Atomically add `delta` to the matching product. Returns the id of the
    /// product that was adjusted, or `None` when nothing matched.
    async fn increment(&self, key: &ProductKey, delta: StockDelta) -> StoreResult<Option<Uuid>>;
}

/// Filter for the back-office order list. Newest orders first.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
    pub label_printed: Option<bool>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self { status: None, email: None, user_id: None, label_printed: None, page: 1, per_page: 20 }
    }
}

impl OrderFilter {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn limit(&self) -> u32 { self.per_page.clamp(1, Self::MAX_PER_PAGE) }
    pub fn offset(&self) -> u64 { u64::from(self.page.max(1) - 1) * u64::from(self.limit()) }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.email.as_deref().map_or(true, |e| order.customer.email.eq_ignore_ascii_case(e.trim()))
            && self.user_id.map_or(true, |u| order.user_id == Some(u))
            && self.label_printed.map_or(true, |l| order.label_printed == l)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn count(&self) -> StoreResult<u64>;
    async fn exists(&self, id: &OrderId) -> StoreResult<bool>;
    async fn insert(&self, order: &Order) -> StoreResult<()>;
    async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>>;
    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    /// Write exactly the fields in `change`. Returns `false` if no such order.
    async fn update_status(&self, id: &OrderId, change: &StatusChange) -> StoreResult<bool>;
    async fn set_label_printed(&self, id: &OrderId) -> StoreResult<bool>;

    /// Remove the order and hand back what was removed.
    async fn delete(&self, id: &OrderId) -> StoreResult<Option<Order>>;
}

#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Insert a profile on first sight of the email, otherwise fold the order in.
    async fn record_order(&self, order: &GuestOrder) -> StoreResult<GuestCustomer>;
    async fn get(&self, email: &str) -> StoreResult<Option<GuestCustomer>>;
}
