//! Aggregates module
pub mod guest;
pub mod order;
pub mod product;
pub mod status;

pub use guest::{GuestCustomer, GuestOrder};
pub use order::{CustomerInfo, LineItem, Milestones, NewOrder, Order};
pub use product::{Product, StockDelta, StockDirection};
pub use status::{ActorField, FieldWrite, Milestone, OrderStatus, StatusChange, TransitionRule, UnknownStatus};
