//! Order engine services
pub mod allocator;
pub mod inventory;
pub mod notifier;
pub mod orders;

pub use allocator::OrderIdAllocator;
pub use inventory::{AdjustmentOutcome, AdjustmentReport, InventoryLedger, SkipReason};
pub use notifier::{EventPublisher, NatsPublisher, NoopPublisher};
pub use orders::OrderService;
