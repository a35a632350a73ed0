//! Order identifier allocation.
//!
//! Proposes `F{count + 1}` and probes upward past ids that are already taken.
//! The probe and the later insert are not atomic; callers retry the whole
//! allocation when the insert reports a conflict.

use std::sync::Arc;

use crate::domain::value_objects::OrderId;
use crate::store::OrderStore;
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct OrderIdAllocator {
    orders: Arc<dyn OrderStore>,
    max_probes: u32,
}

impl OrderIdAllocator {
    pub const DEFAULT_MAX_PROBES: u32 = 10_000;

    pub fn new(orders: Arc<dyn OrderStore>) -> Self { Self { orders, max_probes: Self::DEFAULT_MAX_PROBES } }

    pub fn with_max_probes(mut self, max_probes: u32) -> Self {
        self.max_probes = max_probes.max(1);
        self
    }

    pub async fn next_id(&self) -> Result<OrderId> {
        let start = self.orders.count().await? + 1;
        for seq in (start..).take(self.max_probes as usize) {
            let candidate = OrderId::from_sequence(seq);
            if !self.orders.exists(&candidate).await? {
                if seq != start {
                    tracing::debug!(order_id = %candidate, probes = seq - start, "Skipped taken order ids");
                }
                return Ok(candidate);
            }
        }
        Err(EcommerceError::IdSpaceExhausted { start: OrderId::from_sequence(start), probes: self.max_probes })
    }
}
