//! Inventory ledger: best-effort stock adjustment per order line item.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::aggregates::{LineItem, Product, StockDelta, StockDirection};
use crate::domain::value_objects::{OrderId, ProductKey};
use crate::store::{ProductStore, StoreError};

/// Why a line item left inventory untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No id or code to look the product up by.
    MissingReference,
    /// Zero quantity.
    InvalidQuantity(i32),
    /// Every lookup path came back empty; presumed legacy or deleted product.
    ProductNotFound,
}

#[derive(Debug)]
pub enum AdjustmentOutcome {
    Applied { product_id: Uuid, key: ProductKey, delta: StockDelta },
    Skipped(SkipReason),
    Failed(StoreError),
}

impl AdjustmentOutcome {
    pub fn is_applied(&self) -> bool { matches!(self, Self::Applied { .. }) }
}

/// Per-item outcomes for one order, in line-item order.
#[derive(Debug, Default)]
pub struct AdjustmentReport {
    pub outcomes: Vec<AdjustmentOutcome>,
}

impl AdjustmentReport {
    pub fn applied(&self) -> usize { self.outcomes.iter().filter(|o| o.is_applied()).count() }
    pub fn skipped(&self) -> usize { self.outcomes.iter().filter(|o| matches!(o, AdjustmentOutcome::Skipped(_))).count() }
    pub fn failed(&self) -> usize { self.outcomes.iter().filter(|o| matches!(o, AdjustmentOutcome::Failed(_))).count() }
    pub fn is_clean(&self) -> bool { self.applied() == self.outcomes.len() }
}

/// Lookup keys for a line item, most trusted first: a well-formed product
/// id, then the item's code, then the raw id read as a code.
pub fn resolution_keys(item: &LineItem) -> Vec<ProductKey> {
    let id = item.product_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let code = item.code.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut keys = Vec::with_capacity(2);
    let parsed = id.map(ProductKey::parse);
    if let Some(key @ ProductKey::Id(_)) = &parsed { keys.push(key.clone()); }
    if let Some(code) = code { keys.push(ProductKey::Code(code.to_string())); }
    if let Some(legacy @ ProductKey::Code(raw)) = &parsed {
        if code != Some(raw.as_str()) { keys.push(legacy.clone()); }
    }
    keys
}

#[derive(Clone)]
pub struct InventoryLedger {
    products: Arc<dyn ProductStore>,
}

impl InventoryLedger {
    pub fn new(products: Arc<dyn ProductStore>) -> Self { Self { products } }

    pub async fn product(&self, key: &ProductKey) -> Result<Option<Product>, StoreError> { self.products.get(key).await }

    /// Adjust one line item. Never fails: problems are reported in the outcome.
    pub async fn apply_line_item(&self, item: &LineItem, direction: StockDirection) -> AdjustmentOutcome {
        let Some(delta) = StockDelta::for_quantity(direction, item.quantity) else {
            return AdjustmentOutcome::Skipped(SkipReason::InvalidQuantity(item.quantity));
        };
        let keys = resolution_keys(item);
        if keys.is_empty() {
            return AdjustmentOutcome::Skipped(SkipReason::MissingReference);
        }
        for key in keys {
            match self.products.increment(&key, delta).await {
                Ok(Some(product_id)) => return AdjustmentOutcome::Applied { product_id, key, delta },
                Ok(None) => continue,
                Err(e) => return AdjustmentOutcome::Failed(e),
            }
        }
        AdjustmentOutcome::Skipped(SkipReason::ProductNotFound)
    }

    /// Adjust every item independently. Earlier adjustments are kept even if
    /// later ones fail.
    pub async fn apply_order(&self, order_id: &OrderId, items: &[LineItem], direction: StockDirection) -> AdjustmentReport {
        let mut report = AdjustmentReport { outcomes: Vec::with_capacity(items.len()) };
        for (index, item) in items.iter().enumerate() {
            let outcome = self.apply_line_item(item, direction).await;
            match &outcome {
                AdjustmentOutcome::Applied { product_id, key, delta } => {
                    tracing::debug!(order_id = %order_id, index, %product_id, %key, stock = delta.stock, "Stock adjusted");
                }
                AdjustmentOutcome::Skipped(reason) => {
                    tracing::warn!(
                        order_id = %order_id, index, product_id = ?item.product_id, code = ?item.code,
                        quantity = item.quantity, ?reason, ?direction, "Line item skipped for inventory"
                    );
                }
                AdjustmentOutcome::Failed(error) => {
                    tracing::error!(
                        order_id = %order_id, index, product_id = ?item.product_id, code = ?item.code,
                        %error, ?direction, "Stock adjustment failed"
                    );
                }
            }
            report.outcomes.push(outcome);
        }
        report
    }
}
