//! Product Aggregate (inventory view)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The inventory-relevant slice of a catalog product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub purchased: i64,
}

impl Product {
    pub fn new(code: impl Into<String>, name: impl Into<String>, price: Decimal, stock: i64) -> Self {
        Self { id: Uuid::new_v4(), code: code.into(), name: name.into(), price, stock, purchased: 0 }
    }

    pub fn is_in_stock(&self) -> bool { self.stock > 0 }

    pub fn apply(&mut self, delta: StockDelta) {
        self.stock += delta.stock;
        self.purchased += delta.purchased;
    }
}

/// Which way an order moves inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockDirection {
    /// Order placed: stock goes down, purchased goes up.
    Place,
    /// Order removed: stock comes back, purchased goes down.
    Restore,
}

/// Signed increments applied to `stock` and `purchased` in one atomic write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StockDelta { pub stock: i64, pub purchased: i64 }

impl StockDelta {
    /// `None` for a zero quantity.
    ///
    /// Both directions use the magnitude, so an order carrying a negative
    /// quantity places and restores the same number of units.
    pub fn for_quantity(direction: StockDirection, quantity: i32) -> Option<Self> {
        if quantity == 0 {
            return None;
        }
        let units = i64::from(quantity).abs();
        Some(match direction {
            StockDirection::Place => Self { stock: -units, purchased: units },
            StockDirection::Restore => Self { stock: units, purchased: -units },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_delta() {
        let delta = StockDelta::for_quantity(StockDirection::Place, 3).unwrap();
        assert_eq!(delta, StockDelta { stock: -3, purchased: 3 });
        assert!(StockDelta::for_quantity(StockDirection::Place, 0).is_none());
    }

    #[test]
    fn test_negative_quantity_places_what_it_restores() {
        let placed = StockDelta::for_quantity(StockDirection::Place, -2).unwrap();
        let restored = StockDelta::for_quantity(StockDirection::Restore, -2).unwrap();
        assert_eq!(placed, StockDelta { stock: -2, purchased: 2 });
        assert_eq!(placed.stock + restored.stock, 0);
        assert_eq!(placed.purchased + restored.purchased, 0);
    }

    #[test]
    fn test_restore_uses_magnitude() {
        let delta = StockDelta::for_quantity(StockDirection::Restore, -4).unwrap();
        assert_eq!(delta, StockDelta { stock: 4, purchased: -4 });
        assert!(StockDelta::for_quantity(StockDirection::Restore, 0).is_none());
    }

    #[test]
    fn test_inventory() {
        let mut p = Product::new("MUG", "Mug", Decimal::new(1200, 2), 10);
        p.apply(StockDelta::for_quantity(StockDirection::Place, 10).unwrap());
        assert!(!p.is_in_stock());
        assert_eq!(p.purchased, 10);
    }
}
