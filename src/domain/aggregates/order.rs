//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::status::{ActorField, Milestone, OrderStatus, StatusChange};
use crate::domain::value_objects::OrderId;

/// Customer details captured at checkout. Later profile edits never touch it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "customer name is required"))]
    pub name: String,
    #[validate(email(message = "customer email is invalid"))]
    pub email: String,
    #[serde(default)] pub phone: String,
    #[serde(default)] pub address: String,
    #[serde(default)] pub city: String,
    #[serde(default)] pub zip: String,
}

/// Denormalized snapshot of one purchased product.
///
/// `product_id` and `code` are both optional: legacy orders carry either, and
/// the inventory ledger decides which one to trust.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)] pub product_id: Option<String>,
    #[serde(default)] pub code: Option<String>,
    #[serde(default)] pub name: String,
    #[serde(default)] pub image: Option<String>,
    #[serde(default)] pub price: Decimal,
    #[serde(default)] pub category: Option<String>,
    #[serde(default)] pub quantity: i32,
    #[serde(default)] pub size: Option<String>,
    #[serde(default)] pub color: Option<String>,
}

/// Checkout payload accepted by the lifecycle service.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[validate]
    pub customer: CustomerInfo,
    #[validate(length(min = 1, message = "an order needs at least one line item"))]
    pub items: Vec<LineItem>,
    #[validate(custom = "non_negative")]
    pub total: Decimal,
    #[serde(default)] pub user_id: Option<Uuid>,
}

fn non_negative(total: &Decimal) -> Result<(), ValidationError> {
    if *total < Decimal::ZERO { return Err(ValidationError::new("negative_total")); }
    Ok(())
}

/// Milestone timestamps, one per status that records one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestones {
    pub processing_at: Option<DateTime<Utc>>,
    pub hand_on_courier_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Milestones {
    pub fn get(&self, milestone: Milestone) -> Option<DateTime<Utc>> { *self.slot(milestone) }

    pub fn slot_mut(&mut self, milestone: Milestone) -> &mut Option<DateTime<Utc>> {
        match milestone {
            Milestone::Processing => &mut self.processing_at,
            Milestone::HandOnCourier => &mut self.hand_on_courier_at,
            Milestone::Shipped => &mut self.shipped_at,
            Milestone::Delivered => &mut self.delivered_at,
            Milestone::Cancelled => &mut self.cancelled_at,
        }
    }

    fn slot(&self, milestone: Milestone) -> &Option<DateTime<Utc>> {
        match milestone {
            Milestone::Processing => &self.processing_at,
            Milestone::HandOnCourier => &self.hand_on_courier_at,
            Milestone::Shipped => &self.shipped_at,
            Milestone::Delivered => &self.delivered_at,
            Milestone::Cancelled => &self.cancelled_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<Uuid>,
    pub customer: CustomerInfo,
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub label_printed: bool,
    #[serde(flatten)]
    pub milestones: Milestones,
    pub forwarded_by: Option<String>,
    pub delivered_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A freshly placed order: `Pending`, no milestones, no actors.
    pub fn place(id: OrderId, new: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id, user_id: new.user_id, customer: new.customer, items: new.items, total: new.total,
            status: OrderStatus::Pending, label_printed: false, milestones: Milestones::default(),
            forwarded_by: None, delivered_by: None, created_at: now,
        }
    }

    pub fn is_guest(&self) -> bool { self.user_id.is_none() }

    pub fn actor(&self, field: ActorField) -> Option<&str> {
        match field {
            ActorField::ForwardedBy => self.forwarded_by.as_deref(),
            ActorField::DeliveredBy => self.delivered_by.as_deref(),
        }
    }

    pub fn actor_mut(&mut self, field: ActorField) -> &mut Option<String> {
        match field {
            ActorField::ForwardedBy => &mut self.forwarded_by,
            ActorField::DeliveredBy => &mut self.delivered_by,
        }
    }

    pub fn apply(&mut self, change: &StatusChange) { change.apply_to(self); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout() -> NewOrder {
        NewOrder {
            customer: CustomerInfo { name: "Ada".into(), email: "ada@example.com".into(), ..Default::default() },
            items: vec![LineItem { code: Some("MUG".into()), quantity: 1, price: Decimal::new(1200, 2), ..Default::default() }],
            total: Decimal::new(1200, 2),
            user_id: None,
        }
    }

    #[test]
    fn test_place_order_starts_pending() {
        let order = Order::place(OrderId::from_sequence(1), checkout(), Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.is_guest());
        assert!(!order.label_printed);
        assert_eq!(order.milestones, Milestones::default());
    }

    #[test]
    fn test_checkout_validation() {
        assert!(checkout().validate().is_ok());

        let mut bad = checkout();
        bad.customer.email = "not-an-email".into();
        assert!(bad.validate().is_err());

        let mut empty = checkout();
        empty.items.clear();
        assert!(empty.validate().is_err());

        let mut negative = checkout();
        negative.total = Decimal::new(-1, 0);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_line_items_are_lenient() {
        let item: LineItem = serde_json::from_str(r#"{"productId":"legacy-42","name":"Old mug"}"#).unwrap();
        assert_eq!(item.product_id.as_deref(), Some("legacy-42"));
        assert_eq!(item.quantity, 0);
        assert!(item.code.is_none());
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::place(OrderId::from_sequence(7), checkout(), Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], "F00007");
        assert_eq!(json["status"], "Pending");
        assert!(json["handOnCourierAt"].is_null());
        assert!(json["forwardedBy"].is_null());
    }
}
