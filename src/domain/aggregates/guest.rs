//! Guest customer profile

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::order::{CustomerInfo, Order};
use crate::domain::value_objects::normalize_email;

/// Purchase history for shoppers who checked out without an account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GuestCustomer {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub first_order_at: DateTime<Utc>,
    pub last_order_at: DateTime<Utc>,
    pub total_orders: i64,
    pub total_spent: Decimal,
}

/// One guest order folded into a profile.
#[derive(Clone, Debug, PartialEq)]
pub struct GuestOrder {
    pub email: String,
    pub contact: CustomerInfo,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl GuestOrder {
    pub fn from_order(order: &Order) -> Self {
        Self {
            email: normalize_email(&order.customer.email),
            contact: order.customer.clone(),
            total: order.total,
            placed_at: order.created_at,
        }
    }
}

impl GuestCustomer {
    pub fn first(order: &GuestOrder) -> Self {
        let c = &order.contact;
        Self {
            email: order.email.clone(), name: c.name.clone(), phone: c.phone.clone(),
            address: c.address.clone(), city: c.city.clone(), zip: c.zip.clone(),
            first_order_at: order.placed_at, last_order_at: order.placed_at,
            total_orders: 1, total_spent: order.total,
        }
    }

    /// Contact details are last-write-wins; counters accumulate.
    pub fn record(&mut self, order: &GuestOrder) {
        let c = &order.contact;
        self.name = c.name.clone();
        self.phone = c.phone.clone();
        self.address = c.address.clone();
        self.city = c.city.clone();
        self.zip = c.zip.clone();
        self.last_order_at = order.placed_at;
        self.total_orders += 1;
        self.total_spent += order.total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest_order(city: &str, total: i64) -> GuestOrder {
        GuestOrder {
            email: "ada@example.com".into(),
            contact: CustomerInfo { name: "Ada".into(), email: "Ada@Example.com".into(), city: city.into(), ..Default::default() },
            total: Decimal::new(total, 0),
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_accumulates() {
        let first = guest_order("Lagos", 30);
        let mut profile = GuestCustomer::first(&first);
        let second = guest_order("Abuja", 12);
        profile.record(&second);
        assert_eq!(profile.total_orders, 2);
        assert_eq!(profile.total_spent, Decimal::new(42, 0));
        assert_eq!(profile.city, "Abuja");
        assert_eq!(profile.first_order_at, first.placed_at);
        assert_eq!(profile.last_order_at, second.placed_at);
    }
}
