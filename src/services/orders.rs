//! Order lifecycle service: checkout, status updates, label printing and
//! deletion with inventory rollback.
//!
//! Only the order record is authoritative. Stock adjustments, guest profile
//! bookkeeping and event publishing are attempted, logged, and never fail the
//! operation that triggered them.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::domain::aggregates::{GuestCustomer, GuestOrder, NewOrder, Order, OrderStatus, StatusChange, StockDirection};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{normalize_email, OrderId};
use crate::services::allocator::OrderIdAllocator;
use crate::services::inventory::{AdjustmentReport, InventoryLedger};
use crate::services::notifier::{EventPublisher, NoopPublisher};
use crate::store::{GuestStore, OrderFilter, OrderStore, ProductStore, StoreError};
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    guests: Arc<dyn GuestStore>,
    ledger: InventoryLedger,
    allocator: OrderIdAllocator,
    events: Arc<dyn EventPublisher>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, products: Arc<dyn ProductStore>, guests: Arc<dyn GuestStore>) -> Self {
        Self {
            allocator: OrderIdAllocator::new(orders.clone()),
            ledger: InventoryLedger::new(products),
            orders,
            guests,
            events: Arc::new(NoopPublisher),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_max_probes(mut self, max_probes: u32) -> Self {
        self.allocator = self.allocator.with_max_probes(max_probes);
        self
    }

    pub fn ledger(&self) -> &InventoryLedger { &self.ledger }

    /// Place an order and return its allocated id.
    #[tracing::instrument(skip_all, fields(email = %new.customer.email, items = new.items.len()))]
    pub async fn create_order(&self, new: NewOrder) -> Result<OrderId> {
        new.validate().map_err(|e| EcommerceError::Validation(e.to_string()))?;
        let order = self.insert_with_fresh_id(new).await?;
        tracing::info!(order_id = %order.id, total = %order.total, guest = order.is_guest(), "Order placed");

        let report = self.ledger.apply_order(&order.id, &order.items, StockDirection::Place).await;
        log_report(&order.id, &report, "placed");

        if order.is_guest() {
            if let Err(error) = self.record_guest(&order).await {
                tracing::error!(order_id = %order.id, email = %order.customer.email, %error, "Guest profile update failed");
            }
        }

        self.publish(OrderEvent::Created { order_id: order.id.clone(), total: order.total, guest: order.is_guest() }).await;
        Ok(order.id)
    }

    /// Losing an id race is never fatal: every conflict reallocates. Only an
    /// unavailable store or an exhausted probe window ends the loop.
    async fn insert_with_fresh_id(&self, new: NewOrder) -> Result<Order> {
        let mut attempt: u32 = 0;
        loop {
            let id = self.allocator.next_id().await?;
            let order = Order::place(id, new.clone(), Utc::now());
            match self.orders.insert(&order).await {
                Ok(()) => return Ok(order),
                Err(StoreError::Conflict(_)) => {
                    attempt += 1;
                    tracing::warn!(order_id = %order.id, attempt, "Order id taken concurrently, reallocating");
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn record_guest(&self, order: &Order) -> Result<GuestCustomer> {
        let profile = self.guests.record_order(&GuestOrder::from_order(order)).await?;
        tracing::debug!(email = %profile.email, total_orders = profile.total_orders, "Guest profile updated");
        Ok(profile)
    }

    /// Move an order to `target`, stamping and clearing audit fields.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: &OrderId, target: OrderStatus, actor: Option<&str>) -> Result<StatusChange> {
        let change = target.transition(actor, Utc::now());
        if !self.orders.update_status(id, &change).await? {
            return Err(EcommerceError::OrderNotFound(id.clone()));
        }
        tracing::info!(order_id = %id, status = %target, terminal = target.is_terminal(), "Order status updated");
        let actor = change.actor.as_ref().map(|(_, name)| name.clone());
        self.publish(OrderEvent::StatusChanged { order_id: id.clone(), status: target, actor }).await;
        Ok(change)
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_label_printed(&self, id: &OrderId) -> Result<()> {
        if !self.orders.set_label_printed(id).await? {
            return Err(EcommerceError::OrderNotFound(id.clone()));
        }
        self.publish(OrderEvent::LabelPrinted { order_id: id.clone() }).await;
        Ok(())
    }

    /// Remove an order and give its stock back. Deleting a missing order is a
    /// no-op; the returned report is `None` in that case.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<Option<AdjustmentReport>> {
        let Some(order) = self.orders.delete(id).await? else {
            tracing::debug!(order_id = %id, "Delete of unknown order ignored");
            return Ok(None);
        };
        let report = self.ledger.apply_order(&order.id, &order.items, StockDirection::Restore).await;
        log_report(&order.id, &report, "deleted");
        tracing::info!(order_id = %order.id, restored = report.applied(), "Order deleted");
        self.publish(OrderEvent::Deleted { order_id: order.id.clone(), restored_items: report.applied() }).await;
        Ok(Some(report))
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        self.orders.get(id).await?.ok_or_else(|| EcommerceError::OrderNotFound(id.clone()))
    }

    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> { Ok(self.orders.list(filter).await?) }

    pub async fn guest_profile(&self, email: &str) -> Result<Option<GuestCustomer>> {
        Ok(self.guests.get(&normalize_email(email)).await?)
    }

    async fn publish(&self, event: OrderEvent) {
        if let Err(error) = self.events.publish(&event).await {
            tracing::warn!(order_id = %event.order_id(), kind = event.kind(), %error, "Order event not published");
        }
    }
}

fn log_report(order_id: &OrderId, report: &AdjustmentReport, action: &str) {
    if report.is_clean() { return; }
    tracing::warn!(
        %order_id, action, applied = report.applied(), skipped = report.skipped(), failed = report.failed(),
        "Inventory only partially reconciled"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::domain::aggregates::{CustomerInfo, LineItem, Product};
    use crate::domain::value_objects::ProductKey;
    use crate::services::notifier::tests::RecordingPublisher;
    use crate::store::{MemoryGuestStore, MemoryOrderStore, MemoryProductStore, StoreResult};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    struct Harness {
        service: OrderService,
        orders: Arc<MemoryOrderStore>,
        products: Arc<MemoryProductStore>,
        guests: Arc<MemoryGuestStore>,
        events: Arc<RecordingPublisher>,
    }

    fn harness() -> Harness {
        let orders = Arc::new(MemoryOrderStore::new());
        let products = Arc::new(MemoryProductStore::new());
        let guests = Arc::new(MemoryGuestStore::new());
        let events = Arc::new(RecordingPublisher::default());
        let service = OrderService::new(orders.clone(), products.clone(), guests.clone()).with_events(events.clone());
        Harness { service, orders, products, guests, events }
    }

    /// Order store where a rival checkout claims the proposed id just before
    /// each of the first `collisions` inserts lands.
    struct CollidingOrderStore {
        inner: MemoryOrderStore,
        collisions: AtomicU32,
    }

    impl CollidingOrderStore {
        fn new(collisions: u32) -> Self { Self { inner: MemoryOrderStore::new(), collisions: AtomicU32::new(collisions) } }
    }

    #[async_trait::async_trait]
    impl OrderStore for CollidingOrderStore {
        async fn count(&self) -> StoreResult<u64> { self.inner.count().await }
        async fn exists(&self, id: &OrderId) -> StoreResult<bool> { self.inner.exists(id).await }

        async fn insert(&self, order: &Order) -> StoreResult<()> {
            let lost = self.collisions.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
            if lost {
                let mut rival = order.clone();
                rival.customer.email = "rival@example.com".into();
                self.inner.insert(&rival).await?;
            }
            self.inner.insert(order).await
        }

        async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> { self.inner.get(id).await }
        async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> { self.inner.list(filter).await }
        async fn update_status(&self, id: &OrderId, change: &StatusChange) -> StoreResult<bool> { self.inner.update_status(id, change).await }
        async fn set_label_printed(&self, id: &OrderId) -> StoreResult<bool> { self.inner.set_label_printed(id).await }
        async fn delete(&self, id: &OrderId) -> StoreResult<Option<Order>> { self.inner.delete(id).await }
    }

    fn checkout(items: Vec<LineItem>, total: i64, user_id: Option<Uuid>) -> NewOrder {
        NewOrder {
            customer: CustomerInfo { name: "Ada".into(), email: "ada@example.com".into(), ..Default::default() },
            items,
            total: Decimal::new(total, 0),
            user_id,
        }
    }

    fn by_code(code: &str, quantity: i32) -> LineItem {
        LineItem { code: Some(code.into()), quantity, ..Default::default() }
    }

    #[tokio::test]
    async fn test_invalid_checkout_is_rejected_before_writing() {
        let h = harness();
        let err = h.service.create_order(checkout(vec![], 10, None)).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Validation(_)));
        assert_eq!(h.orders.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_registered_user_gets_no_guest_profile() {
        let h = harness();
        h.service.create_order(checkout(vec![by_code("MUG", 1)], 10, Some(Uuid::new_v4()))).await.unwrap();
        assert!(h.service.guest_profile("ada@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_on_create() {
        let h = harness();
        h.orders.set_fail_writes(true).await;
        let err = h.service.create_order(checkout(vec![by_code("MUG", 1)], 10, None)).await.unwrap_err();
        assert!(matches!(err, EcommerceError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_status_update_on_missing_order() {
        let h = harness();
        let err = h.service.update_status(&OrderId::from_sequence(9), OrderStatus::Shipped, None).await.unwrap_err();
        assert!(matches!(err, EcommerceError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_status_update_leaves_inventory_alone() {
        let h = harness();
        let mug = Product::new("MUG", "Mug", Decimal::new(12, 0), 10);
        h.products.put(mug.clone()).await;
        let id = h.service.create_order(checkout(vec![by_code("MUG", 2)], 24, None)).await.unwrap();

        h.service.update_status(&id, OrderStatus::Cancelled, None).await.unwrap();
        h.service.mark_label_printed(&id).await.unwrap();
        h.service.mark_label_printed(&id).await.unwrap();

        let stock = h.products.get(&ProductKey::Id(mug.id)).await.unwrap().unwrap().stock;
        assert_eq!(stock, 8);
        let order = h.service.get_order(&id).await.unwrap();
        assert!(order.label_printed);
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_events_follow_the_lifecycle() {
        let h = harness();
        let id = h.service.create_order(checkout(vec![by_code("MUG", 1)], 5, None)).await.unwrap();
        h.service.update_status(&id, OrderStatus::HandOnCourier, Some("Alice")).await.unwrap();
        h.service.delete_order(&id).await.unwrap();

        let kinds: Vec<_> = h.events.events.lock().await.iter().map(OrderEvent::kind).collect();
        assert_eq!(kinds, vec!["created", "status_changed", "deleted"]);
    }

    #[tokio::test]
    async fn test_delete_reports_rollback() {
        let h = harness();
        h.products.put(Product::new("MUG", "Mug", Decimal::new(12, 0), 4)).await;
        let items = vec![by_code("MUG", 1), by_code("GONE", 1)];
        let id = h.service.create_order(checkout(items, 24, None)).await.unwrap();

        let report = h.service.delete_order(&id).await.unwrap().unwrap();
        assert_eq!(report.applied(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(h.service.delete_order(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lost_id_races_reallocate_until_insert_succeeds() {
        let orders = Arc::new(CollidingOrderStore::new(6));
        let products = Arc::new(MemoryProductStore::new());
        let mug = Product::new("MUG", "Mug", Decimal::new(12, 0), 10);
        products.put(mug.clone()).await;
        let service = OrderService::new(orders.clone(), products.clone(), Arc::new(MemoryGuestStore::new()));

        let id = service.create_order(checkout(vec![by_code("MUG", 1)], 12, None)).await.unwrap();

        assert_eq!(id, OrderId::from_sequence(7));
        assert_eq!(orders.count().await.unwrap(), 7);
        assert_eq!(service.get_order(&id).await.unwrap().customer.email, "ada@example.com");
        assert_eq!(products.get(&ProductKey::Id(mug.id)).await.unwrap().unwrap().stock, 9);
    }

    #[tokio::test]
    async fn test_stock_failure_on_one_item_does_not_block_checkout() {
        let h = harness();
        let mug = Product::new("MUG", "Mug", Decimal::new(12, 0), 10);
        let cup = Product::new("CUP", "Cup", Decimal::new(8, 0), 10);
        h.products.put(mug.clone()).await;
        h.products.put(cup.clone()).await;
        h.products.set_fail_increments(mug.id, true).await;

        let id = h.service.create_order(checkout(vec![by_code("MUG", 2), by_code("CUP", 3)], 48, None)).await.unwrap();

        assert_eq!(h.service.get_order(&id).await.unwrap().items.len(), 2);
        let mug = h.products.get(&ProductKey::Id(mug.id)).await.unwrap().unwrap();
        let cup = h.products.get(&ProductKey::Id(cup.id)).await.unwrap().unwrap();
        assert_eq!((mug.stock, mug.purchased), (10, 0));
        assert_eq!((cup.stock, cup.purchased), (7, 3));
    }

    #[tokio::test]
    async fn test_guest_store_outage_does_not_fail_checkout() {
        let h = harness();
        h.guests.set_fail_writes(true).await;
        let mug = Product::new("MUG", "Mug", Decimal::new(12, 0), 10);
        h.products.put(mug.clone()).await;

        let id = h.service.create_order(checkout(vec![by_code("MUG", 1)], 12, None)).await.unwrap();

        assert!(h.service.get_order(&id).await.is_ok());
        assert!(h.service.guest_profile("ada@example.com").await.unwrap().is_none());
        assert_eq!(h.products.get(&ProductKey::Id(mug.id)).await.unwrap().unwrap().stock, 9);
        assert_eq!(h.events.events.lock().await.len(), 1);
    }
}
