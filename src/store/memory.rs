//! In-memory stores with the same semantics as the Postgres backend.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GuestStore, OrderFilter, OrderStore, ProductStore, StoreError, StoreResult};
use crate::domain::aggregates::{GuestCustomer, GuestOrder, Order, Product, StatusChange, StockDelta};
use crate::domain::value_objects::{OrderId, ProductKey};

#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<Uuid, Product>>,
    failing: RwLock<HashSet<Uuid>>,
}

impl MemoryProductStore {
    pub fn new() -> Self { Self::default() }

    pub async fn put(&self, product: Product) { self.products.write().await.insert(product.id, product); }

    pub async fn remove(&self, id: Uuid) { self.products.write().await.remove(&id); }

    /// Make increments on one product fail as if its row were unreachable.
    pub async fn set_fail_increments(&self, id: Uuid, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail { failing.insert(id); } else { failing.remove(&id); }
    }
}

fn find_mut<'a>(products: &'a mut HashMap<Uuid, Product>, key: &ProductKey) -> Option<&'a mut Product> {
    match key {
        ProductKey::Id(id) => products.get_mut(id),
        ProductKey::Code(code) => products.values_mut().find(|p| &p.code == code),
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn get(&self, key: &ProductKey) -> StoreResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(match key {
            ProductKey::Id(id) => products.get(id).cloned(),
            ProductKey::Code(code) => products.values().find(|p| &p.code == code).cloned(),
        })
    }

    async fn increment(&self, key: &ProductKey, delta: StockDelta) -> StoreResult<Option<Uuid>> {
        let failing = self.failing.read().await;
        let mut products = self.products.write().await;
        let Some(product) = find_mut(&mut products, key) else { return Ok(None) };
        if failing.contains(&product.id) {
            return Err(StoreError::Unavailable(format!("product {} is locked", product.id)));
        }
        product.apply(delta);
        Ok(Some(product.id))
    }
}

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    fail_writes: RwLock<bool>,
}

impl MemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    /// Make every subsequent write fail as if the backend were down.
    pub async fn set_fail_writes(&self, fail: bool) { *self.fail_writes.write().await = fail; }

    async fn check_writable(&self) -> StoreResult<()> {
        if *self.fail_writes.read().await {
            return Err(StoreError::Unavailable("order store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn count(&self) -> StoreResult<u64> { Ok(self.orders.read().await.len() as u64) }

    async fn exists(&self, id: &OrderId) -> StoreResult<bool> { Ok(self.orders.read().await.contains_key(id)) }

    async fn insert(&self, order: &Order) -> StoreResult<()> {
        self.check_writable().await?;
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(order.id.to_string()));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> { Ok(self.orders.read().await.get(id).cloned()) }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders.values().filter(|o| filter.matches(o)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(offset).take(filter.limit() as usize).collect())
    }

    async fn update_status(&self, id: &OrderId, change: &StatusChange) -> StoreResult<bool> {
        self.check_writable().await?;
        Ok(self.orders.write().await.get_mut(id).map(|o| o.apply(change)).is_some())
    }

    async fn set_label_printed(&self, id: &OrderId) -> StoreResult<bool> {
        self.check_writable().await?;
        Ok(self.orders.write().await.get_mut(id).map(|o| o.label_printed = true).is_some())
    }

    async fn delete(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        self.check_writable().await?;
        Ok(self.orders.write().await.remove(id))
    }
}

#[derive(Default)]
pub struct MemoryGuestStore {
    guests: RwLock<HashMap<String, GuestCustomer>>,
    fail_writes: RwLock<bool>,
}

impl MemoryGuestStore {
    pub fn new() -> Self { Self::default() }

    pub async fn set_fail_writes(&self, fail: bool) { *self.fail_writes.write().await = fail; }
}

#[async_trait]
impl GuestStore for MemoryGuestStore {
    async fn record_order(&self, order: &GuestOrder) -> StoreResult<GuestCustomer> {
        if *self.fail_writes.read().await {
            return Err(StoreError::Unavailable("guest store is read-only".into()));
        }
        let mut guests = self.guests.write().await;
        let profile = guests
            .entry(order.email.clone())
            .and_modify(|g| g.record(order))
            .or_insert_with(|| GuestCustomer::first(order));
        Ok(profile.clone())
    }

    async fn get(&self, email: &str) -> StoreResult<Option<GuestCustomer>> { Ok(self.guests.read().await.get(email).cloned()) }
}
