//! Postgres backend. Orders are stored document-style: the customer snapshot
//! and line items live as JSONB inside the order row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{GuestStore, OrderFilter, OrderStore, ProductStore, StoreError, StoreResult};
use crate::domain::aggregates::{
    ActorField, CustomerInfo, GuestCustomer, GuestOrder, LineItem, Milestone, Milestones, Order, OrderStatus, Product, StatusChange,
    StockDelta,
};
use crate::domain::value_objects::{OrderId, ProductKey};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: Option<Uuid>,
    customer: Json<CustomerInfo>,
    items: Json<Vec<LineItem>>,
    total: Decimal,
    status: String,
    label_printed: bool,
    processing_at: Option<DateTime<Utc>>,
    hand_on_courier_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    forwarded_by: Option<String>,
    delivered_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt { id: row.id.clone(), reason };
        let id = OrderId::parse(&row.id).map_err(|e| corrupt(e.to_string()))?;
        let status = row.status.parse::<OrderStatus>().map_err(|e| corrupt(e.to_string()))?;
        Ok(Self {
            id,
            user_id: row.user_id,
            customer: row.customer.0,
            items: row.items.0,
            total: row.total,
            status,
            label_printed: row.label_printed,
            milestones: Milestones {
                processing_at: row.processing_at,
                hand_on_courier_at: row.hand_on_courier_at,
                shipped_at: row.shipped_at,
                delivered_at: row.delivered_at,
                cancelled_at: row.cancelled_at,
            },
            forwarded_by: row.forwarded_by,
            delivered_by: row.delivered_by,
            created_at: row.created_at,
        })
    }
}

fn push_product_match(qb: &mut QueryBuilder<'_, Postgres>, key: &ProductKey) {
    match key {
        ProductKey::Id(id) => qb.push(" WHERE id = ").push_bind(*id),
        ProductKey::Code(code) => qb.push(" WHERE code = ").push_bind(code.clone()),
    };
}

#[async_trait]
impl ProductStore for PgStore {
    async fn get(&self, key: &ProductKey) -> StoreResult<Option<Product>> {
        let mut qb = QueryBuilder::new("SELECT id, code, name, price, stock, purchased FROM products");
        push_product_match(&mut qb, key);
        Ok(qb.build_query_as::<Product>().fetch_optional(&self.pool).await?)
    }

    async fn increment(&self, key: &ProductKey, delta: StockDelta) -> StoreResult<Option<Uuid>> {
        let mut qb = QueryBuilder::new("UPDATE products SET stock = stock + ");
        qb.push_bind(delta.stock).push(", purchased = purchased + ").push_bind(delta.purchased).push(", updated_at = NOW()");
        push_product_match(&mut qb, key);
        qb.push(" RETURNING id");
        let row: Option<(Uuid,)> = qb.build_query_as().fetch_optional(&self.pool).await?;
        Ok(row.map(|(id,)| id))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn count(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn exists(&self, id: &OrderId) -> StoreResult<bool> {
        let (found,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
            .bind(id.as_str()).fetch_one(&self.pool).await?;
        Ok(found)
    }

    async fn insert(&self, o: &Order) -> StoreResult<()> {
        sqlx::query("INSERT INTO orders (id, user_id, customer, items, total, status, label_printed, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(o.id.as_str()).bind(o.user_id).bind(Json(&o.customer)).bind(Json(&o.items)).bind(o.total)
            .bind(o.status.as_str()).bind(o.label_printed).bind(o.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_str()).fetch_optional(&self.pool).await?
            .map(Order::try_from).transpose()
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM orders WHERE TRUE");
        if let Some(status) = filter.status { qb.push(" AND status = ").push_bind(status.as_str()); }
        if let Some(email) = &filter.email {
            qb.push(" AND LOWER(customer->>'email') = ").push_bind(email.trim().to_lowercase());
        }
        if let Some(user_id) = filter.user_id { qb.push(" AND user_id = ").push_bind(user_id); }
        if let Some(printed) = filter.label_printed { qb.push(" AND label_printed = ").push_bind(printed); }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(i64::from(filter.limit()))
            .push(" OFFSET ").push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));
        qb.build_query_as::<OrderRow>().fetch_all(&self.pool).await?
            .into_iter().map(Order::try_from).collect()
    }

    async fn update_status(&self, id: &OrderId, change: &StatusChange) -> StoreResult<bool> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE orders SET status = ");
        qb.push_bind(change.status.as_str());
        for milestone in Milestone::ALL {
            let write = change.milestone_write(milestone);
            if write.is_keep() { continue; }
            qb.push(", ").push(milestone.column()).push(" = ").push_bind(write.into_value());
        }
        for field in ActorField::ALL {
            let write = change.actor_write(field);
            if write.is_keep() { continue; }
            qb.push(", ").push(field.column()).push(" = ").push_bind(write.into_value());
        }
        qb.push(" WHERE id = ").push_bind(id.as_str());
        Ok(qb.build().execute(&self.pool).await?.rows_affected() > 0)
    }

    async fn set_label_printed(&self, id: &OrderId) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE orders SET label_printed = TRUE WHERE id = $1")
            .bind(id.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("DELETE FROM orders WHERE id = $1 RETURNING *")
            .bind(id.as_str()).fetch_optional(&self.pool).await?
            .map(Order::try_from).transpose()
    }
}

#[async_trait]
impl GuestStore for PgStore {
    async fn record_order(&self, g: &GuestOrder) -> StoreResult<GuestCustomer> {
        let c = &g.contact;
        let profile = sqlx::query_as::<_, GuestCustomer>(
            "INSERT INTO guest_customers (email, name, phone, address, city, zip, first_order_at, last_order_at, total_orders, total_spent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7, 1, $8) \
             ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, phone = EXCLUDED.phone, address = EXCLUDED.address, \
             city = EXCLUDED.city, zip = EXCLUDED.zip, last_order_at = EXCLUDED.last_order_at, \
             total_orders = guest_customers.total_orders + 1, total_spent = guest_customers.total_spent + EXCLUDED.total_spent \
             RETURNING *",
        )
        .bind(&g.email).bind(&c.name).bind(&c.phone).bind(&c.address).bind(&c.city).bind(&c.zip)
        .bind(g.placed_at).bind(g.total)
        .fetch_one(&self.pool).await?;
        Ok(profile)
    }

    async fn get(&self, email: &str) -> StoreResult<Option<GuestCustomer>> {
        Ok(sqlx::query_as::<_, GuestCustomer>("SELECT * FROM guest_customers WHERE email = $1")
            .bind(email).fetch_optional(&self.pool).await?)
    }
}
