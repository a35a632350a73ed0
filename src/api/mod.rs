//! REST surface for the order engine.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::domain::aggregates::{GuestCustomer, NewOrder, Order, OrderStatus};
use crate::domain::value_objects::{OrderId, ProductKey};
use crate::services::OrderService;
use crate::store::OrderFilter;
use crate::{EcommerceError, Result};

pub mod error;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-orders"})) }))
        .route("/api/v1/orders", get(list_orders).post(create_order))
        .route("/api/v1/orders/:id", get(get_order).delete(delete_order))
        .route("/api/v1/orders/:id/status", put(update_status))
        .route("/api/v1/orders/:id/label", put(mark_label_printed))
        .route("/api/v1/guests/:email", get(get_guest))
        .route("/api/v1/products/:key/stock", get(product_stock))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

fn order_id(raw: &str) -> Result<OrderId> { OrderId::parse(raw).map_err(|e| EcommerceError::Validation(e.to_string())) }

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
    pub label_printed: Option<bool>,
}

impl TryFrom<ListParams> for OrderFilter {
    type Error = EcommerceError;

    fn try_from(p: ListParams) -> Result<Self> {
        let status = p.status.as_deref().map(str::parse::<OrderStatus>).transpose()
            .map_err(|e| EcommerceError::Validation(e.to_string()))?;
        let defaults = OrderFilter::default();
        Ok(Self {
            status,
            email: p.email,
            user_id: p.user_id,
            label_printed: p.label_printed,
            page: p.page.unwrap_or(defaults.page).max(1),
            per_page: p.per_page.unwrap_or(defaults.per_page).min(OrderFilter::MAX_PER_PAGE),
        })
    }
}

#[derive(Debug, Serialize)] pub struct OrderPage { pub data: Vec<Order>, pub page: u32, pub per_page: u32 }

async fn list_orders(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<OrderPage>> {
    let filter = OrderFilter::try_from(p)?;
    let data = s.orders.list_orders(&filter).await?;
    Ok(Json(OrderPage { data, page: filter.page, per_page: filter.limit() }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder { pub order_id: OrderId }

async fn create_order(State(s): State<AppState>, Json(r): Json<NewOrder>) -> Result<(StatusCode, Json<CreatedOrder>)> {
    let order_id = s.orders.create_order(r).await?;
    Ok((StatusCode::CREATED, Json(CreatedOrder { order_id })))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    Ok(Json(s.orders.get_order(&order_id(&id)?).await?))
}

async fn delete_order(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    s.orders.delete_order(&order_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)] pub struct StatusRequest { pub status: String, pub actor: Option<String> }

async fn update_status(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<StatusRequest>) -> Result<Json<Order>> {
    let id = order_id(&id)?;
    let target = r.status.parse::<OrderStatus>().map_err(|e| EcommerceError::Validation(e.to_string()))?;
    s.orders.update_status(&id, target, r.actor.as_deref()).await?;
    Ok(Json(s.orders.get_order(&id).await?))
}

async fn mark_label_printed(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    s.orders.mark_label_printed(&order_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_guest(State(s): State<AppState>, Path(email): Path<String>) -> Result<Json<GuestCustomer>> {
    s.orders.guest_profile(&email).await?.map(Json).ok_or_else(|| EcommerceError::NotFound(format!("guest {email}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel { pub id: Uuid, pub code: String, pub stock: i64, pub purchased: i64, pub in_stock: bool }

async fn product_stock(State(s): State<AppState>, Path(key): Path<String>) -> Result<Json<StockLevel>> {
    let key = ProductKey::parse(&key);
    let p = s.orders.ledger().product(&key).await?.ok_or_else(|| EcommerceError::NotFound(format!("product {key}")))?;
    Ok(Json(StockLevel { in_stock: p.is_in_stock(), id: p.id, code: p.code, stock: p.stock, purchased: p.purchased }))
}
