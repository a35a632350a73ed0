//! Domain events
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::OrderId;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: OrderId, total: Decimal, guest: bool },
    StatusChanged { order_id: OrderId, status: OrderStatus, actor: Option<String> },
    LabelPrinted { order_id: OrderId },
    Deleted { order_id: OrderId, restored_items: usize },
}

impl OrderEvent {
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Created { order_id, .. }
            | Self::StatusChanged { order_id, .. }
            | Self::LabelPrinted { order_id }
            | Self::Deleted { order_id, .. } => order_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::StatusChanged { .. } => "status_changed",
            Self::LabelPrinted { .. } => "label_printed",
            Self::Deleted { .. } => "deleted",
        }
    }

    pub fn subject(&self) -> String { format!("orders.{}", self.kind()) }
}
