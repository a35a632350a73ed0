//! Order status state machine
//!
//! ```text
//! Pending -> Processing -> Hand on Courier -> Shipped -> Delivered
//!     \___________\______________\______________\-----> Cancelled
//! ```
//!
//! Every status owns one row of [`TransitionRule`]: the milestone it stamps,
//! the milestones and actors it clears, and the actor it may record. Any
//! status can be entered from any other; the rules only keep the audit fields
//! consistent with the status being entered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::aggregates::order::Order;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    #[serde(rename = "Hand on Courier")]
    HandOnCourier,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending, Self::Processing, Self::HandOnCourier, Self::Shipped, Self::Delivered, Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::HandOnCourier => "Hand on Courier",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    pub fn rule(&self) -> &'static TransitionRule {
        match self {
            Self::Pending => &ENTER_PENDING,
            Self::Processing => &ENTER_PROCESSING,
            Self::HandOnCourier => &ENTER_HAND_ON_COURIER,
            Self::Shipped => &ENTER_SHIPPED,
            Self::Delivered => &ENTER_DELIVERED,
            Self::Cancelled => &ENTER_CANCELLED,
        }
    }

    /// Resolve every field write needed to move an order into `self`.
    ///
    /// A blank actor is treated as absent and leaves the stored actor alone.
    pub fn transition(self, actor: Option<&str>, now: DateTime<Utc>) -> StatusChange {
        let rule = self.rule();
        let actor = actor.map(str::trim).filter(|a| !a.is_empty());
        StatusChange {
            status: self,
            stamped: rule.stamps.map(|m| (m, now)),
            cleared: rule.clears.to_vec(),
            cleared_actors: rule.clears_actors.to_vec(),
            actor: rule.records_actor.zip(actor).map(|(field, name)| (field, name.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus(wanted.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// Timestamped milestone fields on an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Milestone { Processing, HandOnCourier, Shipped, Delivered, Cancelled }

impl Milestone {
    pub const ALL: [Milestone; 5] = [Self::Processing, Self::HandOnCourier, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Processing => "processing_at",
            Self::HandOnCourier => "hand_on_courier_at",
            Self::Shipped => "shipped_at",
            Self::Delivered => "delivered_at",
            Self::Cancelled => "cancelled_at",
        }
    }
}

/// Staff members recorded at hand-off points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorField { ForwardedBy, DeliveredBy }

impl ActorField {
    pub const ALL: [ActorField; 2] = [Self::ForwardedBy, Self::DeliveredBy];

    pub fn column(&self) -> &'static str {
        match self {
            Self::ForwardedBy => "forwarded_by",
            Self::DeliveredBy => "delivered_by",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TransitionRule {
    pub stamps: Option<Milestone>,
    pub clears: &'static [Milestone],
    pub clears_actors: &'static [ActorField],
    pub records_actor: Option<ActorField>,
}

const ENTER_PENDING: TransitionRule = TransitionRule {
    stamps: None,
    clears: &Milestone::ALL,
    clears_actors: &ActorField::ALL,
    records_actor: None,
};

const ENTER_PROCESSING: TransitionRule = TransitionRule {
    stamps: Some(Milestone::Processing),
    clears: &[Milestone::HandOnCourier, Milestone::Shipped, Milestone::Delivered, Milestone::Cancelled],
    clears_actors: &ActorField::ALL,
    records_actor: None,
};

const ENTER_HAND_ON_COURIER: TransitionRule = TransitionRule {
    stamps: Some(Milestone::HandOnCourier),
    clears: &[Milestone::Shipped, Milestone::Delivered, Milestone::Cancelled],
    clears_actors: &[ActorField::DeliveredBy],
    records_actor: Some(ActorField::ForwardedBy),
};

const ENTER_SHIPPED: TransitionRule = TransitionRule {
    stamps: Some(Milestone::Shipped),
    clears: &[Milestone::Delivered, Milestone::Cancelled],
    clears_actors: &[ActorField::DeliveredBy],
    records_actor: None,
};

const ENTER_DELIVERED: TransitionRule = TransitionRule {
    stamps: Some(Milestone::Delivered),
    clears: &[Milestone::Cancelled],
    clears_actors: &[],
    records_actor: Some(ActorField::DeliveredBy),
};

// Terminal: earlier progress stays on record.
const ENTER_CANCELLED: TransitionRule = TransitionRule {
    stamps: Some(Milestone::Cancelled),
    clears: &[],
    clears_actors: &[],
    records_actor: None,
};

/// A single field write produced by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldWrite<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> FieldWrite<T> {
    pub fn is_keep(&self) -> bool { matches!(self, Self::Keep) }

    /// The value to store, `None` meaning null. Only meaningful when not `Keep`.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

/// The complete write set for one status update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub stamped: Option<(Milestone, DateTime<Utc>)>,
    pub cleared: Vec<Milestone>,
    pub cleared_actors: Vec<ActorField>,
    pub actor: Option<(ActorField, String)>,
}

impl StatusChange {
    pub fn milestone_write(&self, milestone: Milestone) -> FieldWrite<DateTime<Utc>> {
        match self.stamped {
            Some((stamped, at)) if stamped == milestone => FieldWrite::Set(at),
            _ if self.cleared.contains(&milestone) => FieldWrite::Clear,
            _ => FieldWrite::Keep,
        }
    }

    pub fn actor_write(&self, field: ActorField) -> FieldWrite<String> {
        match &self.actor {
            Some((recorded, name)) if *recorded == field => FieldWrite::Set(name.clone()),
            _ if self.cleared_actors.contains(&field) => FieldWrite::Clear,
            _ => FieldWrite::Keep,
        }
    }

    pub fn apply_to(&self, order: &mut Order) {
        order.status = self.status;
        for milestone in Milestone::ALL {
            let write = self.milestone_write(milestone);
            if !write.is_keep() { *order.milestones.slot_mut(milestone) = write.into_value(); }
        }
        for field in ActorField::ALL {
            let write = self.actor_write(field);
            if !write.is_keep() { *order.actor_mut(field) = write.into_value(); }
        }
    }
}
