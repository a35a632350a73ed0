//! Value Objects for the order engine

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Human-readable order identifier: `F` followed by a zero-padded sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    pub const PREFIX: char = 'F';
    const WIDTH: usize = 5;

    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{}{:0width$}", Self::PREFIX, seq, width = Self::WIDTH).trim().to_string())
    }

    pub fn parse(value: impl AsRef<str>) -> Result<Self, OrderIdError> {
        let value = value.as_ref().trim();
        let digits = value.strip_prefix(Self::PREFIX).ok_or(OrderIdError::MissingPrefix)?;
        if digits.len() < Self::WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderIdError::BadSequence);
        }
        // Extra leading zeros would otherwise name the same order twice.
        let seq = digits.parse().map_err(|_| OrderIdError::BadSequence)?;
        Ok(Self::from_sequence(seq))
    }

    pub fn sequence(&self) -> u64 { self.0[1..].parse().unwrap_or(0) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for OrderId {
    type Error = OrderIdError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self { id.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderIdError { MissingPrefix, BadSequence }
impl std::error::Error for OrderIdError {}
impl fmt::Display for OrderIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "order id must start with '{}'", OrderId::PREFIX),
            Self::BadSequence => write!(f, "order id must end in at least five digits"),
        }
    }
}

/// How a product is addressed in the product store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProductKey {
    Id(Uuid),
    Code(String),
}

impl ProductKey {
    /// Identifiers win when well-formed; anything else is treated as a code.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match Uuid::parse_str(value) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Code(value.to_string()),
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Code(code) => write!(f, "code:{code}"),
        }
    }
}

/// Guest profiles are keyed by a trimmed, lowercased email.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
