//! Status enums for various entities.
//!
//! The serialized string values are part of the REST wire contract and must
//! not change.

use serde::{Deserialize, Serialize};

/// Status of a single production stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

/// Lifecycle status of a production order.
///
/// Only [`OrderStatus::Active`] orders accept stage edits; every other
/// status locks the stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Active,
    Suspended,
    Stopped,
    Cancelled,
    Completed,
}

impl OrderStatus {
    /// Whether moving into this status must be justified with a reason.
    #[must_use]
    pub const fn requires_reason(self) -> bool {
        matches!(self, Self::Suspended | Self::Stopped | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
            Self::Stopped => write!(f, "stopped"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// User role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Full access, including user management and order reordering.
    #[serde(rename = "admin")]
    Admin,
    /// Technical office: orders and BOM models.
    #[serde(rename = "tech")]
    Technical,
    /// Production floor: stage progress, returns, shipping.
    #[serde(rename = "prod")]
    Production,
    /// Read-only access.
    #[serde(rename = "viewer")]
    Viewer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Technical => write!(f, "tech"),
            Self::Production => write!(f, "prod"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "tech" => Ok(Self::Technical),
            "prod" => Ok(Self::Production),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Production priority of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// How a customer payment was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Transfer,
    Cash,
}
