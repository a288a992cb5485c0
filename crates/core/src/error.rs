//! Domain error type.
//!
//! Every rejected operation returns one of these before any state change.

use crate::permission::Capability;
use crate::types::{Gender, OrderStatus};

/// Errors raised by domain operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was empty or missing.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Stage edits are only accepted on active orders.
    #[error("order is {0}; stages can only be edited on active orders")]
    OrderLocked(OrderStatus),

    /// The actor's role or permission flags do not allow the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(Capability),

    /// Editing a shipping note or changing to a blocking status needs a reason.
    #[error("a reason is required for this change")]
    ReasonRequired,

    /// A destructive operation was requested without confirmation.
    #[error("{0} must be confirmed")]
    ConfirmationRequired(&'static str),

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// A return names a colour that no row of the original order carries.
    #[error("order has no detail row with colour {0:?}")]
    RemakeColorNotFound(String),

    /// A size outside the gender's range was addressed.
    #[error("size {size} is not produced for gender {gender}")]
    InvalidSize {
        /// The rejected size.
        size: u8,
        /// Gender whose range was checked.
        gender: Gender,
    },

    /// A quantity or amount is non-positive where it must be positive, or
    /// too large to total.
    #[error("quantity or amount is out of range")]
    InvalidQuantity,

    /// A reorder request was not a permutation of the reorderable orders.
    #[error("reorder must list every non-cancelled order in scope exactly once")]
    InvalidReorder,

    /// Users may not delete their own account.
    #[error("you cannot delete your own account")]
    CannotDeleteSelf,

    /// Admin accounts cannot be deleted.
    #[error("admin accounts cannot be deleted")]
    CannotDeleteAdmin,

    /// A unique field already exists.
    #[error("{0} already exists")]
    Duplicate(String),

    /// The order is unfinished or cancelled.
    #[error("order is not eligible for shipping: {0}")]
    NotShippable(&'static str),
}

impl DomainError {
    /// A missing record of kind `entity`.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
