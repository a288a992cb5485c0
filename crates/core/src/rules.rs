//! Order mutation rules.
//!
//! Each rule checks the actor and the order first and only then mutates, so
//! a rejected call leaves the order exactly as it was.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::order::{ProductionOrder, StatusChange};
use crate::permission::{Capability, require};
use crate::stage::Stage;
use crate::types::{
    CustomerId, DetailRowId, Gender, OrderId, OrderStatus, SizeBreakdown, StageStatus,
};
use crate::user::User;

/// Move one stage of `order` to `status`.
///
/// # Errors
///
/// Rejects viewers and any order that is not active.
pub fn transition_stage(
    order: &mut ProductionOrder,
    actor: &User,
    stage: Stage,
    status: StageStatus,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    require(actor, Capability::ChangeStageStatus)?;
    if order.status != OrderStatus::Active {
        return Err(DomainError::OrderLocked(order.status));
    }
    let target = order
        .stages
        .iter_mut()
        .find(|s| s.id == stage)
        .ok_or_else(|| DomainError::not_found("stage", stage))?;
    target.transition(status, now);
    Ok(())
}

/// Switch the order to another gender.
///
/// Every row is reset to the new gender's sizes, all zero, so the caller
/// must confirm. Selecting the current gender changes nothing.
///
/// # Errors
///
/// Returns [`DomainError::ConfirmationRequired`] when `confirmed` is false.
pub fn change_gender(
    order: &mut ProductionOrder,
    actor: &User,
    gender: Gender,
    confirmed: bool,
) -> Result<(), DomainError> {
    require(actor, Capability::EditOrder)?;
    if order.gender == gender {
        return Ok(());
    }
    if !confirmed {
        return Err(DomainError::ConfirmationRequired("gender change"));
    }
    order.gender = gender;
    for row in &mut order.details {
        row.sizes = SizeBreakdown::zeroed(gender);
    }
    order.recompute_totals()
}

/// Set one size quantity of one detail row.
///
/// # Errors
///
/// Rejects sizes outside the order's gender range, unknown rows, and
/// quantities whose totals overflow.
pub fn set_size_quantity(
    order: &mut ProductionOrder,
    actor: &User,
    row_id: DetailRowId,
    size: u8,
    quantity: u32,
) -> Result<(), DomainError> {
    require(actor, Capability::EditOrder)?;
    if !order.gender.has_size(size) {
        return Err(DomainError::InvalidSize {
            size,
            gender: order.gender,
        });
    }
    let row = order
        .details
        .iter_mut()
        .find(|r| r.id == row_id)
        .ok_or_else(|| DomainError::not_found("detail row", row_id))?;
    row.sizes.set(size, quantity);
    order.recompute_totals()
}

/// Move `order` to `status`, recording why.
///
/// # Errors
///
/// Returns [`DomainError::ReasonRequired`] when suspending, stopping or
/// cancelling without a reason.
pub fn change_status(
    order: &mut ProductionOrder,
    actor: &User,
    status: OrderStatus,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    require(actor, Capability::ChangeOrderStatus)?;
    let reason = reason.trim();
    if status.requires_reason() && reason.is_empty() {
        return Err(DomainError::ReasonRequired);
    }
    order.status = status;
    reason.clone_into(&mut order.status_note);
    order.status_history.push(StatusChange {
        status,
        date: now,
        reason: reason.to_owned(),
    });
    Ok(())
}

/// Renumber the non-cancelled orders in the order given by `visible`.
///
/// `visible` must list every non-cancelled order exactly once. The result is
/// the renumbered orders followed by the cancelled ones in their previous
/// relative order. Only `sort_order` changes.
///
/// # Errors
///
/// Returns [`DomainError::InvalidReorder`] unless `visible` is a permutation
/// of the non-cancelled ids.
pub fn reorder(
    orders: &[ProductionOrder],
    actor: &User,
    visible: &[OrderId],
) -> Result<Vec<ProductionOrder>, DomainError> {
    require(actor, Capability::ReorderOrders)?;

    let mut expected: Vec<OrderId> = orders
        .iter()
        .filter(|o| !o.is_cancelled())
        .map(|o| o.id)
        .collect();
    let mut given = visible.to_vec();
    expected.sort_unstable();
    given.sort_unstable();
    if expected != given {
        return Err(DomainError::InvalidReorder);
    }

    let mut result = Vec::with_capacity(orders.len());
    for (index, id) in (0_i64..).zip(visible) {
        if let Some(order) = orders.iter().find(|o| o.id == *id) {
            let mut order = order.clone();
            order.sort_order = index;
            result.push(order);
        }
    }
    result.extend(orders.iter().filter(|o| o.is_cancelled()).cloned());
    Ok(result)
}

/// Reorder one customer's non-cancelled orders among themselves.
///
/// The customer's orders keep the set of `sort_order` values they already
/// hold and take them in the order given by `visible`, so their positions
/// relative to other customers' orders do not move. Returns the ids whose
/// `sort_order` changed.
///
/// # Errors
///
/// Returns [`DomainError::InvalidReorder`] unless `visible` is a permutation
/// of the customer's non-cancelled ids.
pub fn reorder_customer(
    orders: &mut [ProductionOrder],
    actor: &User,
    customer_id: CustomerId,
    visible: &[OrderId],
) -> Result<Vec<OrderId>, DomainError> {
    require(actor, Capability::ReorderOrders)?;
    let in_scope = |o: &ProductionOrder| o.customer_id == customer_id && !o.is_cancelled();

    let mut expected: Vec<OrderId> = orders
        .iter()
        .filter(|&o| in_scope(o))
        .map(|o| o.id)
        .collect();
    let mut given = visible.to_vec();
    expected.sort_unstable();
    given.sort_unstable();
    if expected != given {
        return Err(DomainError::InvalidReorder);
    }

    let mut slots: Vec<i64> = orders
        .iter()
        .filter(|&o| in_scope(o))
        .map(|o| o.sort_order)
        .collect();
    slots.sort_unstable();

    let mut changed = Vec::new();
    for (id, slot) in visible.iter().zip(slots) {
        let Some(order) = orders.iter_mut().find(|o| o.id == *id) else {
            continue;
        };
        if order.sort_order != slot {
            order.sort_order = slot;
            changed.push(order.id);
        }
    }
    Ok(changed)
}

/// Check that `actor` may permanently delete a record.
///
/// # Errors
///
/// Requires `canDelete` and an explicit confirmation.
pub fn check_delete(actor: &User, capability: Capability, confirmed: bool) -> Result<(), DomainError> {
    require(actor, capability)?;
    if !confirmed {
        return Err(DomainError::ConfirmationRequired("delete"));
    }
    Ok(())
}
