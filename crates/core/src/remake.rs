//! Defect returns and the remake orders they spawn.
//!
//! Every accepted return produces exactly one remake: a copy of the original
//! order covering only the returned colour and size, restarted from the
//! first stage with high priority.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::{OrderDetailRow, ProductionOrder};
use crate::stage::initial_stages;
use crate::types::{DetailRowId, OrderId, OrderStatus, Priority, ReturnId, SizeBreakdown};

/// Suffix appended to the order code of a remake.
pub const REMAKE_SUFFIX: &str = "-BÙ";

/// Prefix of a remake's priority reason.
pub const REMAKE_REASON_PREFIX: &str = "remake for defect: ";

/// A recorded customer return. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLog {
    pub id: ReturnId,
    pub original_order_id: OrderId,
    pub color: String,
    pub size: u8,
    pub quantity: u32,
    pub reason: String,
    pub date: DateTime<Utc>,
}

/// Submitted fields of a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnForm {
    pub original_order_id: OrderId,
    pub color: String,
    pub size: u8,
    pub quantity: u32,
    pub reason: String,
}

impl ReturnForm {
    /// Check the form and stamp it into a log entry.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank colour or reason, or a zero quantity.
    pub fn into_log(self, now: DateTime<Utc>) -> Result<ReturnLog, DomainError> {
        if self.color.trim().is_empty() {
            return Err(DomainError::MissingField("color"));
        }
        if self.reason.trim().is_empty() {
            return Err(DomainError::MissingField("reason"));
        }
        if self.quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(ReturnLog {
            id: ReturnId::generate(),
            original_order_id: self.original_order_id,
            color: self.color,
            size: self.size,
            quantity: self.quantity,
            reason: self.reason,
            date: now,
        })
    }
}

/// Derive the remake order for `ret` from `original`.
///
/// The original is not modified. A remake restarts as an active order with
/// an empty status log so production can begin immediately. It gets its own
/// detail row id and takes `sort_order` like any new order.
///
/// # Errors
///
/// Returns [`DomainError::InvalidSize`] when the size is outside the order's
/// gender range, and [`DomainError::RemakeColorNotFound`] when no detail row
/// carries the returned colour.
pub fn create_remake(
    original: &ProductionOrder,
    ret: &ReturnLog,
    sort_order: i64,
    now: DateTime<Utc>,
) -> Result<ProductionOrder, DomainError> {
    if !original.gender.has_size(ret.size) {
        return Err(DomainError::InvalidSize {
            size: ret.size,
            gender: original.gender,
        });
    }
    let source = original
        .details
        .iter()
        .find(|row| row.color == ret.color)
        .ok_or_else(|| DomainError::RemakeColorNotFound(ret.color.clone()))?;

    let row = OrderDetailRow {
        id: DetailRowId::generate(),
        sizes: SizeBreakdown::only(original.gender, ret.size, ret.quantity),
        total: ret.quantity,
        ..source.clone()
    };

    Ok(ProductionOrder {
        id: OrderId::generate(),
        order_code: format!("{}{REMAKE_SUFFIX}", original.order_code),
        parent_order_id: Some(original.id),
        total_quantity: ret.quantity,
        priority: Priority::High,
        priority_reason: format!("{REMAKE_REASON_PREFIX}{}", ret.reason),
        stages: initial_stages(),
        details: vec![row],
        status: OrderStatus::Active,
        status_note: String::new(),
        status_history: Vec::new(),
        sort_order,
        created_at: now,
        ..original.clone()
    })
}

/// Returns recorded against `order_id`.
pub fn returns_for_order(
    returns: &[ReturnLog],
    order_id: OrderId,
) -> impl Iterator<Item = &ReturnLog> {
    returns
        .iter()
        .filter(move |r| r.original_order_id == order_id)
}

/// Remakes generated from `order_id`.
pub fn remakes_of(
    orders: &[ProductionOrder],
    order_id: OrderId,
) -> impl Iterator<Item = &ProductionOrder> {
    orders
        .iter()
        .filter(move |o| o.parent_order_id == Some(order_id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use crate::types::{Gender, StageStatus};

    fn sample_return(order: &ProductionOrder, color: &str, size: u8, quantity: u32) -> ReturnLog {
        ReturnForm {
            original_order_id: order.id,
            color: color.into(),
            size,
            quantity,
            reason: "Bong keo".into(),
        }
        .into_log(Utc::now())
        .unwrap()
    }

    fn original() -> ProductionOrder {
        let mut order = sample_order();
        order.details.push(OrderDetailRow::new(
            "Nâu",
            "Lót nâu",
            [(35, 28), (36, 42), (37, 56)].into_iter().collect(),
        )
        .unwrap());
        order.recompute_totals().unwrap();
        for stage in &mut order.stages {
            stage.status = StageStatus::Done;
        }
        order
    }

    #[test]
    fn test_remake_covers_only_returned_size() {
        let order = original();
        let ret = sample_return(&order, "Nâu", 36, 4);
        let now = Utc::now();

        let remake = create_remake(&order, &ret, 9, now).unwrap();

        assert_ne!(remake.id, order.id);
        assert_eq!(remake.order_code, "PO191225-BÙ");
        assert_eq!(remake.parent_order_id, Some(order.id));
        assert_eq!(remake.total_quantity, 4);
        assert_eq!(remake.priority, Priority::High);
        assert_eq!(remake.priority_reason, "remake for defect: Bong keo");
        assert_eq!(remake.created_at, now);
        assert!(remake.stages.iter().all(|s| s.status == StageStatus::Pending));
        assert_eq!(remake.stages.len(), 7);

        assert_eq!(remake.details.len(), 1);
        let row = &remake.details[0];
        assert_eq!(row.color, "Nâu");
        assert_eq!(row.lining, "Lót nâu");
        assert_eq!(row.total, 4);
        assert_eq!(row.sizes.get(36), 4);
        assert_eq!(row.sizes.total().unwrap(), 4);
        assert!(order.details.iter().all(|r| r.id != row.id));
        assert_eq!(remake.sort_order, 9);
        assert_eq!(row.sizes.iter().count(), Gender::Female.size_range().count());
    }

    #[test]
    fn test_remake_leaves_original_untouched() {
        let order = original();
        let before = order.clone();
        let ret = sample_return(&order, "Đen", 37, 2);
        create_remake(&order, &ret, 0, Utc::now()).unwrap();
        assert_eq!(order, before);
    }

    #[test]
    fn test_remake_clones_bom_and_customer() {
        let mut order = original();
        order.bom.sole_code = "BV.049".into();
        let ret = sample_return(&order, "Đen", 37, 2);
        let remake = create_remake(&order, &ret, 0, Utc::now()).unwrap();
        assert_eq!(remake.bom, order.bom);
        assert_eq!(remake.customer_id, order.customer_id);
        assert_eq!(remake.delivery_date, order.delivery_date);
    }

    #[test]
    fn test_remake_of_locked_order_starts_active() {
        let mut order = original();
        order.status = OrderStatus::Completed;
        let ret = sample_return(&order, "Đen", 37, 2);
        let remake = create_remake(&order, &ret, 0, Utc::now()).unwrap();
        assert_eq!(remake.status, OrderStatus::Active);
        assert!(remake.status_history.is_empty());
    }

    #[test]
    fn test_unknown_color_rejected() {
        let order = original();
        let ret = sample_return(&order, "Trắng", 37, 2);
        assert_eq!(
            create_remake(&order, &ret, 0, Utc::now()),
            Err(DomainError::RemakeColorNotFound("Trắng".into()))
        );
    }

    #[test]
    fn test_size_outside_range_rejected() {
        let order = original();
        let ret = sample_return(&order, "Đen", 44, 2);
        assert!(matches!(
            create_remake(&order, &ret, 0, Utc::now()),
            Err(DomainError::InvalidSize { size: 44, .. })
        ));
    }

    #[test]
    fn test_return_form_validation() {
        let order = original();
        let form = ReturnForm {
            original_order_id: order.id,
            color: "Đen".into(),
            size: 37,
            quantity: 0,
            reason: "x".into(),
        };
        assert_eq!(
            form.clone().into_log(Utc::now()),
            Err(DomainError::InvalidQuantity)
        );
        let form = ReturnForm {
            quantity: 1,
            reason: " ".into(),
            ..form
        };
        assert_eq!(
            form.into_log(Utc::now()),
            Err(DomainError::MissingField("reason"))
        );
    }

    #[test]
    fn test_lookup_helpers() {
        let order = original();
        let ret = sample_return(&order, "Đen", 37, 2);
        let remake = create_remake(&order, &ret, 0, Utc::now()).unwrap();
        let orders = vec![order.clone(), remake.clone()];
        let returns = vec![ret];

        assert_eq!(returns_for_order(&returns, order.id).count(), 1);
        assert_eq!(returns_for_order(&returns, remake.id).count(), 0);
        let found: Vec<_> = remakes_of(&orders, order.id).collect();
        assert_eq!(found, vec![&remake]);
    }
}
