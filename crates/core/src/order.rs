//! Production orders and their detail rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::stage::{self, ProductionStage};
use crate::types::{
    CustomerId, DetailRowId, Gender, ModelId, OrderId, OrderStatus, Priority, SizeBreakdown,
};

/// Bill-of-materials snapshot for a shoe model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bom {
    /// Dao quai.
    pub knife_code: String,
    pub form_code: String,
    pub sole_code: String,
    pub frame_code: String,
    pub heel: String,
    pub accessory: String,
    pub talong: String,
    pub technical_note: String,
}

/// One colour of an order with its quantity per size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailRow {
    /// Generated when a client submits a row without one.
    #[serde(default = "DetailRowId::generate")]
    pub id: DetailRowId,
    pub color: String,
    #[serde(default)]
    pub lining: String,
    pub sizes: SizeBreakdown,
    /// Always the sum of `sizes`.
    #[serde(default)]
    pub total: u32,
}

impl OrderDetailRow {
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] when the sizes overflow.
    pub fn new(
        color: impl Into<String>,
        lining: impl Into<String>,
        sizes: SizeBreakdown,
    ) -> Result<Self, DomainError> {
        let total = sizes.total()?;
        Ok(Self {
            id: DetailRowId::generate(),
            color: color.into(),
            lining: lining.into(),
            sizes,
            total,
        })
    }

    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] when the sizes overflow.
    pub fn recompute(&mut self) -> Result<(), DomainError> {
        self.total = self.sizes.total()?;
        Ok(())
    }
}

/// One entry of an order's status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub reason: String,
}

/// A manufacturing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrder {
    pub id: OrderId,
    pub order_code: String,
    pub item_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ModelId>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub gender: Gender,
    /// Derived from `details`; never set directly.
    pub total_quantity: u32,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    #[serde(default)]
    pub product_image: String,
    #[serde(default)]
    pub general_note: String,
    #[serde(default)]
    pub bom: Bom,
    pub details: Vec<OrderDetailRow>,
    pub stages: Vec<ProductionStage>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub priority_reason: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub status_note: String,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    /// Set only on remakes generated from a return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_order_id: Option<OrderId>,
}

impl ProductionOrder {
    /// Recompute every row total and then the order total.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] when a sum overflows.
    pub fn recompute_totals(&mut self) -> Result<(), DomainError> {
        for row in &mut self.details {
            row.recompute()?;
        }
        self.total_quantity = self
            .details
            .iter()
            .try_fold(0_u32, |sum, row| sum.checked_add(row.total))
            .ok_or(DomainError::InvalidQuantity)?;
        Ok(())
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        stage::progress(&self.stages)
    }

    #[must_use]
    pub fn is_fully_done(&self) -> bool {
        stage::is_fully_done(&self.stages)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        stage::is_ready_threshold(&self.stages)
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Cancelled)
    }

    /// Delivery is less than a week away and production is unfinished.
    #[must_use]
    pub fn is_urgent(&self, today: NaiveDate) -> bool {
        !self.is_fully_done() && self.delivery_date < today + chrono::Days::new(7)
    }

    /// Delivery date has passed and production is unfinished.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_fully_done() && self.delivery_date < today
    }
}

/// Editable fields of an order, as submitted by the order form.
///
/// Totals, stages, status and ordering are owned by the domain and are not
/// part of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub order_code: String,
    pub item_code: String,
    #[serde(default)]
    pub model_id: Option<ModelId>,
    pub customer_id: Option<CustomerId>,
    pub gender: Gender,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    #[serde(default)]
    pub product_image: String,
    #[serde(default)]
    pub general_note: String,
    #[serde(default)]
    pub bom: Bom,
    #[serde(default)]
    pub details: Vec<OrderDetailRow>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub priority_reason: String,
    /// Reject the form when no product image is attached.
    #[serde(default)]
    pub require_image: bool,
}

impl OrderForm {
    /// Check required fields and return the customer reference.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] for the first empty field.
    pub fn validate(&self) -> Result<CustomerId, DomainError> {
        if self.order_code.trim().is_empty() {
            return Err(DomainError::MissingField("orderCode"));
        }
        if self.item_code.trim().is_empty() {
            return Err(DomainError::MissingField("itemCode"));
        }
        let customer_id = self
            .customer_id
            .ok_or(DomainError::MissingField("customerId"))?;
        if self.details.is_empty() {
            return Err(DomainError::MissingField("details"));
        }
        if self.require_image && self.product_image.trim().is_empty() {
            return Err(DomainError::MissingField("productImage"));
        }
        for row in &self.details {
            for (size, _) in row.sizes.iter() {
                if !self.gender.has_size(size) {
                    return Err(DomainError::InvalidSize {
                        size,
                        gender: self.gender,
                    });
                }
            }
        }
        Ok(customer_id)
    }

    /// Copy every form field onto `order`, recomputing totals.
    pub(crate) fn apply_to(self, order: &mut ProductionOrder) -> Result<(), DomainError> {
        order.order_code = self.order_code;
        order.item_code = self.item_code;
        order.model_id = self.model_id;
        order.gender = self.gender;
        order.order_date = self.order_date;
        order.delivery_date = self.delivery_date;
        order.product_image = self.product_image;
        order.general_note = self.general_note;
        order.bom = self.bom;
        order.details = self.details;
        order.priority = self.priority;
        order.priority_reason = self.priority_reason;
        order.recompute_totals()
    }
}
