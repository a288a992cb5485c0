//! Shipping notes and customer payments.
//!
//! A shipping note records goods actually sent for one order, priced per
//! detail row. All totals on a note are derived and recomputed on every
//! change.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::{OrderDetailRow, ProductionOrder};
use crate::types::{
    CustomerId, DetailRowId, EditLogId, OrderId, PaymentId, PaymentMethod, ShippingNoteId,
    SizeBreakdown,
};

/// A shipped detail row with its price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetailRow {
    #[serde(default = "DetailRowId::generate")]
    pub id: DetailRowId,
    pub color: String,
    #[serde(default)]
    pub lining: String,
    pub sizes: SizeBreakdown,
    #[serde(default)]
    pub total: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl ShippingDetailRow {
    /// Row total and line amount from sizes and unit price.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] when either value overflows.
    pub fn recompute(&mut self) -> Result<(), DomainError> {
        self.total = self.sizes.total()?;
        self.amount = Decimal::from(self.total)
            .checked_mul(self.unit_price)
            .ok_or(DomainError::InvalidQuantity)?;
        Ok(())
    }
}

impl From<&OrderDetailRow> for ShippingDetailRow {
    fn from(row: &OrderDetailRow) -> Self {
        Self {
            id: row.id,
            color: row.color.clone(),
            lining: row.lining.clone(),
            sizes: row.sizes.clone(),
            total: row.total,
            unit_price: Decimal::ZERO,
            amount: Decimal::ZERO,
        }
    }
}

/// Audit entry written whenever an existing note is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingEditLog {
    pub id: EditLogId,
    pub date: DateTime<Utc>,
    pub reason: String,
    /// Full name of the editing user.
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingNote {
    pub id: ShippingNoteId,
    pub order_id: OrderId,
    pub order_code: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub item_code: String,
    pub shipping_date: NaiveDate,
    #[serde(default)]
    pub product_image: String,
    pub details: Vec<ShippingDetailRow>,
    pub total_quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_amount: Decimal,
    /// `total_amount - deposit_amount`; may be negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Newest first. Entries are never modified once written.
    #[serde(default)]
    pub edit_history: Vec<ShippingEditLog>,
}

impl ShippingNote {
    /// Recompute row amounts, note totals and the balance.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] when any sum overflows.
    pub fn recompute(&mut self) -> Result<(), DomainError> {
        for row in &mut self.details {
            row.recompute()?;
        }
        self.total_quantity = self
            .details
            .iter()
            .try_fold(0_u32, |sum, row| sum.checked_add(row.total))
            .ok_or(DomainError::InvalidQuantity)?;
        self.total_amount = self
            .details
            .iter()
            .try_fold(Decimal::ZERO, |sum, row| sum.checked_add(row.amount))
            .ok_or(DomainError::InvalidQuantity)?;
        self.balance_amount = self
            .total_amount
            .checked_sub(self.deposit_amount)
            .ok_or(DomainError::InvalidQuantity)?;
        Ok(())
    }
}

/// Submitted fields of a shipping note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingForm {
    pub order_id: OrderId,
    pub shipping_date: NaiveDate,
    pub details: Vec<ShippingDetailRow>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub deposit_amount: Decimal,
    #[serde(default)]
    pub deposit_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: String,
}

impl ShippingForm {
    /// A draft for `order`: its detail rows at unit price zero.
    #[must_use]
    pub fn draft(order: &ProductionOrder, shipping_date: NaiveDate) -> Self {
        Self {
            order_id: order.id,
            shipping_date,
            details: order.details.iter().map(ShippingDetailRow::from).collect(),
            deposit_amount: Decimal::ZERO,
            deposit_date: None,
            note: String::new(),
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.details.is_empty() {
            return Err(DomainError::MissingField("details"));
        }
        if self.deposit_amount.is_sign_negative()
            || self.details.iter().any(|row| row.unit_price.is_sign_negative())
        {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(())
    }

    /// Create a note for `order`, copying its display fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotShippable`] when the order is unfinished or
    /// cancelled, [`DomainError::MissingField`] without detail rows, and
    /// [`DomainError::InvalidQuantity`] for negative or overflowing amounts.
    pub fn into_note(
        self,
        order: &ProductionOrder,
        now: DateTime<Utc>,
    ) -> Result<ShippingNote, DomainError> {
        if !is_shippable(order) {
            return Err(DomainError::NotShippable(if order.is_cancelled() {
                "order is cancelled"
            } else {
                "production is not finished"
            }));
        }
        self.validate()?;
        let mut note = ShippingNote {
            id: ShippingNoteId::generate(),
            order_id: order.id,
            order_code: order.order_code.clone(),
            customer_id: order.customer_id,
            customer_name: order.customer_name.clone(),
            item_code: order.item_code.clone(),
            shipping_date: self.shipping_date,
            product_image: order.product_image.clone(),
            details: self.details,
            total_quantity: 0,
            total_amount: Decimal::ZERO,
            deposit_amount: self.deposit_amount,
            balance_amount: Decimal::ZERO,
            deposit_date: self.deposit_date,
            note: self.note,
            created_at: now,
            updated_at: None,
            edit_history: Vec::new(),
        };
        note.recompute()?;
        Ok(note)
    }

    /// Apply this form as an edit of `note`.
    ///
    /// The edit is rejected without a reason. On success one log entry is
    /// prepended; earlier entries are left as they were.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ReasonRequired`] for a blank reason and
    /// [`DomainError::InvalidQuantity`] when the new amounts overflow. `note`
    /// is left untouched on error.
    pub fn apply_edit(
        self,
        note: &mut ShippingNote,
        reason: &str,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::ReasonRequired);
        }
        self.validate()?;
        let mut edited = ShippingNote {
            shipping_date: self.shipping_date,
            details: self.details,
            deposit_amount: self.deposit_amount,
            deposit_date: self.deposit_date,
            note: self.note,
            updated_at: Some(now),
            ..note.clone()
        };
        edited.recompute()?;
        *note = edited;
        note.edit_history.insert(
            0,
            ShippingEditLog {
                id: EditLogId::generate(),
                date: now,
                reason: reason.to_owned(),
                user: user_name.to_owned(),
            },
        );
        Ok(())
    }
}

/// Finished and not cancelled.
#[must_use]
pub fn is_shippable(order: &ProductionOrder) -> bool {
    order.is_fully_done() && !order.is_cancelled()
}

/// A payment received from a customer. Never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    #[serde(default)]
    pub note: String,
    /// Full name of the recording user.
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub note: String,
}

impl PaymentForm {
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] unless the amount is positive.
    pub fn into_payment(self, recorded_by: &str) -> Result<Payment, DomainError> {
        if self.amount <= Decimal::ZERO {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Payment {
            id: PaymentId::generate(),
            customer_id: self.customer_id,
            amount: self.amount,
            date: self.date,
            method: self.method,
            note: self.note,
            created_by: recorded_by.to_owned(),
        })
    }
}
