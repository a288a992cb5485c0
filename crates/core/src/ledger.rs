//! Customer debt and note aging.
//!
//! Debt is the sum of shipping-note balances less the sum of payments. The
//! signed value is kept for arithmetic; only the display value is clamped.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::customer::Customer;
use crate::order::ProductionOrder;
use crate::shipping::{Payment, ShippingNote};
use crate::types::{CustomerId, OrderId, ShippingNoteId};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Days before the due date at which a balance becomes a warning.
pub const WARNING_DAYS: i64 = 3;

/// Outstanding balance of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDebt {
    pub customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_receivables: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    /// Signed; negative means the customer has credit.
    #[serde(with = "rust_decimal::serde::float")]
    pub current_debt: Decimal,
    /// `current_debt` clamped at zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub display_debt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub debt_limit: Decimal,
    pub is_over_limit: bool,
}

/// Sum of stored amounts, pinned at the `Decimal` bounds.
pub(crate) fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Aggregate `customer`'s notes and payments.
#[must_use]
pub fn customer_debt(
    customer: &Customer,
    notes: &[ShippingNote],
    payments: &[Payment],
) -> CustomerDebt {
    let total_receivables = saturating_sum(
        notes
            .iter()
            .filter(|n| n.customer_id == customer.id)
            .map(|n| n.balance_amount),
    );
    let total_paid = saturating_sum(
        payments
            .iter()
            .filter(|p| p.customer_id == customer.id)
            .map(|p| p.amount),
    );
    let current_debt = total_receivables.saturating_sub(total_paid);
    CustomerDebt {
        customer_id: customer.id,
        total_receivables,
        total_paid,
        current_debt,
        display_debt: current_debt.max(Decimal::ZERO),
        debt_limit: customer.debt_limit,
        is_over_limit: current_debt > customer.debt_limit,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingStatus {
    Safe,
    Warning,
    Overdue,
}

/// Due-date position of one shipping note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteAging {
    pub note_id: ShippingNoteId,
    pub order_code: String,
    pub shipping_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Whole days until due, rounded up; negative once overdue.
    pub days_remaining: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_amount: Decimal,
    pub status: AgingStatus,
}

/// Classify one note against `debt_days` of credit.
///
/// The due date is midnight UTC of the shipping date plus `debt_days`.
#[must_use]
pub fn note_aging(note: &ShippingNote, debt_days: u32, now: DateTime<Utc>) -> NoteAging {
    let due_date = note
        .shipping_date
        .checked_add_days(Days::new(u64::from(debt_days)))
        .unwrap_or(NaiveDate::MAX);
    let due = due_date.and_time(chrono::NaiveTime::MIN).and_utc();
    let millis = (due - now).num_milliseconds();
    // ceil for positive values; truncation already rounds negatives up
    let mut days_remaining = millis / MILLIS_PER_DAY;
    if millis % MILLIS_PER_DAY > 0 {
        days_remaining += 1;
    }

    let status = if note.balance_amount <= Decimal::ZERO {
        AgingStatus::Safe
    } else if days_remaining < 0 {
        AgingStatus::Overdue
    } else if days_remaining <= WARNING_DAYS {
        AgingStatus::Warning
    } else {
        AgingStatus::Safe
    };

    NoteAging {
        note_id: note.id,
        order_code: note.order_code.clone(),
        shipping_date: note.shipping_date,
        due_date,
        days_remaining,
        balance_amount: note.balance_amount,
        status,
    }
}

/// Aging of every note of `customer`, earliest due date first.
#[must_use]
pub fn customer_aging(
    customer: &Customer,
    notes: &[ShippingNote],
    now: DateTime<Utc>,
) -> Vec<NoteAging> {
    let mut aging: Vec<_> = notes
        .iter()
        .filter(|n| n.customer_id == customer.id)
        .map(|n| note_aging(n, customer.debt_days, now))
        .collect();
    aging.sort_by_key(|a| a.due_date);
    aging
}

/// Whether `order_id` already has a shipping note.
#[must_use]
pub fn has_shipping_note(notes: &[ShippingNote], order_id: OrderId) -> bool {
    notes.iter().any(|n| n.order_id == order_id)
}

/// Finished orders that no shipping note references yet.
///
/// Derived on every call; nothing is stored.
pub fn pending_shipment<'a>(
    orders: &'a [ProductionOrder],
    notes: &'a [ShippingNote],
) -> impl Iterator<Item = &'a ProductionOrder> + 'a {
    orders
        .iter()
        .filter(move |o| o.is_fully_done() && !has_shipping_note(notes, o.id))
}
