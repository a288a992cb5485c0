//! Receivables report.
//!
//! Logs one line per customer with their balance, then one line per shipping
//! note that is overdue or due within the warning window.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use binh_vuong_core::ledger::{AgingStatus, customer_aging, customer_debt};

use super::open_state;

/// Print every customer's debt and aging.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub async fn report() -> Result<(), Box<dyn std::error::Error>> {
    let state = open_state().await?;
    let factory = state.read().await;
    let now = Utc::now();

    let mut total = Decimal::ZERO;
    for customer in &factory.customers {
        let debt = customer_debt(customer, &factory.shipping_notes, &factory.payments);
        total += debt.display_debt;
        info!(
            customer = %customer.name,
            receivables = %debt.total_receivables,
            paid = %debt.total_paid,
            debt = %debt.display_debt,
            limit = %debt.debt_limit,
            over_limit = debt.is_over_limit,
            "Customer balance"
        );

        for aging in customer_aging(customer, &factory.shipping_notes, now) {
            match aging.status {
                AgingStatus::Safe => {}
                AgingStatus::Warning => info!(
                    customer = %customer.name,
                    order_code = %aging.order_code,
                    due_date = %aging.due_date,
                    days_remaining = aging.days_remaining,
                    balance = %aging.balance_amount,
                    "Note due soon"
                ),
                AgingStatus::Overdue => warn!(
                    customer = %customer.name,
                    order_code = %aging.order_code,
                    due_date = %aging.due_date,
                    days_overdue = -aging.days_remaining,
                    balance = %aging.balance_amount,
                    "Note overdue"
                ),
            }
        }
    }

    info!(customers = factory.customers.len(), total_debt = %total, "Debt report complete");
    Ok(())
}
