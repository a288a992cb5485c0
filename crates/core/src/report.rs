//! Read-side views: order lists, the dashboard, and production reports.
//!
//! Everything here is derived from a [`FactoryState`] snapshot on each call.

use std::collections::HashMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{pending_shipment, saturating_sum};
use crate::order::ProductionOrder;
use crate::shipping::ShippingNote;
use crate::stage;
use crate::state::FactoryState;

/// Which folder of orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderFolder {
    #[default]
    Active,
    /// Admin only.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionFilter {
    #[default]
    All,
    Pending,
    Completed,
    /// Every order, nearest delivery date first.
    Urgent,
}

/// Order list parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderQuery {
    pub folder: OrderFolder,
    pub filter: CompletionFilter,
    /// Matched against order code, customer name and item code.
    pub search: Option<String>,
}

/// An order with its derived display flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListItem<'a> {
    #[serde(flatten)]
    pub order: &'a ProductionOrder,
    pub progress: u8,
    pub is_ready: bool,
    pub is_urgent: bool,
}

impl<'a> OrderListItem<'a> {
    #[must_use]
    pub fn new(order: &'a ProductionOrder, today: NaiveDate) -> Self {
        Self {
            order,
            progress: order.progress(),
            is_ready: order.is_ready(),
            is_urgent: order.is_urgent(today),
        }
    }
}

fn matches_search(term: &str, fields: &[&str]) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&term))
}

/// Orders of one folder, filtered and sorted for display.
#[must_use]
pub fn list_orders<'a>(
    orders: &'a [ProductionOrder],
    query: &OrderQuery,
    today: NaiveDate,
) -> Vec<OrderListItem<'a>> {
    let mut list: Vec<_> = orders
        .iter()
        .filter(|o| o.is_cancelled() == (query.folder == OrderFolder::Cancelled))
        .filter(|o| match query.filter {
            CompletionFilter::All | CompletionFilter::Urgent => true,
            CompletionFilter::Pending => !o.is_fully_done(),
            CompletionFilter::Completed => o.is_fully_done(),
        })
        .filter(|o| {
            query.search.as_deref().is_none_or(|term| {
                matches_search(term, &[&o.order_code, &o.customer_name, &o.item_code])
            })
        })
        .collect();
    if query.filter == CompletionFilter::Urgent {
        list.sort_by_key(|o| o.delivery_date);
    } else {
        list.sort_by_key(|o| o.sort_order);
    }
    list.into_iter()
        .map(|o| OrderListItem::new(o, today))
        .collect()
}

/// Figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    pub pending_shipping: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_receivables: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_received: Decimal,
    /// Receivables less payments, clamped at zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_debt: Decimal,
    pub return_count: usize,
}

#[must_use]
pub fn dashboard(state: &FactoryState, today: NaiveDate) -> DashboardSummary {
    let total_receivables = saturating_sum(state.shipping_notes.iter().map(|n| n.balance_amount));
    let total_received = saturating_sum(state.payments.iter().map(|p| p.amount));
    DashboardSummary {
        in_progress: state
            .orders
            .iter()
            .filter(|o| stage::is_in_progress(&o.stages))
            .count(),
        completed: state.orders.iter().filter(|o| o.is_fully_done()).count(),
        overdue: state.orders.iter().filter(|o| o.is_overdue(today)).count(),
        pending_shipping: pending_shipment(&state.orders, &state.shipping_notes).count(),
        total_receivables,
        total_received,
        remaining_debt: total_receivables
            .saturating_sub(total_received)
            .max(Decimal::ZERO),
        return_count: state.returns.len(),
    }
}

/// Reporting window relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "yesterday")]
    Yesterday,
    #[serde(rename = "7days")]
    Last7Days,
    #[default]
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "90days")]
    Last90Days,
    #[serde(rename = "lastMonth")]
    LastMonth,
    /// Since the most recent Sunday.
    #[serde(rename = "weekToDate")]
    WeekToDate,
    #[serde(rename = "monthToDate")]
    MonthToDate,
    #[serde(rename = "custom")]
    Custom,
}

/// Inclusive date bounds; `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    const fn since(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Both ends of a custom range, or unbounded when either is missing.
    #[must_use]
    pub const fn custom(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (Some(_), Some(_)) => Self { start, end },
            _ => Self::unbounded(),
        }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl TimeRange {
    /// Window for this range. `custom` is used only by [`TimeRange::Custom`].
    #[must_use]
    pub fn window(self, today: NaiveDate, custom: DateWindow) -> DateWindow {
        match self {
            Self::Today => DateWindow::since(today),
            Self::Yesterday => {
                let yesterday = days_before(today, 1);
                DateWindow {
                    start: Some(yesterday),
                    end: Some(yesterday),
                }
            }
            Self::Last7Days => DateWindow::since(days_before(today, 7)),
            Self::Last30Days => DateWindow::since(days_before(today, 30)),
            Self::Last90Days => DateWindow::since(days_before(today, 90)),
            Self::MonthToDate => DateWindow::since(first_of_month(today)),
            Self::WeekToDate => DateWindow::since(days_before(
                today,
                u64::from(today.weekday().num_days_from_sunday()),
            )),
            Self::LastMonth => {
                let this_month = first_of_month(today);
                let start = this_month
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(this_month);
                DateWindow {
                    start: Some(start),
                    end: Some(days_before(this_month, 1)),
                }
            }
            Self::Custom => custom,
        }
    }
}

/// Quantity produced for one customer or item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityShare {
    pub name: String,
    pub quantity: u64,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionReport {
    pub total_quantity: u64,
    pub producing_quantity: u64,
    pub completed_quantity: u64,
    pub producing_orders: usize,
    pub completed_orders: usize,
    /// Orders at or past the ready threshold but unfinished.
    pub ready_count: usize,
    /// At most five, largest first.
    pub top_customers: Vec<QuantityShare>,
    /// Every item code, largest first.
    pub item_ranking: Vec<QuantityShare>,
}

const TOP_CUSTOMERS: usize = 5;

fn rank<'a>(entries: impl Iterator<Item = (&'a str, u32)>) -> Vec<QuantityShare> {
    let mut totals: HashMap<&str, (u64, usize)> = HashMap::new();
    for (name, qty) in entries {
        let entry = totals.entry(name).or_default();
        entry.0 += u64::from(qty);
        entry.1 += 1;
    }
    let mut ranked: Vec<_> = totals
        .into_iter()
        .map(|(name, (quantity, order_count))| QuantityShare {
            name: name.to_owned(),
            quantity,
            order_count,
        })
        .collect();
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    ranked
}

/// Production figures for non-cancelled orders dated within `window`.
#[must_use]
pub fn production_report(orders: &[ProductionOrder], window: DateWindow) -> ProductionReport {
    let in_window: Vec<_> = orders
        .iter()
        .filter(|o| !o.is_cancelled() && window.contains(o.order_date))
        .collect();

    let mut report = ProductionReport {
        total_quantity: 0,
        producing_quantity: 0,
        completed_quantity: 0,
        producing_orders: 0,
        completed_orders: 0,
        ready_count: 0,
        top_customers: Vec::new(),
        item_ranking: Vec::new(),
    };
    for order in &in_window {
        let qty = u64::from(order.total_quantity);
        report.total_quantity += qty;
        if order.is_ready() {
            report.ready_count += 1;
        }
        if order.is_fully_done() {
            report.completed_quantity += qty;
            report.completed_orders += 1;
        } else {
            report.producing_quantity += qty;
            report.producing_orders += 1;
        }
    }

    let mut customers = rank(
        in_window
            .iter()
            .map(|o| (o.customer_name.as_str(), o.total_quantity)),
    );
    customers.truncate(TOP_CUSTOMERS);
    report.top_customers = customers;
    report.item_ranking = rank(
        in_window
            .iter()
            .map(|o| (o.item_code.as_str(), o.total_quantity)),
    );
    report
}

/// Shipping-history window relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShippingPeriod {
    #[default]
    All,
    Today,
    Yesterday,
    /// Since Monday.
    ThisWeek,
    ThisMonth,
    Custom,
}

impl ShippingPeriod {
    #[must_use]
    pub fn window(self, today: NaiveDate, custom: DateWindow) -> DateWindow {
        match self {
            Self::All => DateWindow::unbounded(),
            Self::Today => TimeRange::Today.window(today, custom),
            Self::Yesterday => TimeRange::Yesterday.window(today, custom),
            Self::ThisWeek => DateWindow::since(days_before(
                today,
                u64::from(today.weekday().num_days_from_monday()),
            )),
            Self::ThisMonth => TimeRange::MonthToDate.window(today, custom),
            Self::Custom => custom,
        }
    }
}

/// Notes shipped within `window` that match `search`.
#[must_use]
pub fn filter_shipping_notes<'a>(
    notes: &'a [ShippingNote],
    window: DateWindow,
    search: Option<&str>,
) -> Vec<&'a ShippingNote> {
    notes
        .iter()
        .filter(|n| window.contains(n.shipping_date))
        .filter(|n| {
            search.is_none_or(|term| {
                matches_search(term, &[&n.order_code, &n.customer_name, &n.item_code])
            })
        })
        .collect()
}
