//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Store connectivity check
//!
//! # Users
//! POST   /api/users/login               - Check username and password
//! GET    /api/users                     - List accounts (admin)
//! POST   /api/users                     - Create account (admin)
//! PUT    /api/users/{id}                - Update account (admin)
//! DELETE /api/users/{id}                - Delete account (admin, canDelete)
//!
//! # Orders
//! GET    /api/orders                    - List with folder, filter and search
//! POST   /api/orders                    - Create order
//! PUT    /api/orders/{id}               - Update order
//! DELETE /api/orders/{id}?confirm=true  - Delete order
//! POST   /api/orders/reorder            - Persist drag-and-drop order
//! POST   /api/orders/{id}/stages/{stage} - Move a stage to a new status
//! POST   /api/orders/{id}/gender        - Switch gender (resets sizes)
//! POST   /api/orders/{id}/sizes         - Set one size quantity
//! POST   /api/orders/{id}/status        - Change order status
//! GET    /api/orders/pending-shipment   - Finished orders without a note
//! GET    /api/orders/{id}/shipping-draft - Draft a shipping note
//! GET    /api/orders/{id}/remakes       - Remakes spawned by the order
//!
//! # Returns
//! GET    /api/returns                   - List returns
//! POST   /api/returns                   - Record a return and its remake
//! GET    /api/returns/order/{order_id}  - Returns of one order
//!
//! # Shipping and payments
//! GET    /api/shipping                  - Note history with period and search
//! POST   /api/shipping                  - Create note
//! PUT    /api/shipping/{id}             - Edit note (reason required)
//! DELETE /api/shipping/{id}?confirm=true - Delete note
//! GET    /api/payments                  - List payments
//! POST   /api/payments                  - Record payment
//! DELETE /api/payments/{id}?confirm=true - Delete payment
//! GET    /api/payments/customer/{id}    - Payments of one customer
//!
//! # Master data
//! GET    /api/customers                 - List customers
//! POST   /api/customers                 - Create customer
//! PUT    /api/customers/{id}            - Update customer (renames propagate)
//! GET    /api/customers/{id}/debt       - Balance and aging
//! GET    /api/customers/{id}/orders     - The customer's orders by position
//! POST   /api/customers/{id}/orders/reorder - Reorder within one customer
//! GET    /api/models                    - List or search models
//! POST   /api/models                    - Create model
//! PUT    /api/models/{id}               - Update model
//! DELETE /api/models/{id}?confirm=true  - Delete model
//! POST   /api/models/{id}/archive       - Archive model
//! POST   /api/models/{id}/restore       - Restore model
//!
//! # Reports
//! GET    /api/dashboard                 - Dashboard figures
//! GET    /api/reports/production        - Production report for a range
//! ```
//!
//! Every `/api` route except login needs the `X-User-Id` header.

pub mod customers;
pub mod models;
pub mod orders;
pub mod reports;
pub mod returns;
pub mod shipping;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use binh_vuong_core::permission::{Module, can_view};
use binh_vuong_core::user::User;
use binh_vuong_core::{Change, Collection, Record};

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(orders::router())
        .merge(returns::router())
        .merge(shipping::router())
        .merge(customers::router())
        .merge(models::router())
        .merge(reports::router())
}

/// The complete application: health checks, API routes and tracing layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        user = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.store().ping().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// `?confirm=true` on destructive routes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmQuery {
    pub confirm: bool,
}

/// Calendar date used for urgency, aging and report windows.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reject callers without access to `module`.
pub(crate) fn require_view(user: &User, module: Module) -> Result<(), AppError> {
    if can_view(user, module) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} may not open {module:?}",
            user.username
        )))
    }
}

/// JSON of the first record of `collection` written by a transition.
pub(crate) fn written(changes: &[Change], collection: Collection) -> Result<Value, AppError> {
    changes
        .iter()
        .find_map(|change| match change {
            Change::Create(record) | Change::Update(record)
                if record.collection() == collection =>
            {
                Some(record)
            }
            _ => None,
        })
        .ok_or_else(|| AppError::Internal(format!("no {collection} record was written")))
        .and_then(record_json)
}

fn record_json(record: &Record) -> Result<Value, AppError> {
    record
        .to_json()
        .map_err(|e| AppError::Internal(format!("failed to encode record: {e}")))
}

/// Encode a read-side view.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("failed to encode response: {e}")))
}
