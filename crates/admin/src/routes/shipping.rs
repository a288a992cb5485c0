//! Shipping note and payment routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use binh_vuong_core::permission::Module;
use binh_vuong_core::report::{DateWindow, ShippingPeriod, filter_shipping_notes};
use binh_vuong_core::shipping::{Payment, PaymentForm, ShippingForm};
use binh_vuong_core::types::{CustomerId, PaymentId, ShippingNoteId};
use binh_vuong_core::{Action, Collection};

use super::{ConfirmQuery, require_view, to_json, today, written};
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::services::FactoryService;
use crate::state::AppState;

/// Build the shipping and payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping", get(list_notes).post(create_note))
        .route("/api/shipping/{id}", put(update_note).delete(delete_note))
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/{id}", delete(delete_payment))
        .route("/api/payments/customer/{id}", get(customer_payments))
}

/// Shipping history filter.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoteQuery {
    pub period: ShippingPeriod,
    pub search: Option<String>,
    /// Bounds for `period=custom`.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Shipping notes within a period.
///
/// # Errors
///
/// Returns 403 without the shipping flag.
pub async fn list_notes(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Value>, AppError> {
    require_view(&actor, Module::Shipping)?;
    let window = query
        .period
        .window(today(), DateWindow::custom(query.start, query.end));
    let factory = state.read().await;
    let notes = filter_shipping_notes(&factory.shipping_notes, window, query.search.as_deref());
    Ok(Json(to_json(&notes)?))
}

/// Create a shipping note for a finished order.
///
/// # Errors
///
/// Returns 400 when the order is unfinished or cancelled.
pub async fn create_note(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(form): Json<ShippingForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::CreateShippingNote { form })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(written(&changes, Collection::ShippingNotes)?),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub form: ShippingForm,
    /// Recorded in the note's edit history.
    pub reason: String,
}

/// Edit a shipping note.
///
/// # Errors
///
/// Returns 400 without a reason.
pub async fn update_note(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<ShippingNoteId>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::UpdateShippingNote {
                id,
                form: body.form,
                reason: body.reason,
            },
        )
        .await?;
    Ok(Json(written(&changes, Collection::ShippingNotes)?))
}

/// Delete a shipping note.
///
/// # Errors
///
/// Returns 400 without `?confirm=true`, 403 without `canDelete`.
pub async fn delete_note(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<ShippingNoteId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    FactoryService::new(&state)
        .execute(
            actor.id,
            Action::DeleteShippingNote {
                id,
                confirmed: confirm.confirm,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every payment, newest first.
///
/// # Errors
///
/// Returns 403 without the shipping flag.
pub async fn list_payments(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>, AppError> {
    require_view(&actor, Module::Shipping)?;
    Ok(Json(state.read().await.payments.clone()))
}

/// Record a customer payment.
///
/// # Errors
///
/// Returns 400 for a non-positive amount or an unknown customer.
pub async fn create_payment(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(form): Json<PaymentForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::RecordPayment { form })
        .await?;
    Ok((StatusCode::CREATED, Json(written(&changes, Collection::Payments)?)))
}

/// Delete a payment.
///
/// # Errors
///
/// Returns 400 without `?confirm=true`, 403 without `canDelete`.
pub async fn delete_payment(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<PaymentId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    FactoryService::new(&state)
        .execute(
            actor.id,
            Action::DeletePayment {
                id,
                confirmed: confirm.confirm,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Payments of one customer.
///
/// # Errors
///
/// Returns 403 without the shipping flag.
pub async fn customer_payments(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<Payment>>, AppError> {
    require_view(&actor, Module::Shipping)?;
    let factory = state.read().await;
    Ok(Json(
        factory
            .payments
            .iter()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect(),
    ))
}
