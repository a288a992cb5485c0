//! Production order routes.
//!
//! Reads are gated by the orders module flag, writes by the capability
//! checks inside each action.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use binh_vuong_core::order::OrderForm;
use binh_vuong_core::permission::{Capability, Module, can_perform};
use binh_vuong_core::report::{OrderFolder, OrderQuery, list_orders};
use binh_vuong_core::shipping::{ShippingForm, is_shippable};
use binh_vuong_core::stage::Stage;
use binh_vuong_core::types::{DetailRowId, Gender, OrderId, OrderStatus, StageStatus};
use binh_vuong_core::{Action, Collection, DomainError, ledger, remake};

use super::{ConfirmQuery, require_view, to_json, today, written};
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::services::FactoryService;
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list).post(create))
        .route("/api/orders/reorder", post(reorder))
        .route("/api/orders/pending-shipment", get(pending_shipment))
        .route("/api/orders/{id}", put(update).delete(delete))
        .route("/api/orders/{id}/stages/{stage_id}", post(transition_stage))
        .route("/api/orders/{id}/gender", post(change_gender))
        .route("/api/orders/{id}/sizes", post(set_size))
        .route("/api/orders/{id}/status", post(change_status))
        .route("/api/orders/{id}/shipping-draft", get(shipping_draft))
        .route("/api/orders/{id}/remakes", get(remakes))
}

/// List orders of one folder.
///
/// # Errors
///
/// Returns 403 without the orders flag, or for the cancelled folder when
/// the caller is not an admin.
pub async fn list(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Value>, AppError> {
    require_view(&actor, Module::Orders)?;
    if query.folder == OrderFolder::Cancelled && !can_perform(&actor, Capability::ViewCancelledOrders)
    {
        return Err(DomainError::PermissionDenied(Capability::ViewCancelledOrders).into());
    }
    let factory = state.read().await;
    Ok(Json(to_json(&list_orders(&factory.orders, &query, today()))?))
}

/// Create an order.
///
/// # Errors
///
/// Returns 400 for an invalid form, 403 without `canEdit`.
pub async fn create(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(form): Json<OrderForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::CreateOrder { form })
        .await?;
    Ok((StatusCode::CREATED, Json(written(&changes, Collection::Orders)?)))
}

/// Replace an order's editable fields.
///
/// # Errors
///
/// Returns 404 for an unknown order.
pub async fn update(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(form): Json<OrderForm>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::UpdateOrder { id, form })
        .await?;
    Ok(Json(written(&changes, Collection::Orders)?))
}

/// Delete an order.
///
/// # Errors
///
/// Returns 400 without `?confirm=true`, 403 without `canDelete`.
pub async fn delete(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    FactoryService::new(&state)
        .execute(
            actor.id,
            Action::DeleteOrder {
                id,
                confirmed: confirm.confirm,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Every non-cancelled order in scope, in the new display order.
    pub ids: Vec<OrderId>,
}

/// Rewrite `sortOrder` from the list position.
///
/// # Errors
///
/// Returns 400 unless `ids` lists each active order exactly once.
pub async fn reorder(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::ReorderOrders { visible: body.ids })
        .await?;
    Ok(Json(serde_json::json!({ "updated": changes.len() })))
}

#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub status: StageStatus,
}

/// Move one stage to a new status.
///
/// # Errors
///
/// Returns 422 when the order is not active.
pub async fn transition_stage(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path((id, stage)): Path<(OrderId, Stage)>,
    Json(body): Json<StageRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::TransitionStage {
                order_id: id,
                stage,
                status: body.status,
            },
        )
        .await?;
    Ok(Json(written(&changes, Collection::Orders)?))
}

#[derive(Debug, Deserialize)]
pub struct GenderRequest {
    pub gender: Gender,
    /// Switching clears every size quantity.
    #[serde(default)]
    pub confirm: bool,
}

/// Switch the order's gender.
///
/// # Errors
///
/// Returns 400 without confirmation.
pub async fn change_gender(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<GenderRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::ChangeGender {
                order_id: id,
                gender: body.gender,
                confirmed: body.confirm,
            },
        )
        .await?;
    Ok(Json(written(&changes, Collection::Orders)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRequest {
    pub row_id: DetailRowId,
    pub size: u8,
    pub quantity: u32,
}

/// Set one size quantity of one detail row.
///
/// # Errors
///
/// Returns 400 for a size outside the gender's range.
pub async fn set_size(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<SizeRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::SetSizeQuantity {
                order_id: id,
                row_id: body.row_id,
                size: body.size,
                quantity: body.quantity,
            },
        )
        .await?;
    Ok(Json(written(&changes, Collection::Orders)?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: String,
}

/// Change the order status.
///
/// # Errors
///
/// Returns 400 when a blocking status is given without a reason.
pub async fn change_status(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::ChangeOrderStatus {
                order_id: id,
                status: body.status,
                reason: body.reason,
            },
        )
        .await?;
    Ok(Json(written(&changes, Collection::Orders)?))
}

/// Finished orders that have no shipping note yet.
///
/// # Errors
///
/// Returns 403 without the shipping flag.
pub async fn pending_shipment(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    require_view(&actor, Module::Shipping)?;
    let factory = state.read().await;
    let pending: Vec<_> =
        ledger::pending_shipment(&factory.orders, &factory.shipping_notes).collect();
    Ok(Json(to_json(&pending)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DraftQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

/// A shipping note draft for a finished order.
///
/// # Errors
///
/// Returns 400 when the order cannot ship yet.
pub async fn shipping_draft(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Query(query): Query<DraftQuery>,
) -> Result<Json<ShippingForm>, AppError> {
    require_view(&actor, Module::Shipping)?;
    let factory = state.read().await;
    let order = factory
        .order(id)
        .ok_or_else(|| DomainError::not_found("order", id))?;
    if !is_shippable(order) {
        return Err(DomainError::NotShippable("production is not finished").into());
    }
    Ok(Json(ShippingForm::draft(
        order,
        query.date.unwrap_or_else(today),
    )))
}

/// Remake orders spawned from returns against this order.
///
/// # Errors
///
/// Returns 403 without the orders flag.
pub async fn remakes(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, AppError> {
    require_view(&actor, Module::Orders)?;
    let factory = state.read().await;
    let remakes: Vec<_> = remake::remakes_of(&factory.orders, id).collect();
    Ok(Json(to_json(&remakes)?))
}
