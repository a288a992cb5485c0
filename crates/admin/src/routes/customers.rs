//! Customer routes and the receivables view.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use binh_vuong_core::DomainError;
use binh_vuong_core::customer::{Customer, CustomerForm};
use binh_vuong_core::ledger::{CustomerDebt, NoteAging, customer_aging, customer_debt};
use binh_vuong_core::order::ProductionOrder;
use binh_vuong_core::permission::Module;
use binh_vuong_core::types::CustomerId;
use binh_vuong_core::{Action, Collection};

use super::orders::ReorderRequest;
use super::{require_view, written};
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::services::FactoryService;
use crate::state::AppState;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/{id}", put(update))
        .route("/api/customers/{id}/debt", get(debt))
        .route("/api/customers/{id}/orders", get(orders))
        .route("/api/customers/{id}/orders/reorder", post(reorder_orders))
}

/// Every customer, newest first.
///
/// # Errors
///
/// Returns 403 without the customers flag.
pub async fn list(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<Customer>>, AppError> {
    require_view(&actor, Module::Customers)?;
    Ok(Json(state.read().await.customers.clone()))
}

/// Create a customer with default credit terms where none are given.
///
/// # Errors
///
/// Returns 400 without a name.
pub async fn create(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(form): Json<CustomerForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::CreateCustomer { form })
        .await?;
    Ok((StatusCode::CREATED, Json(written(&changes, Collection::Customers)?)))
}

/// Update a customer; a new name is copied onto its orders and notes.
///
/// # Errors
///
/// Returns 404 for an unknown customer.
pub async fn update(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(form): Json<CustomerForm>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::UpdateCustomer { id, form })
        .await?;
    Ok(Json(written(&changes, Collection::Customers)?))
}

/// Balance and per-note aging of one customer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtResponse {
    #[serde(flatten)]
    pub debt: CustomerDebt,
    pub aging: Vec<NoteAging>,
}

/// Receivables of one customer.
///
/// # Errors
///
/// Returns 403 without the customers flag, 404 for an unknown customer.
pub async fn debt(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Json<DebtResponse>, AppError> {
    require_view(&actor, Module::Customers)?;
    let factory = state.read().await;
    let customer = factory
        .customer(id)
        .ok_or_else(|| DomainError::not_found("customer", id))?;
    Ok(Json(DebtResponse {
        debt: customer_debt(customer, &factory.shipping_notes, &factory.payments),
        aging: customer_aging(customer, &factory.shipping_notes, Utc::now()),
    }))
}

/// Non-cancelled orders of one customer in display order.
///
/// # Errors
///
/// Returns 403 without the customers flag, 404 for an unknown customer.
pub async fn orders(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<ProductionOrder>>, AppError> {
    require_view(&actor, Module::Customers)?;
    let factory = state.read().await;
    if factory.customer(id).is_none() {
        return Err(DomainError::not_found("customer", id).into());
    }
    Ok(Json(
        factory.customer_orders(id).into_iter().cloned().collect(),
    ))
}

/// Reorder one customer's orders; other customers keep their positions.
///
/// # Errors
///
/// Returns 403 for non-admins and 400 unless `ids` lists each of the
/// customer's non-cancelled orders once.
pub async fn reorder_orders(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(
            actor.id,
            Action::ReorderCustomerOrders {
                customer_id: id,
                visible: body.ids,
            },
        )
        .await?;
    Ok(Json(serde_json::json!({ "updated": changes.len() })))
}
