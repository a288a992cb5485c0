//! Defect return routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};

use binh_vuong_core::permission::Module;
use binh_vuong_core::remake::{ReturnForm, ReturnLog, returns_for_order};
use binh_vuong_core::types::OrderId;
use binh_vuong_core::{Action, Collection};

use super::{require_view, written};
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::services::FactoryService;
use crate::state::AppState;

/// Build the returns router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/returns", get(list).post(create))
        .route("/api/returns/order/{order_id}", get(by_order))
}

/// Every recorded return, newest first.
///
/// # Errors
///
/// Returns 403 without the returns flag.
pub async fn list(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReturnLog>>, AppError> {
    require_view(&actor, Module::Returns)?;
    Ok(Json(state.read().await.returns.clone()))
}

/// Record a return; the response carries the return and its remake order.
///
/// # Errors
///
/// Returns 400 when the colour is not on the original order.
pub async fn create(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(form): Json<ReturnForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::RecordReturn { form })
        .await?;
    let body = json!({
        "return": written(&changes, Collection::Returns)?,
        "remake": written(&changes, Collection::Orders)?,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

/// Returns recorded against one order.
///
/// # Errors
///
/// Returns 403 without the returns flag.
pub async fn by_order(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Vec<ReturnLog>>, AppError> {
    require_view(&actor, Module::Returns)?;
    let factory = state.read().await;
    Ok(Json(
        returns_for_order(&factory.returns, order_id).cloned().collect(),
    ))
}
