//! Product model library routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::Value;

use binh_vuong_core::permission::Module;
use binh_vuong_core::product_model::{ModelForm, ProductModel, search};
use binh_vuong_core::types::ModelId;
use binh_vuong_core::{Action, Collection};

use super::{ConfirmQuery, require_view, written};
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::services::FactoryService;
use crate::state::AppState;

/// Build the models router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(list).post(create))
        .route("/api/models/{id}", put(update).delete(delete))
        .route("/api/models/{id}/archive", post(archive))
        .route("/api/models/{id}/restore", post(restore))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelQuery {
    /// Case-insensitive item code filter.
    pub search: Option<String>,
    /// List archived models instead of live ones.
    pub archived: bool,
}

/// Live or archived models, optionally searched by item code.
///
/// # Errors
///
/// Returns 403 without the models flag.
pub async fn list(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> Result<Json<Vec<ProductModel>>, AppError> {
    require_view(&actor, Module::Models)?;
    let factory = state.read().await;
    let term = query.search.unwrap_or_default();
    Ok(Json(
        search(&factory.models, &term)
            .filter(|m| m.is_archived == query.archived)
            .cloned()
            .collect(),
    ))
}

/// Add a model to the library.
///
/// # Errors
///
/// Returns 400 without an item code, 409 for a duplicate one.
pub async fn create(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Json(form): Json<ModelForm>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::CreateModel { form })
        .await?;
    Ok((StatusCode::CREATED, Json(written(&changes, Collection::Models)?)))
}

/// Update a model, optionally logging a BOM change or issue fix.
///
/// # Errors
///
/// Returns 404 for an unknown model.
pub async fn update(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    Json(form): Json<ModelForm>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::UpdateModel { id, form })
        .await?;
    Ok(Json(written(&changes, Collection::Models)?))
}

/// Permanently delete a model.
///
/// # Errors
///
/// Returns 400 without `?confirm=true`, 403 without `canDelete`.
pub async fn delete(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    FactoryService::new(&state)
        .execute(
            actor.id,
            Action::DeleteModel {
                id,
                confirmed: confirm.confirm,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a model to the archive.
///
/// # Errors
///
/// Returns 404 for an unknown model.
pub async fn archive(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::ArchiveModel { id })
        .await?;
    Ok(Json(written(&changes, Collection::Models)?))
}

/// Bring an archived model back.
///
/// # Errors
///
/// Returns 404 for an unknown model.
pub async fn restore(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> Result<Json<Value>, AppError> {
    let changes = FactoryService::new(&state)
        .execute(actor.id, Action::RestoreModel { id })
        .await?;
    Ok(Json(written(&changes, Collection::Models)?))
}
