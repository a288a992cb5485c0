//! Dashboard and production report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;

use binh_vuong_core::permission::Module;
use binh_vuong_core::report::{
    DashboardSummary, DateWindow, ProductionReport, TimeRange, dashboard, production_report,
};

use super::{require_view, today};
use crate::error::AppError;
use crate::middleware::RequireActor;
use crate::state::AppState;

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(summary))
        .route("/api/reports/production", get(production))
}

/// Dashboard figures as of today.
///
/// # Errors
///
/// Returns 403 without the dashboard flag.
pub async fn summary(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    require_view(&actor, Module::Dashboard)?;
    Ok(Json(dashboard(&*state.read().await, today())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportQuery {
    pub range: TimeRange,
    /// Bounds for `range=custom`; both are needed.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Production figures for orders placed within the range.
///
/// # Errors
///
/// Returns 403 without the dashboard flag.
pub async fn production(
    RequireActor(actor): RequireActor,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ProductionReport>, AppError> {
    require_view(&actor, Module::Dashboard)?;
    let window = query
        .range
        .window(today(), DateWindow::custom(query.start, query.end));
    Ok(Json(production_report(&state.read().await.orders, window)))
}
