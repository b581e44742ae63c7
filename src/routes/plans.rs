use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::catalog::{filter_by_category, find_by_id, load_or_empty};
use crate::models::{AppState, InsurancePlan, PlanListParams};
use crate::ranker::filter_by_country;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/insurance/plans", get(list_plans))
        .route("/api/insurance/plans/{id}", get(get_plan))
        .with_state(state)
}

/// GET /api/insurance/plans?category=&country= - catalog in file order
async fn list_plans(
    State(state): State<AppState>,
    Query(params): Query<PlanListParams>,
) -> Json<Vec<InsurancePlan>> {
    let plans = load_or_empty(state.catalog.as_ref()).await;
    let plans = filter_by_category(plans, params.category);
    Json(filter_by_country(plans, params.country.as_deref()))
}

/// GET /api/insurance/plans/{id}
async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<InsurancePlan>> {
    let plans = state.catalog.load_plans().await?;
    Ok(Json(find_by_id(plans, &id)?))
}
