use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::catalog::{filter_by_category, load_or_empty};
use crate::models::{AppState, RankedPlanView, SearchParams, SearchResponse};
use crate::ranker::filter_by_country;
use crate::types::{AppError, AppResult};

const DEFAULT_LIMIT: usize = 6;
const MAX_LIMIT: usize = 20;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/insurance/search", get(search_plans))
        .with_state(state)
}

/// GET /api/insurance/search?q=&limit=&country=&category=
///
/// Ranks the catalog against free text and returns plans with their scores,
/// most relevant first.
pub async fn search_plans(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("Query parameter 'q' is required".to_string()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let plans = load_or_empty(state.catalog.as_ref()).await;
    let plans = filter_by_category(plans, params.category);
    let plans = filter_by_country(plans, params.country.as_deref());

    let results: Vec<RankedPlanView> = state
        .ranker
        .scored_plans(&query, &plans, limit)
        .into_iter()
        .map(|scored| RankedPlanView {
            plan: scored.plan.clone(),
            score: scored.score,
        })
        .collect();

    info!(query_len = query.len(), candidates = plans.len(), results = results.len(), "Plan search");

    Ok(Json(SearchResponse {
        query,
        total: results.len(),
        results,
    }))
}
