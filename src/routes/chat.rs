use axum::{extract::State, middleware, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::catalog::load_or_empty;
use crate::middleware::rate_limiter_middleware;
use crate::models::{AppState, ChatRequest, ChatResponse};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai/chat", post(post_chat))
        .route_layer(middleware::from_fn_with_state(
            state.chat_limiter.clone(),
            rate_limiter_middleware,
        ))
        .with_state(state)
}

/// POST /api/ai/chat - answer a message and attach ranked plan suggestions
pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    request.validate()?;
    info!(message_len = request.message.len(), country = ?request.country, "Received chat request");

    let plans = load_or_empty(state.catalog.as_ref()).await;
    let response = state.assistant.reply(request, plans).await?;

    info!(
        message_id = %response.message_id,
        suggested = response.suggested_plans.len(),
        "Chat response sent"
    );
    Ok(Json(response))
}
