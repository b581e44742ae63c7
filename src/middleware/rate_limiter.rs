// Rate limiting for the chat endpoint, which fans out to a paid LLM API

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::types::AppError;

/// Global limiter allowing `per_minute` requests (at least 1).
pub fn chat_rate_limiter(per_minute: u32) -> DefaultDirectRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_minute(per_minute))
}

pub async fn rate_limiter_middleware(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if limiter.check().is_err() {
        warn!(path = %req.uri().path(), "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}
