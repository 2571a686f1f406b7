use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

use crate::state::AppState;

const WINDOW_SECONDS: u64 = 60;

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(req).await;
    };

    match redis.allow_request(addr.ip(), state.rate_limit_per_minute, WINDOW_SECONDS).await {
        Ok(true) => next.run(req).await,
        Ok(false) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "errorKind": "RateLimited", "detail": "Rate limit exceeded" })),
        )
            .into_response(),
        Err(e) => {
            // Fail open
            warn!("Rate limit check failed for {}: {}", addr.ip(), e);
            next.run(req).await
        }
    }
}
