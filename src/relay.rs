//! Passthrough proxy routes for the two upstream feeds. No business logic:
//! the upstream payload is returned verbatim, with the identifying
//! User-Agent attached on the way out.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use crate::feeds::{FeedConfig, FeedHttp, ReqwestBlockingFeed};

#[derive(Clone)]
struct RelayState {
    cfg: Arc<FeedConfig>,
}

pub fn relay_router(cfg: FeedConfig) -> Router {
    Router::new()
        .route("/api/official_prices", get(relay_official))
        .route("/api/market_prices", get(relay_market))
        .with_state(RelayState { cfg: Arc::new(cfg) })
}

async fn relay_official(State(state): State<RelayState>) -> Response {
    let url = state.cfg.official_url.clone();
    relay(state.cfg, url).await
}

async fn relay_market(State(state): State<RelayState>) -> Response {
    let url = state.cfg.market_url.clone();
    relay(state.cfg, url).await
}

async fn relay(cfg: Arc<FeedConfig>, url: String) -> Response {
    let outcome = tokio::task::spawn_blocking(move || {
        let http = ReqwestBlockingFeed::new(&cfg)?;
        http.get_json(&url)
    })
    .await;

    match outcome {
        Ok(Ok(payload)) => Json(payload).into_response(),
        Ok(Err(err)) => {
            warn!(component = "relay", event = "relay.upstream.error", error = %err);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
        Err(err) => {
            warn!(component = "relay", event = "relay.task.error", error = %err);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "relay task failed" })),
            )
                .into_response()
        }
    }
}
