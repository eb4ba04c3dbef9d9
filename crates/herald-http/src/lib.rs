//! HTTP trigger adapter (axum).
//!
//! Exposes the broadcast operation as `GET|POST /send`. The response only
//! reports whether the broadcast cycle ran; per-recipient outcomes stay in
//! the logs.

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

use herald_core::{broadcast::Broadcaster, Result};

#[derive(Clone)]
pub struct TriggerState {
    pub broadcaster: Arc<Broadcaster>,
    pub eviction_threshold: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendParams {
    /// Missing `msg` broadcasts the empty string.
    #[serde(default)]
    pub msg: String,
}

pub fn trigger_router(state: TriggerState) -> Router {
    Router::new()
        .route("/send", get(send_via_query).post(send_via_form))
        .with_state(state)
}

async fn send_via_query(
    State(state): State<TriggerState>,
    Query(params): Query<SendParams>,
) -> (StatusCode, String) {
    run_broadcast(state, params).await
}

async fn send_via_form(
    State(state): State<TriggerState>,
    Form(params): Form<SendParams>,
) -> (StatusCode, String) {
    run_broadcast(state, params).await
}

async fn run_broadcast(state: TriggerState, params: SendParams) -> (StatusCode, String) {
    match state
        .broadcaster
        .broadcast(&params.msg, state.eviction_threshold)
        .await
    {
        Ok(report) => {
            tracing::info!(
                attempted = report.attempted,
                failed = report.failed.len(),
                evicted = report.evicted.len(),
                "broadcast triggered over http"
            );
            (StatusCode::OK, "Ok".to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "broadcast failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Send error: {e}"))
        }
    }
}

/// Bind `addr` and serve the trigger endpoint until the server exits.
pub async fn serve(addr: &str, state: TriggerState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr, "http trigger listening");
    axum::serve(listener, trigger_router(state)).await?;
    Ok(())
}
