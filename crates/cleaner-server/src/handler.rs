//! Request handling for the wipe endpoint.
//!
//! Each request walks `authorize -> wipe -> respond`. A rejected key never
//! reaches the engine; a wipe that outlives the configured timeout is
//! dropped, which rolls back whatever transaction it had open.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::Instrument;

use cleaner_core::{DeletionRequest, WipeReport};
use cleaner_engine::{DeletionOutcome, WipeError};
use cleaner_graph::GraphStore;

use crate::error::ErrorBody;
use crate::AppState;

/// `DELETE /test/{key}`
pub async fn wipe_graph<S: GraphStore>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Response {
    handle(&state, DeletionRequest::new(key)).await
}

/// `DELETE /test` and `DELETE /test/`: the key is missing, which the
/// validator treats like any other mismatch.
pub async fn wipe_graph_without_key<S: GraphStore>(State(state): State<AppState<S>>) -> Response {
    handle(&state, DeletionRequest::new(String::new())).await
}

async fn handle<S: GraphStore>(state: &AppState<S>, request: DeletionRequest) -> Response {
    let span = tracing::info_span!("wipe_request", wipe_id = %request.wipe_id);

    let outcome = process(state, &request).instrument(span).await;
    respond(state, outcome)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// Authorize the request and, if allowed, run the wipe to completion.
pub async fn process<S: GraphStore>(
    state: &AppState<S>,
    request: &DeletionRequest,
) -> DeletionOutcome {
    if !state.validator.validate(&request.supplied_key) {
        tracing::warn!(armed = state.validator.is_armed(), "Wipe rejected: key mismatch");
        return DeletionOutcome::Unauthorized;
    }

    let result = match state.timeout {
        Some(limit) => match tokio::time::timeout(limit, state.engine.wipe()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(secs = limit.as_secs(), "Wipe timed out, rolled back");
                Err(WipeError::Timeout {
                    secs: limit.as_secs(),
                })
            }
        },
        None => state.engine.wipe().await,
    };

    DeletionOutcome::from(result)
}

fn respond<S: GraphStore>(state: &AppState<S>, outcome: DeletionOutcome) -> Response {
    match outcome {
        DeletionOutcome::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        DeletionOutcome::Success(counts) => {
            (StatusCode::OK, Json(WipeReport::new(counts, state.engine.mode()))).into_response()
        }
        DeletionOutcome::Failed(err) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::from(&err))).into_response()
        }
    }
}
