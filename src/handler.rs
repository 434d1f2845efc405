use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use broadcast_types::BroadcastRequest;

use crate::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequestBody {
    pub uid: String,
}

/// The thin inbound handler: validates the request through
/// `BroadcastRequest::new`, delegates to the orchestrator, and maps its
/// report to the 200/400 status rule.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(body): Json<BroadcastRequestBody>,
) -> impl IntoResponse {
    let request = match BroadcastRequest::new(body.uid) {
        Ok(request) => request,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response();
        }
    };

    let report = state.orchestrator.broadcast(request.uid()).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(report)).into_response()
}
