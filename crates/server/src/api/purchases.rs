//! Purchase API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketrush_core::{DispatcherStatus, OutcomeEnvelope, RequesterId};

use crate::state::AppState;

/// Maximum allowed limit for outcome queries
const MAX_LIMIT: usize = 1000;

/// Default limit for outcome queries
const DEFAULT_LIMIT: usize = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a purchase
#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    pub requester_id: RequesterId,
}

/// Response for an accepted purchase request.
///
/// The allocation decision is made asynchronously; poll `/outcomes`.
#[derive(Debug, Serialize)]
pub struct PurchaseAcceptedResponse {
    pub requester_id: RequesterId,
    pub status: &'static str,
}

/// Query parameters for listing outcomes
#[derive(Debug, Deserialize)]
pub struct ListOutcomesParams {
    /// Maximum number of outcomes to return (most recent)
    pub limit: Option<usize>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Queue a purchase request
pub async fn submit_purchase(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PurchaseBody>,
) -> Result<(StatusCode, Json<PurchaseAcceptedResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state.dispatcher().submit(body.requester_id).await {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(PurchaseAcceptedResponse {
                requester_id: body.requester_id,
                status: "queued",
            }),
        )),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// List the most recent allocation outcomes, oldest first
pub async fn list_outcomes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListOutcomesParams>,
) -> Json<Vec<OutcomeEnvelope>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Json(state.outcomes().recent(limit))
}

/// Get dispatcher status
pub async fn get_dispatcher_status(State(state): State<Arc<AppState>>) -> Json<DispatcherStatus> {
    Json(state.dispatcher().status())
}
