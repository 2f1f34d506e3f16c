//! Ticket pool API handlers.

use axum::{extract::State, Json};
use std::sync::Arc;
use ticketrush_core::{PoolSnapshot, Ticket};

use crate::state::AppState;

/// Get pool counters
pub async fn get_pool(State(state): State<Arc<AppState>>) -> Json<PoolSnapshot> {
    Json(state.store().snapshot())
}

/// List every ticket with its sold status
pub async fn list_tickets(State(state): State<Arc<AppState>>) -> Json<Vec<Ticket>> {
    Json(state.store().tickets())
}
