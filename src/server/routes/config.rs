//! Configuration endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::config::Config;
use crate::server::state::AppState;

/// GET /api/config - Effective runtime configuration, read-only.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config.clone())
}
