//! Task list endpoints: the ingress path for state-changing requests.
//!
//! Every mutation follows the same order: admission check, then the store
//! write completes and releases the lock, then the change signal is
//! published. A session rendering in response to the signal therefore
//! always observes the mutation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::server::state::AppState;
use crate::store::TaskSnapshot;

/// Request body for creating a task.
#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub title: String,
}

/// GET /api/tasks - Current task list snapshot.
pub async fn get_tasks(State(state): State<Arc<AppState>>) -> Json<TaskSnapshot> {
    let snapshot = match state.tasks.read() {
        Ok(store) => store.snapshot(),
        Err(_) => {
            tracing::warn!("Task store lock poisoned, returning empty snapshot");
            TaskSnapshot::default()
        }
    };
    Json(snapshot)
}

/// POST /api/tasks - Create a task. Rate limited per client address.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<CreateTask>,
) -> Response {
    if !state.limiter.check_and_record(&identity(addr)) {
        return rate_limited(&state);
    }

    let title = body.title.trim();
    if title.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": "title must not be empty" })),
        )
            .into_response();
    }

    let task = {
        let Ok(mut store) = state.tasks.write() else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        store.add_task(title)
    };
    state.hub.publish();

    tracing::info!(id = task.id, "Task created");
    (StatusCode::CREATED, Json(task)).into_response()
}

/// POST /api/tasks/:id/toggle - Flip a task between open and completed.
pub async fn toggle_task(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<u64>,
) -> Response {
    if !state.limiter.check_and_record(&identity(addr)) {
        return rate_limited(&state);
    }

    let toggled = {
        let Ok(mut store) = state.tasks.write() else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        store.toggle_task(id)
    };

    match toggled {
        Some(task) => {
            state.hub.publish();
            tracing::info!(id = task.id, done = task.done, "Task toggled");
            Json(task).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// DELETE /api/tasks/:id - Remove a task.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<u64>,
) -> Response {
    if !state.limiter.check_and_record(&identity(addr)) {
        return rate_limited(&state);
    }

    let removed = {
        let Ok(mut store) = state.tasks.write() else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        store.remove_task(id)
    };

    match removed {
        Some(task) => {
            state.hub.publish();
            tracing::info!(id = task.id, "Task removed");
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Rate-limit identity: client IP without the port, so one host shares one
/// budget regardless of how many connections it opens.
fn identity(addr: SocketAddr) -> String {
    addr.ip().to_string()
}

/// 429 with a retry hint equal to the configured window length.
fn rate_limited(state: &AppState) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&state.config.window_secs.to_string()) {
        headers.insert(header::RETRY_AFTER, value);
    }

    (
        StatusCode::TOO_MANY_REQUESTS,
        headers,
        Json(serde_json::json!({ "error": "rate limit exceeded" })),
    )
        .into_response()
}
