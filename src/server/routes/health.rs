//! Health endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::server::state::AppState;

/// Process start reference for uptime reporting. Forced early in `main` so
/// the first health check does not read as uptime zero.
pub static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub subscribers: usize,
    pub uptime_secs: u64,
}

/// GET /health - Liveness plus a couple of cheap gauges.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        subscribers: state.hub.subscriber_count().await,
        uptime_secs: STARTED_AT.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hub;
    use crate::limiter::RateLimiter;
    use crate::store::{self, TaskStore};

    #[tokio::test]
    async fn test_health_reports_subscribers() {
        let config = Config::default();
        let hub = hub::spawn(config.subscriber_send_buffer);
        let limiter = Arc::new(RateLimiter::new(config.max_requests, config.window_length()));
        let state = Arc::new(AppState::new(
            config,
            hub,
            limiter,
            store::shared(TaskStore::new()),
        ));

        let _sub = state.hub.subscribe().await.unwrap();

        let Json(health) = health_check(State(Arc::clone(&state))).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.subscribers, 1);
    }
}
