//! HTTP server module for the API and event-stream endpoints.
//!
//! Provides a REST API for the task list and a Server-Sent Events endpoint
//! for real-time updates.

pub mod routes;
pub mod sse;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::hub::{self, HubHandle, HubQueue};
use crate::limiter::RateLimiter;
use crate::server::state::AppState;
use crate::store::SharedTaskStore;

/// Starts the HTTP server on a background thread.
///
/// The hub control loop and the rate-counter sweep run on the server's
/// runtime. Returns the hub handle so the caller can publish out-of-band
/// and shut the hub down on exit.
pub fn start_server(config: Config, tasks: SharedTaskStore) -> HubHandle {
    // The command channel is created here so the handle exists before the
    // server runtime does.
    let (hub, queue) = hub::channel();
    let hub_for_server = hub.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
        rt.block_on(async {
            run_server(config, tasks, hub_for_server, queue).await;
        });
    });

    tracing::info!("HTTP server starting");
    hub
}

/// Runs the axum server.
async fn run_server(config: Config, tasks: SharedTaskStore, hub: HubHandle, queue: HubQueue) {
    tokio::spawn(hub::run(queue, config.subscriber_send_buffer));

    let limiter = Arc::new(RateLimiter::new(config.max_requests, config.window_length()));
    tokio::spawn(sweep_loop(Arc::clone(&limiter), config.window_length()));

    let port = config.port;
    let state = Arc::new(AppState::new(config, hub, limiter, tasks));

    // CORS layer for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Task API
        .route(
            "/api/tasks",
            get(routes::tasks::get_tasks).post(routes::tasks::create_task),
        )
        .route("/api/tasks/:id/toggle", post(routes::tasks::toggle_task))
        .route("/api/tasks/:id", delete(routes::tasks::delete_task))
        // Config API
        .route("/api/config", get(routes::config::get_config))
        // Event stream
        .route("/events", get(sse::sse_handler))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

/// Periodically evicts rate-counter entries whose window has long expired,
/// keeping the table bounded under many-identity load.
async fn sweep_loop(limiter: Arc<RateLimiter>, window: Duration) {
    let mut interval = tokio::time::interval(window.max(Duration::from_secs(1)));
    // The first tick fires immediately; nothing to sweep yet.
    interval.tick().await;

    loop {
        interval.tick().await;
        let removed = limiter.sweep_expired();
        if removed > 0 {
            tracing::debug!(removed, "Swept expired rate-counter entries");
        }
    }
}
