//! Server-Sent Events subscriber sessions.
//!
//! Each connection gets its own session: it registers with the hub, renders
//! the current snapshot immediately (so a reconnecting client never waits
//! for the next unrelated change), then re-renders on every change signal.
//! The session ends when the client disconnects or the hub shuts down; a
//! drop guard makes deregistration happen exactly once on every exit path.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};

use crate::hub::{HubHandle, SubscriberId};
use crate::server::state::AppState;
use crate::store::SharedTaskStore;

/// Event name carried on every pushed update.
const EVENT_NAME: &str = "tasks";

/// Reconnect delay hint sent with the priming event.
const RETRY_HINT: Duration = Duration::from_secs(3);

/// Interval for keep-alive comments so idle streams survive proxies.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// GET /events - live task list updates as an SSE stream.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let Some(payloads) = subscriber_stream(state).await else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let events = async_stream::stream! {
        let mut payloads = Box::pin(payloads);
        let mut primed = false;
        while let Some(payload) = payloads.next().await {
            let mut event = Event::default().event(EVENT_NAME).data(payload);
            if !primed {
                event = event.retry(RETRY_HINT);
                primed = true;
            }
            yield Ok::<Event, Infallible>(event);
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

/// Builds the rendered-payload stream for one subscriber session.
///
/// Yields one rendered snapshot up front, then one per received signal, and
/// ends when the hub closes the signal channel. Returns `None` if the hub
/// is no longer accepting registrations. Dropping the stream deregisters
/// the subscription.
pub(crate) async fn subscriber_stream(
    state: Arc<AppState>,
) -> Option<impl Stream<Item = String>> {
    let subscription = state.hub.subscribe().await?;
    let guard = SessionGuard {
        hub: state.hub.clone(),
        id: subscription.id,
    };
    let mut rx = subscription.rx;
    let tasks = Arc::clone(&state.tasks);

    Some(async_stream::stream! {
        let guard = guard;
        tracing::debug!(id = guard.id, "Subscriber session streaming");

        // Priming: deliver the current snapshot before any signal arrives.
        if let Some(payload) = render_snapshot(&tasks) {
            yield payload;
        }

        while rx.recv().await.is_some() {
            match render_snapshot(&tasks) {
                Some(payload) => yield payload,
                // A failed fetch or render never kills a live connection;
                // wait for the next signal.
                None => continue,
            }
        }

        tracing::debug!(id = guard.id, "Signal channel closed, session ending");
    })
}

/// Deregisters the session when its stream is dropped: client disconnect,
/// failed write, request cancellation, and hub shutdown all land here.
struct SessionGuard {
    hub: HubHandle,
    id: SubscriberId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

/// Renders the current snapshot into the broadcast payload envelope.
fn render_snapshot(tasks: &SharedTaskStore) -> Option<String> {
    let snapshot = match tasks.read() {
        Ok(store) => store.snapshot(),
        Err(_) => {
            tracing::warn!("Task store lock poisoned, skipping render");
            return None;
        }
    };

    let message = serde_json::json!({
        "type": "task_list",
        "data": snapshot,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    match serde_json::to_string(&message) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!(?e, "Failed to render snapshot");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hub;
    use crate::limiter::RateLimiter;
    use crate::server::routes::tasks::{create_task, CreateTask};
    use crate::store::{self, TaskStore};
    use axum::extract::ConnectInfo;
    use axum::Json;
    use std::net::SocketAddr;
    use tokio::time::timeout;

    const RECV_TIMEOUT: Duration = Duration::from_secs(1);

    fn test_state(seed_titles: &[&str]) -> Arc<AppState> {
        let config = Config::default();
        let hub = hub::spawn(config.subscriber_send_buffer);
        let limiter = Arc::new(RateLimiter::new(config.max_requests, config.window_length()));

        let mut tasks = TaskStore::new();
        for title in seed_titles {
            tasks.add_task(*title);
        }

        Arc::new(AppState::new(config, hub, limiter, store::shared(tasks)))
    }

    fn parse_task_count(payload: &str) -> usize {
        let value: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(value["type"], "task_list");
        value["data"]["tasks"].as_array().unwrap().len()
    }

    #[tokio::test]
    async fn test_priming_delivers_snapshot_without_any_publish() {
        let state = test_state(&["alpha", "beta"]);

        let stream = subscriber_stream(Arc::clone(&state)).await.unwrap();
        let mut stream = Box::pin(stream);

        let payload = timeout(RECV_TIMEOUT, stream.next()).await.unwrap().unwrap();
        assert_eq!(parse_task_count(&payload), 2);
        assert!(payload.contains("alpha"));
        assert!(payload.contains("beta"));
    }

    #[tokio::test]
    async fn test_mutation_reaches_all_sessions() {
        let state = test_state(&["one", "two", "three"]);

        let mut first = Box::pin(subscriber_stream(Arc::clone(&state)).await.unwrap());
        let mut second = Box::pin(subscriber_stream(Arc::clone(&state)).await.unwrap());

        // Drain the priming renders.
        let primed = timeout(RECV_TIMEOUT, first.next()).await.unwrap().unwrap();
        assert_eq!(parse_task_count(&primed), 3);
        timeout(RECV_TIMEOUT, second.next()).await.unwrap().unwrap();

        // Mutate through the ingress path.
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let response = create_task(
            State(Arc::clone(&state)),
            ConnectInfo(addr),
            Json(CreateTask {
                title: "four".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Both sessions observe a render reflecting the fourth task.
        for stream in [&mut first, &mut second] {
            let payload = timeout(RECV_TIMEOUT, stream.next()).await.unwrap().unwrap();
            assert_eq!(parse_task_count(&payload), 4);
            assert!(payload.contains("four"));
        }
    }

    #[tokio::test]
    async fn test_hub_shutdown_ends_stream() {
        let state = test_state(&["only"]);

        let mut stream = Box::pin(subscriber_stream(Arc::clone(&state)).await.unwrap());
        timeout(RECV_TIMEOUT, stream.next()).await.unwrap().unwrap();

        state.hub.shutdown();
        let end = timeout(RECV_TIMEOUT, stream.next()).await.unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_dropped_stream_deregisters() {
        let state = test_state(&[]);

        let stream = subscriber_stream(Arc::clone(&state)).await.unwrap();
        {
            let mut stream = Box::pin(stream);
            timeout(RECV_TIMEOUT, stream.next()).await.unwrap().unwrap();
            assert_eq!(state.hub.subscriber_count().await, 1);
        }

        // The guard fires on drop; the unsubscribe command is ordered
        // before the count query.
        assert_eq!(state.hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_render_snapshot_envelope() {
        let mut tasks = TaskStore::new();
        tasks.add_task("enveloped");
        let shared = store::shared(tasks);

        let payload = render_snapshot(&shared).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["type"], "task_list");
        assert_eq!(value["data"]["total"], 1);
        assert!(value["timestamp"].is_string());
    }
}
