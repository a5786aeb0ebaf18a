//! Shared application state for the HTTP server.

use std::sync::Arc;

use crate::config::Config;
use crate::hub::HubHandle;
use crate::limiter::RateLimiter;
use crate::store::SharedTaskStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Effective runtime configuration.
    pub config: Config,

    /// Handle to the broadcast hub control loop.
    pub hub: HubHandle,

    /// Admission control for state-changing requests.
    pub limiter: Arc<RateLimiter>,

    /// The task list the hub's signals refer to.
    pub tasks: SharedTaskStore,
}

impl AppState {
    /// Creates new app state from the wired-up components.
    pub fn new(
        config: Config,
        hub: HubHandle,
        limiter: Arc<RateLimiter>,
        tasks: SharedTaskStore,
    ) -> Self {
        Self {
            config,
            hub,
            limiter,
            tasks,
        }
    }
}
