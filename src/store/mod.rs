//! Shared task list state.
//!
//! The hub broadcasts only that this state changed; sessions read it back
//! through [`SharedTaskStore`] when they render.

pub mod task_store;
pub mod types;

pub use task_store::*;
pub use types::*;

use std::sync::{Arc, RwLock};

/// Handle to the task list shared between the ingress handlers (writers)
/// and subscriber sessions (readers).
pub type SharedTaskStore = Arc<RwLock<TaskStore>>;

/// Wraps a store for sharing across the server.
pub fn shared(store: TaskStore) -> SharedTaskStore {
    Arc::new(RwLock::new(store))
}
