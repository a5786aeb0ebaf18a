//! Data types for the shared task list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single task on the shared list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier, unique for the lifetime of the process.
    pub id: u64,

    /// What needs doing.
    pub title: String,

    /// Whether the task has been completed.
    pub done: bool,

    /// When the task was created.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new open task with the given id and title.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            done: false,
            created_at: Utc::now(),
        }
    }

    /// Flips the task between open and completed.
    pub fn toggle(&mut self) {
        self.done = !self.done;
    }
}

/// Point-in-time copy of the task list handed to renderers.
///
/// Subscribers receive whole snapshots, never diffs, so a reconnecting
/// client is correct immediately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// All tasks, in creation order.
    pub tasks: Vec<Task>,

    /// Total number of tasks.
    pub total: usize,

    /// How many of them are completed.
    pub completed: usize,
}
