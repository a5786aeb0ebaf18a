//! In-memory task list store.
//!
//! The store itself is a plain owned collection; sharing and locking are
//! the caller's concern (see [`crate::store::SharedTaskStore`]). The hub
//! and its subscribers never reach into this state directly; they only
//! trigger re-renders of [`TaskStore::snapshot`].

use crate::store::types::{Task, TaskSnapshot};

/// The authoritative task list.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Appends a new open task and returns a copy of it.
    pub fn add_task(&mut self, title: impl Into<String>) -> Task {
        let task = Task::new(self.next_id, title);
        self.next_id += 1;
        self.tasks.push(task.clone());
        task
    }

    /// Toggles the completion state of the task with `id`.
    ///
    /// Returns the updated task, or `None` if no such task exists.
    pub fn toggle_task(&mut self, id: u64) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.toggle();
        Some(task.clone())
    }

    /// Removes the task with `id`, returning it if it existed.
    pub fn remove_task(&mut self, id: u64) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Number of tasks currently on the list.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Copies the current state out for rendering.
    pub fn snapshot(&self) -> TaskSnapshot {
        let completed = self.tasks.iter().filter(|task| task.done).count();
        TaskSnapshot {
            tasks: self.tasks.clone(),
            total: self.tasks.len(),
            completed,
        }
    }
}
