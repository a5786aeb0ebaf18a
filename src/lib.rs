//! taskcast - push-notification fan-out for a shared task list.
//!
//! One authoritative process owns a task list and a registry of observers.
//! Every mutation is broadcast to all observers as a content-free change
//! signal; each observer re-fetches and re-renders the current snapshot for
//! its own Server-Sent Events connection. A fixed-window rate limiter gates
//! how often any single client may trigger a mutation.

pub mod config;
pub mod hub;
pub mod limiter;
pub mod server;
pub mod store;
