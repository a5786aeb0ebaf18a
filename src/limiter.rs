//! Fixed-window admission control for state-changing requests.
//!
//! Tracks how many mutations each client identity has made inside the
//! current window and answers allow/deny synchronously. The fixed window is
//! a deliberate choice over sliding-log or token-bucket schemes: it is
//! trivial to reason about and good enough against bursty abuse. The known
//! imprecision is that a client straddling a window boundary can fit up to
//! twice the per-window maximum into a short span.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Entries whose window expired this many window-lengths ago are evicted by
/// [`RateLimiter::sweep_expired`].
const SWEEP_GRACE_MULTIPLE: u32 = 4;

/// Per-identity accounting record.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    /// Requests allowed in the current window.
    count: u32,
    /// When the current window opened.
    window_start: Instant,
}

/// Fixed-window rate limiter keyed by client identity.
///
/// All reads and writes of the counter table go through one mutex;
/// `check_and_record` never suspends and returns in bounded time.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per identity per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether `identity` may proceed right now.
    ///
    /// The attempt is counted only when allowed; a denied request never
    /// consumes quota. A request arriving exactly one window after the
    /// window opened starts a fresh window (the comparison is `>=`).
    pub fn check_and_record(&self, identity: &str) -> bool {
        self.check_at(identity, Instant::now())
    }

    fn check_at(&self, identity: &str, now: Instant) -> bool {
        let mut entries = self.lock_entries();

        let Some(entry) = entries.get_mut(identity) else {
            entries.insert(
                identity.to_string(),
                WindowEntry {
                    count: 1,
                    window_start: now,
                },
            );
            return true;
        };

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 1;
            entry.window_start = now;
            return true;
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            return true;
        }

        false
    }

    /// Evicts identities whose window expired more than
    /// [`SWEEP_GRACE_MULTIPLE`] window-lengths ago.
    ///
    /// Without this the table grows with every identity ever seen; run it
    /// periodically in long-lived deployments. Returns how many entries
    /// were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let cutoff = self.window * SWEEP_GRACE_MULTIPLE;
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        before - entries.len()
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.lock_entries().len()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, WindowEntry>> {
        match self.entries.lock() {
            Ok(entries) => entries,
            // A panic while holding the lock leaves the counters intact;
            // keep serving rather than refusing all traffic.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    fn count_for(&self, identity: &str) -> Option<u32> {
        self.lock_entries().get(identity).map(|entry| entry.count)
    }
}
