//! Broadcast hub: the single authority over the subscriber registry.
//!
//! All registration, removal, and fan-out is serialized through one control
//! loop reading from a command channel. The registry is never touched from
//! outside that loop, so no locking is needed and every Subscribe,
//! Unsubscribe, and Publish observes a total order.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

/// A content-free "something changed" notification.
///
/// Carrying no payload is deliberate: subscribers re-fetch the current
/// snapshot themselves when a signal arrives, so the hub never waits on
/// rendering and a late subscriber can never be handed stale pre-rendered
/// content. Do not extend this into payload delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal;

/// Identity of one registered subscriber.
pub type SubscriberId = u64;

/// One live registration.
///
/// Holds the id the hub tracks this subscriber under and the exclusively
/// owned receiving end of its private signal channel. No other component
/// ever reads from `rx`.
pub struct Subscription {
    pub id: SubscriberId,
    pub rx: mpsc::Receiver<Signal>,
}

/// Commands accepted by the hub control loop.
enum HubCommand {
    Subscribe { reply: oneshot::Sender<Subscription> },
    Unsubscribe(SubscriberId),
    Publish(Signal),
    SubscriberCount { reply: oneshot::Sender<usize> },
    Shutdown,
}

/// Receiving side of the command channel, consumed by [`run`].
pub struct HubQueue {
    rx: mpsc::UnboundedReceiver<HubCommand>,
}

/// Cloneable handle for talking to a running hub.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Registers a new subscriber and returns its private signal channel.
    ///
    /// Returns `None` once the hub has shut down.
    pub async fn subscribe(&self) -> Option<Subscription> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(HubCommand::Subscribe { reply }).is_err() {
            tracing::warn!("Subscribe attempted after hub shutdown");
            return None;
        }
        rx.await.ok()
    }

    /// Removes a subscriber from the registry.
    ///
    /// Idempotent: removing an id that is absent, already removed, or never
    /// registered is a silent no-op.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let _ = self.tx.send(HubCommand::Unsubscribe(id));
    }

    /// Notifies every registered subscriber that the shared state changed.
    ///
    /// Never blocks on subscriber consumption; a subscriber whose buffer is
    /// full simply misses this signal.
    pub fn publish(&self) {
        let _ = self.tx.send(HubCommand::Publish(Signal));
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(HubCommand::SubscriberCount { reply }).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Closes every subscriber channel and stops the control loop.
    pub fn shutdown(&self) {
        let _ = self.tx.send(HubCommand::Shutdown);
    }
}

/// Creates the command channel for a hub that has not started yet.
///
/// Lets callers hold a [`HubHandle`] before a runtime exists; pass the
/// queue to [`run`] on the runtime that should own the registry.
pub fn channel() -> (HubHandle, HubQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HubHandle { tx }, HubQueue { rx })
}

/// Spawns the hub control loop on the current runtime.
///
/// `send_buffer` is the capacity of each subscriber's private signal
/// channel before publishes are dropped for that subscriber.
pub fn spawn(send_buffer: usize) -> HubHandle {
    let (handle, queue) = channel();
    tokio::spawn(run(queue, send_buffer));
    handle
}

/// The hub control loop. Runs until [`HubHandle::shutdown`] or until every
/// handle is dropped.
pub async fn run(mut queue: HubQueue, send_buffer: usize) {
    let mut registry: HashMap<SubscriberId, mpsc::Sender<Signal>> = HashMap::new();
    let mut next_id: SubscriberId = 1;

    while let Some(cmd) = queue.rx.recv().await {
        match cmd {
            HubCommand::Subscribe { reply } => {
                let (tx, rx) = mpsc::channel(send_buffer);
                let id = next_id;
                next_id += 1;

                // A failed reply means the requester died between asking and
                // listening; skip the insert so no orphan entry lingers.
                if reply.send(Subscription { id, rx }).is_ok() {
                    registry.insert(id, tx);
                    tracing::debug!(id, subscribers = registry.len(), "Subscriber registered");
                }
            }
            HubCommand::Unsubscribe(id) => {
                if registry.remove(&id).is_some() {
                    tracing::debug!(id, subscribers = registry.len(), "Subscriber removed");
                }
            }
            HubCommand::Publish(signal) => {
                for (id, tx) in &registry {
                    match tx.try_send(signal) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            // The subscriber re-renders from the current
                            // snapshot on its next signal, so a dropped
                            // signal costs nothing but latency.
                            tracing::debug!(id = *id, "Subscriber buffer full, signal dropped");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            // Subscriber is mid-disconnect; its unsubscribe
                            // cleans up the entry.
                            tracing::trace!(id = *id, "Subscriber channel closed");
                        }
                    }
                }
            }
            HubCommand::SubscriberCount { reply } => {
                let _ = reply.send(registry.len());
            }
            HubCommand::Shutdown => {
                tracing::info!(subscribers = registry.len(), "Hub shutting down");
                registry.clear();
                break;
            }
        }
    }
}
