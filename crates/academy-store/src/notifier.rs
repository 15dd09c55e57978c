//! Cross-tab change notification.
//!
//! Every committed write publishes a [`ChangeEvent`] on the origin's
//! [`ChangeBus`]. Tabs subscribe to the keys they display and re-read those
//! keys when an event arrives. Delivery is best-effort and at-most-once: a
//! subscriber that falls behind the channel capacity observes
//! [`NotifyError::Lagged`] and should re-read everything it displays. Events
//! are never delivered back to the context that caused them.

use std::collections::HashSet;

use academy_shared::ContextId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// A committed change to one storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    /// Context that performed the write.
    pub origin: ContextId,
    /// Revision of the new entry; `None` for removals.
    pub revision: Option<i64>,
    pub at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Change bus closed")]
    Closed,

    #[error("Subscriber lagged behind, {0} events dropped")]
    Lagged(u64),
}

/// Publish/subscribe channel shared by every tab of one store.
#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let key = event.key.clone();
        match self.tx.send(event) {
            Ok(receivers) => tracing::trace!(key = %key, receivers, "change published"),
            // No listeners registered: nothing to deliver.
            Err(_) => tracing::trace!(key = %key, "change published without listeners"),
        }
    }

    /// Register a listener for `context`. An empty `keys` slice listens to
    /// every key.
    pub fn subscribe(&self, context: ContextId, keys: &[&str]) -> Subscription {
        let keys = if keys.is_empty() {
            None
        } else {
            Some(keys.iter().map(|k| k.to_string()).collect())
        };
        tracing::debug!(context = %context.short(), ?keys, "listener registered");
        Subscription {
            rx: self.tx.subscribe(),
            context,
            keys,
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A registered listener. Dropping it deregisters the listener.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    context: ContextId,
    keys: Option<HashSet<String>>,
}

impl Subscription {
    pub fn context(&self) -> ContextId {
        self.context
    }

    fn accepts(&self, event: &ChangeEvent) -> bool {
        if event.origin == self.context {
            return false;
        }
        match &self.keys {
            Some(keys) => keys.contains(&event.key),
            None => true,
        }
    }

    /// Wait for the next change made by another context to a watched key.
    pub async fn recv(&mut self) -> Result<ChangeEvent, NotifyError> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.accepts(&event) => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Closed) => return Err(NotifyError::Closed),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(context = %self.context.short(), dropped = n, "listener lagged");
                    return Err(NotifyError::Lagged(n));
                }
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`]; `Ok(None)` when no
    /// matching event is queued.
    pub fn try_recv(&mut self) -> Result<Option<ChangeEvent>, NotifyError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.accepts(&event) => return Ok(Some(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(NotifyError::Closed),
                Err(TryRecvError::Lagged(n)) => return Err(NotifyError::Lagged(n)),
            }
        }
    }

    /// Drain every queued matching event.
    pub fn drain(&mut self) -> Result<Vec<ChangeEvent>, NotifyError> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv()? {
            events.push(event);
        }
        Ok(events)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!(context = %self.context.short(), "listener released");
    }
}
