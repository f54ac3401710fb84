//! Event dispatch
//!
//! The reducer is pure; something still has to own the current registry
//! value, feed events through it one at a time, and tell consumers when
//! the value actually changed. `Dispatcher` is that harness: a spawned
//! task drains an event queue in arrival order, applies the reducer, and
//! publishes every genuinely-new registry value on a watch channel. No-op
//! transitions (reference-equal results) are not published, so a watch
//! wakeup always means a real change.

use tokio::sync::{mpsc, watch};

use crate::registry::{Registry, StreamEvent, StreamReducer};

/// Handle to a running dispatch loop
///
/// Cheap to clone; the loop runs until every handle is dropped.
#[derive(Clone)]
pub struct Dispatcher {
    events: mpsc::UnboundedSender<StreamEvent>,
    state: watch::Receiver<Registry>,
}

impl Dispatcher {
    /// Spawn the dispatch loop for a reducer
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(reducer: StreamReducer) -> Dispatcher {
        let (events, mut queue) = mpsc::unbounded_channel::<StreamEvent>();
        let (publish, state) = watch::channel(Registry::empty());

        tokio::spawn(async move {
            let mut current = Registry::empty();
            while let Some(event) = queue.recv().await {
                let name = event.name();
                let next = reducer.reduce(&current, event);
                if Registry::same(&next, &current) {
                    tracing::debug!(event = name, "Event left registry unchanged");
                    continue;
                }
                current = next.clone();
                if publish.send(next).is_err() {
                    // Every handle is gone; no one is left to observe state
                    break;
                }
            }
            tracing::debug!("Dispatch loop stopped");
        });

        Dispatcher { events, state }
    }

    /// Queue one event for the dispatch loop
    ///
    /// Events are applied strictly in the order queued.
    pub fn dispatch(&self, event: StreamEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("Dispatch loop is gone, event dropped");
        }
    }

    /// Most recently published registry value
    pub fn registry(&self) -> Registry {
        self.state.borrow().clone()
    }

    /// Watch registry changes
    ///
    /// Receivers wake only for values that differ by reference from their
    /// predecessor.
    pub fn watch(&self) -> watch::Receiver<Registry> {
        self.state.clone()
    }
}
