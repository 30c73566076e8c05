//! Shared adapter lifecycle pieces

use crate::api::events::{EventStream, ListenerHandle};
use crate::manager::lifecycle::EntityId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Allocates a unique entity id with a kind prefix
pub(crate) fn next_entity_id(prefix: &str) -> EntityId {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{n}")
}

/// Idempotency flags for the adapter state machine. `try_add` succeeds at
/// most once, so whichever of "first init hook" and "first change set"
/// fires first performs the add and the other becomes a no-op.
pub struct BindingState {
    added: AtomicBool,
    destroyed: AtomicBool,
}

impl BindingState {
    pub fn new() -> Self {
        Self {
            added: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Claims the transition to added; false if already added or destroyed
    pub fn try_add(&self) -> bool {
        if self.destroyed.load(Ordering::SeqCst) {
            return false;
        }
        !self.added.swap(true, Ordering::SeqCst)
    }

    pub fn is_added(&self) -> bool {
        self.added.load(Ordering::SeqCst)
    }

    /// Claims the transition to destroyed; false on repeat calls
    pub fn destroy(&self) -> bool {
        !self.destroyed.swap(true, Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Default for BindingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener handles an adapter owns, disposed as a unit at teardown
pub struct SubscriptionSet {
    handles: Mutex<Vec<ListenerHandle>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, handle: ListenerHandle) {
        if let Ok(mut handles) = self.handles.lock() {
            handles.push(handle);
        }
    }

    /// Takes over a stream's native subscription for teardown accounting
    pub fn adopt<T>(&self, stream: &mut EventStream<T>) {
        if let Some(handle) = stream.take_listener() {
            self.push(handle);
        }
    }

    /// Disposes every held subscription exactly once
    pub fn dispose_all(&self) {
        let drained: Vec<ListenerHandle> = self
            .handles
            .lock()
            .map(|mut handles| handles.drain(..).collect())
            .unwrap_or_default();
        for mut handle in drained {
            handle.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.lock().map(|handles| handles.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SubscriptionSet {
    fn default() -> Self {
        Self::new()
    }
}
