//! Shared one-shot completion primitives
//!
//! `Ready`/`Completer` replace the "resolver captured in constructor"
//! pattern: completion is a single-assignment operation that consumes the
//! completer, and every clone of the `Ready` side observes the same value.
//! `MapHandle` is the crate-wide instance of this for the mapping surface
//! itself.

use crate::api::MapApi;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio::sync::Notify;

struct ReadyInner<T> {
    cell: OnceCell<T>,
    notify: Notify,
}

/// The waiting side of a one-shot completion. Cloning is cheap and every
/// clone resolves to the same value. If the completer is dropped without
/// completing, `get` pends forever; callers rely on task teardown rather
/// than timeouts, matching the "underlying API never loads" failure mode.
pub struct Ready<T> {
    inner: Arc<ReadyInner<T>>,
}

/// The completing side of a one-shot completion. Consumed on use, so the
/// value can be assigned at most once.
pub struct Completer<T> {
    inner: Arc<ReadyInner<T>>,
}

impl<T> Clone for Ready<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Ready<T> {
    /// Creates a connected completer/ready pair
    pub fn channel() -> (Completer<T>, Ready<T>) {
        let inner = Arc::new(ReadyInner {
            cell: OnceCell::new(),
            notify: Notify::new(),
        });
        (
            Completer {
                inner: inner.clone(),
            },
            Ready { inner },
        )
    }

    /// Creates an already-completed handle
    pub fn resolved(value: T) -> Self {
        let inner = Arc::new(ReadyInner {
            cell: OnceCell::new(),
            notify: Notify::new(),
        });
        let _ = inner.cell.set(value);
        Self { inner }
    }

    /// Waits for the value. Resolves immediately when already completed.
    pub async fn get(&self) -> T {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(value) = self.inner.cell.get() {
                return value.clone();
            }
            notified.await;
        }
    }

    /// Non-blocking peek at the value
    pub fn try_get(&self) -> Option<T> {
        self.inner.cell.get().cloned()
    }
}

impl<T> Completer<T> {
    /// Completes the pair. Returns false if the value had already been set
    /// through another path.
    pub fn complete(self, value: T) -> bool {
        let accepted = self.inner.cell.set(value).is_ok();
        self.inner.notify.notify_waiters();
        accepted
    }
}

/// Handle to the asynchronously-arriving mapping surface. All managers are
/// constructed against a `MapHandle` and queue their work behind it; the
/// resolution is shared, not re-triggered per caller.
#[derive(Clone)]
pub struct MapHandle {
    ready: Ready<Arc<dyn MapApi>>,
}

/// Completing side of a pending `MapHandle`
pub struct MapCompleter(Completer<Arc<dyn MapApi>>);

impl MapHandle {
    /// A handle that resolves once `MapCompleter::resolve` is called,
    /// typically when the external API script has finished loading.
    pub fn pending() -> (MapHandle, MapCompleter) {
        let (completer, ready) = Ready::channel();
        (MapHandle { ready }, MapCompleter(completer))
    }

    /// A handle over an already-available surface
    pub fn resolved(api: Arc<dyn MapApi>) -> MapHandle {
        MapHandle {
            ready: Ready::resolved(api),
        }
    }

    /// Waits for the mapping surface
    pub async fn get_map(&self) -> Arc<dyn MapApi> {
        self.ready.get().await
    }

    /// Non-blocking peek at the mapping surface
    pub fn try_map(&self) -> Option<Arc<dyn MapApi>> {
        self.ready.try_get()
    }
}

impl MapCompleter {
    pub fn resolve(self, api: Arc<dyn MapApi>) -> bool {
        self.0.complete(api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_after_complete() {
        let (completer, ready) = Ready::channel();
        assert!(completer.complete(7));
        assert_eq!(ready.get().await, 7);
        assert_eq!(ready.try_get(), Some(7));
    }

    #[tokio::test]
    async fn test_waiters_before_completion() {
        let (completer, ready) = Ready::channel();
        let early = ready.clone();
        let waiter = tokio::spawn(async move { early.get().await });
        tokio::task::yield_now().await;

        assert!(ready.try_get().is_none());
        completer.complete("done");
        assert_eq!(waiter.await.unwrap(), "done");
        assert_eq!(ready.get().await, "done");
    }

    #[tokio::test]
    async fn test_resolved_is_immediate() {
        let ready = Ready::resolved(vec![1, 2]);
        assert_eq!(ready.try_get(), Some(vec![1, 2]));
        assert_eq!(ready.get().await, vec![1, 2]);
    }
}
