//! Event bridging between native callbacks and framework-side streams
//!
//! Native mapping libraries fire callbacks outside any tracked scheduling.
//! Every event funnels through an [`EventScope`] before it reaches a
//! stream, so downstream reactive consumers observe it inside their own
//! execution context. Subscriptions are represented by [`ListenerHandle`]s
//! with exactly-once disposal.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Execution-context re-entry point for externally-triggered callbacks
pub trait EventScope: Send + Sync {
    fn run(&self, f: Box<dyn FnOnce() + Send>);
}

/// Scope that runs callbacks inline on the calling thread. The default
/// when no host scheduling context needs re-entering.
pub struct CallerScope;

impl EventScope for CallerScope {
    fn run(&self, f: Box<dyn FnOnce() + Send>) {
        f()
    }
}

impl CallerScope {
    pub fn shared() -> Arc<dyn EventScope> {
        Arc::new(CallerScope)
    }
}

/// Sending side handed to native `listen` registrations. Emission re-enters
/// the scope before the event is forwarded.
pub struct EventSink<T> {
    scope: Arc<dyn EventScope>,
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send + 'static> EventSink<T> {
    pub fn emit(&self, event: T) {
        let tx = self.tx.clone();
        // Dropped receivers are not an error: the stream side may have been
        // torn down while the native object still fires.
        self.scope.run(Box::new(move || {
            let _ = tx.send(event);
        }));
    }
}

/// One native event subscription. The disposer runs exactly once, either
/// through `dispose` or on drop, never both.
pub struct ListenerHandle {
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerHandle {
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposer.is_none()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Framework-side event stream. Owns its listener handle so dropping the
/// stream releases the native subscription, unless an adapter took the
/// listener over for its own teardown accounting.
pub struct EventStream<T> {
    rx: mpsc::UnboundedReceiver<T>,
    listener: Option<ListenerHandle>,
    filter: Option<Box<dyn Fn(&T) -> bool + Send>>,
}

impl<T> EventStream<T> {
    pub fn new(rx: mpsc::UnboundedReceiver<T>, listener: Option<ListenerHandle>) -> Self {
        Self {
            rx,
            listener,
            filter: None,
        }
    }

    /// Restricts the stream to events matching the predicate
    pub fn filtered(mut self, predicate: impl Fn(&T) -> bool + Send + 'static) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Hands the native subscription over to the caller; the stream itself
    /// then no longer disposes it.
    pub fn take_listener(&mut self) -> Option<ListenerHandle> {
        self.listener.take()
    }

    fn passes(&self, event: &T) -> bool {
        self.filter.as_ref().map(|f| f(event)).unwrap_or(true)
    }

    /// Receives the next matching event; `None` once the sending side is gone
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let event = self.rx.recv().await?;
            if self.passes(&event) {
                return Some(event);
            }
        }
    }

    /// Non-blocking variant of `recv`
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            let event = self.rx.try_recv().ok()?;
            if self.passes(&event) {
                return Some(event);
            }
        }
    }
}

impl<T> futures::Stream for EventStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        loop {
            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(event)) => {
                    if this.passes(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Creates a sink/receiver pair bound to the given scope
pub fn event_channel<T>(scope: Arc<dyn EventScope>) -> (EventSink<T>, mpsc::UnboundedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { scope, tx }, rx)
}
