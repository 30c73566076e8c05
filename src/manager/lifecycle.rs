//! Generic entity lifecycle bookkeeping shared by all managers
//!
//! Maps a declared entity id to a pending-or-resolved native handle. Each
//! entity gets a driver task and a FIFO operation queue: operations issued
//! before creation resolves are deferred and applied in issuance order once
//! the handle exists. Operations on different entities are independent and
//! may settle in any order.
//!
//! Managers compose this helper instead of inheriting a common base; the
//! divergence between marker teardown (detach only) and cluster-marker
//! teardown (detach, then unregister from the clusterer) lives entirely in
//! the teardown closures the managers pass in.

use crate::api::handle::Ready;
use crate::prelude::HashMap;
use crate::Result;
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Identity of a declared entity
pub type EntityId = String;

type ApplyFn<H> = Box<dyn FnOnce(&H) + Send>;

enum Op<H> {
    Apply(ApplyFn<H>),
    Teardown(ApplyFn<H>, oneshot::Sender<()>),
}

struct Entry<H> {
    ops: mpsc::UnboundedSender<Op<H>>,
    handle: Ready<H>,
}

/// Per-category registry of declared entities and their native handles
pub struct EntityLifecycle<H> {
    entries: Mutex<HashMap<EntityId, Entry<H>>>,
}

impl<H> EntityLifecycle<H>
where
    H: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::default()),
        }
    }

    /// Registers an entity and spawns its driver. The driver awaits the
    /// creation future, publishes the handle, then drains queued operations
    /// in issuance order. A creation failure is logged and downgrades every
    /// queued mutation to a no-op; queued teardowns still settle.
    pub fn insert<F>(&self, id: EntityId, create: F)
    where
        F: Future<Output = Result<H>> + Send + 'static,
    {
        let (ops_tx, mut ops_rx) = mpsc::unbounded_channel();
        let (completer, handle) = Ready::channel();

        if let Ok(mut entries) = self.entries.lock() {
            let replaced = entries
                .insert(
                    id.clone(),
                    Entry {
                        ops: ops_tx,
                        handle,
                    },
                )
                .is_some();
            if replaced {
                log::warn!("entity `{id}` re-added before removal; replacing its native object");
            }
        }

        tokio::spawn(async move {
            match create.await {
                Ok(native) => {
                    completer.complete(native.clone());
                    while let Some(op) = ops_rx.recv().await {
                        match op {
                            Op::Apply(apply) => apply(&native),
                            Op::Teardown(teardown, done) => {
                                teardown(&native);
                                let _ = done.send(());
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    log::error!("native object creation for `{id}` failed: {err}");
                    while let Some(op) = ops_rx.recv().await {
                        if let Op::Teardown(_, done) = op {
                            let _ = done.send(());
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Queues a mutation against the entity's native handle. Returns false
    /// for unknown or already-removed ids; the operation is then a no-op,
    /// not an error.
    pub fn apply<F>(&self, id: &str, apply: F) -> bool
    where
        F: FnOnce(&H) + Send + 'static,
    {
        let Ok(entries) = self.entries.lock() else {
            return false;
        };
        match entries.get(id) {
            Some(entry) => entry.ops.send(Op::Apply(Box::new(apply))).is_ok(),
            None => false,
        }
    }

    /// Unregisters the entity and queues its teardown. The returned future
    /// settles once the teardown has run against the resolved handle (or
    /// immediately for unknown ids, making repeated removal idempotent).
    ///
    /// Removal requested before creation resolves is absorbed: the driver
    /// finishes creating the native object and immediately tears it down,
    /// so the object never outlives the removal observably.
    pub fn remove<F>(&self, id: &str, teardown: F) -> impl Future<Output = ()> + Send + 'static
    where
        F: FnOnce(&H) + Send + 'static,
    {
        let entry = self
            .entries
            .lock()
            .ok()
            .and_then(|mut entries| entries.remove(id));

        async move {
            let Some(entry) = entry else {
                return;
            };
            let (done_tx, done_rx) = oneshot::channel();
            if entry.ops.send(Op::Teardown(Box::new(teardown), done_tx)).is_ok() {
                let _ = done_rx.await;
            }
        }
    }

    /// Shared handle resolution for the entity, `None` for unknown ids
    pub fn resolved(&self, id: &str) -> Option<Ready<H>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(id).map(|entry| entry.handle.clone()))
    }

    /// Waits for the entity's native handle
    pub async fn native(&self, id: &str) -> Option<H> {
        let ready = self.resolved(id)?;
        Some(ready.get().await)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H> Default for EntityLifecycle<H>
where
    H: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handle::Ready;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct Probe {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[tokio::test]
    async fn test_ops_queue_in_issuance_order_behind_creation() {
        let registry = EntityLifecycle::<Probe>::new();
        let (gate_tx, gate) = Ready::channel();
        let log = Arc::new(Mutex::new(Vec::new()));

        let probe = Probe { log: log.clone() };
        registry.insert("a".into(), async move {
            gate.get().await;
            Ok(probe)
        });

        assert!(registry.apply("a", |p| p.log.lock().unwrap().push("first")));
        assert!(registry.apply("a", |p| p.log.lock().unwrap().push("second")));
        let removal = registry.remove("a", |p| p.log.lock().unwrap().push("teardown"));

        assert!(log.lock().unwrap().is_empty());
        gate_tx.complete(());
        removal.await;

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "teardown"]);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let registry = EntityLifecycle::<Probe>::new();
        registry.remove("ghost", |_| panic!("teardown must not run")).await;
        assert!(!registry.apply("ghost", |_| panic!("apply must not run")));
    }

    #[tokio::test]
    async fn test_double_remove_runs_teardown_once() {
        let registry = EntityLifecycle::<Probe>::new();
        let teardowns = Arc::new(AtomicUsize::new(0));

        registry.insert("a".into(), async move {
            Ok(Probe {
                log: Arc::new(Mutex::new(Vec::new())),
            })
        });

        let counted = teardowns.clone();
        let first = registry.remove("a", move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        let second = registry.remove("a", |_| panic!("second teardown must not run"));

        first.await;
        second.await;
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_creation_failure_degrades() {
        let registry = EntityLifecycle::<Probe>::new();
        registry.insert("a".into(), async {
            Err(crate::Error::Surface("construction rejected".into()))
        });

        // queued mutations drop, removal still settles
        registry.apply("a", |_| panic!("apply must not run"));
        registry.remove("a", |_| panic!("teardown must not run")).await;
        assert!(registry.is_empty());
    }
}
