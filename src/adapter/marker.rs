//! Declarative marker adapter
//!
//! Generic over [`MarkerHost`], so the same adapter drives markers placed
//! directly on the map and markers living inside a cluster container.

use crate::adapter::lifecycle::{next_entity_id, BindingState, SubscriptionSet};
use crate::api::events::EventStream;
use crate::core::options::{ChangeSet, MarkerDelta, MarkerOptions};
use crate::event::{OverlayEvent, OverlayEventKind};
use crate::manager::lifecycle::EntityId;
use crate::manager::marker::MarkerHost;
use std::sync::{Arc, Mutex};

pub struct MarkerAdapter {
    id: EntityId,
    host: Arc<dyn MarkerHost>,
    declared: Mutex<MarkerOptions>,
    state: BindingState,
    subscriptions: SubscriptionSet,
}

impl MarkerAdapter {
    pub fn new(host: Arc<dyn MarkerHost>, options: MarkerOptions) -> Self {
        Self {
            id: next_entity_id("marker"),
            host,
            declared: Mutex::new(options),
            state: BindingState::new(),
            subscriptions: SubscriptionSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn ensure_added(&self) -> bool {
        if !self.state.try_add() {
            return false;
        }
        let options = self
            .declared
            .lock()
            .map(|declared| declared.clone())
            .unwrap_or_default();
        self.host.add_marker(self.id.clone(), options);
        true
    }

    /// First-render lifecycle hook
    pub fn on_init(&self) {
        self.ensure_added();
    }

    /// Change-detection hook: folds the change set into the declared state
    /// and forwards only the changed fields. The first change set performs
    /// the add instead.
    pub fn on_changes(&self, changes: &ChangeSet) {
        if self.state.is_destroyed() {
            return;
        }
        let delta = {
            let Ok(mut declared) = self.declared.lock() else {
                return;
            };
            let delta = MarkerDelta::from_change_set(changes, &declared);
            declared.merge(&delta);
            delta
        };
        if self.ensure_added() {
            return;
        }
        if !delta.is_empty() {
            self.host.update_marker(&self.id, delta);
        }
    }

    /// Output stream for one native marker event; the subscription is
    /// retained for teardown.
    pub async fn events(&self, kind: OverlayEventKind) -> Option<EventStream<OverlayEvent>> {
        let mut stream = self.host.marker_events(&self.id, kind).await?;
        self.subscriptions.adopt(&mut stream);
        Some(stream)
    }

    /// Teardown hook: disposal is unconditional and precedes the (possibly
    /// still pending) removal from the host.
    pub async fn on_destroy(&self) {
        if !self.state.destroy() {
            return;
        }
        self.subscriptions.dispose_all();
        self.host.delete_marker(&self.id).await;
    }
}
