//! Declarative polygon adapter

use crate::adapter::lifecycle::{next_entity_id, BindingState, SubscriptionSet};
use crate::api::events::EventStream;
use crate::core::geo::LatLng;
use crate::core::options::{ChangeSet, PolygonDelta, PolygonOptions};
use crate::event::{OverlayEvent, OverlayEventKind, PathEvent};
use crate::manager::lifecycle::EntityId;
use crate::manager::polygon::PolygonManager;
use std::sync::{Arc, Mutex};

pub struct PolygonAdapter {
    id: EntityId,
    manager: Arc<PolygonManager>,
    declared: Mutex<PolygonOptions>,
    state: BindingState,
    subscriptions: SubscriptionSet,
}

impl PolygonAdapter {
    pub fn new(manager: Arc<PolygonManager>, options: PolygonOptions) -> Self {
        Self {
            id: next_entity_id("polygon"),
            manager,
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
        self.manager.add_polygon(self.id.clone(), options);
        true
    }

    /// First-render lifecycle hook
    pub fn on_init(&self) {
        self.ensure_added();
    }

    /// Change-detection hook; only whitelisted changed fields reach the
    /// native setter.
    pub fn on_changes(&self, changes: &ChangeSet) {
        if self.state.is_destroyed() {
            return;
        }
        let delta = {
            let Ok(mut declared) = self.declared.lock() else {
                return;
            };
            let delta = PolygonDelta::from_change_set(changes);
            declared.merge(&delta);
            delta
        };
        if self.ensure_added() {
            return;
        }
        if !delta.is_empty() {
            self.manager.update_polygon(&self.id, delta);
        }
    }

    /// Output stream of ring mutations
    pub async fn path_events(&self) -> Option<EventStream<PathEvent>> {
        let mut stream = self.manager.path_events(&self.id).await?;
        self.subscriptions.adopt(&mut stream);
        Some(stream)
    }

    /// Output stream for one native pointer event
    pub async fn events(&self, kind: OverlayEventKind) -> Option<EventStream<OverlayEvent>> {
        let mut stream = self.manager.polygon_events(&self.id, kind).await?;
        self.subscriptions.adopt(&mut stream);
        Some(stream)
    }

    /// Current outer ring of the native polygon
    pub async fn path(&self) -> Option<Vec<LatLng>> {
        self.manager.path(&self.id).await
    }

    /// All current rings of the native polygon
    pub async fn paths(&self) -> Option<Vec<Vec<LatLng>>> {
        self.manager.paths(&self.id).await
    }

    /// Teardown hook
    pub async fn on_destroy(&self) {
        if !self.state.destroy() {
            return;
        }
        self.subscriptions.dispose_all();
        self.manager.delete_polygon(&self.id).await;
    }
}
