//! Declarative info window adapter

use crate::adapter::lifecycle::{next_entity_id, BindingState, SubscriptionSet};
use crate::api::events::EventStream;
use crate::core::options::{ChangeSet, InfoWindowDelta, InfoWindowOptions};
use crate::event::InfoWindowEvent;
use crate::manager::infowindow::InfoWindowManager;
use crate::manager::lifecycle::EntityId;
use std::sync::{Arc, Mutex};

pub struct InfoWindowAdapter {
    id: EntityId,
    manager: Arc<InfoWindowManager>,
    declared: Mutex<InfoWindowOptions>,
    state: BindingState,
    subscriptions: SubscriptionSet,
}

impl InfoWindowAdapter {
    pub fn new(manager: Arc<InfoWindowManager>, options: InfoWindowOptions) -> Self {
        Self {
            id: next_entity_id("infowindow"),
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
        self.manager.add_info_window(self.id.clone(), options);
        true
    }

    /// First-render lifecycle hook
    pub fn on_init(&self) {
        self.ensure_added();
    }

    /// Change-detection hook
    pub fn on_changes(&self, changes: &ChangeSet) {
        if self.state.is_destroyed() {
            return;
        }
        let delta = {
            let Ok(mut declared) = self.declared.lock() else {
                return;
            };
            let delta = InfoWindowDelta::from_change_set(changes, &declared);
            declared.merge(&delta);
            delta
        };
        if self.ensure_added() {
            return;
        }
        if !delta.is_empty() {
            self.manager.update_info_window(&self.id, delta);
        }
    }

    /// Opens the window, optionally anchored to a marker entity
    pub async fn open(&self, host_marker: Option<&str>) {
        self.ensure_added();
        self.manager.open(&self.id, host_marker).await;
    }

    pub fn close(&self) {
        self.manager.close(&self.id);
    }

    /// Output stream of close-click events
    pub async fn events(&self) -> Option<EventStream<InfoWindowEvent>> {
        let mut stream = self.manager.info_window_events(&self.id).await?;
        self.subscriptions.adopt(&mut stream);
        Some(stream)
    }

    /// Teardown hook
    pub async fn on_destroy(&self) {
        if !self.state.destroy() {
            return;
        }
        self.subscriptions.dispose_all();
        self.manager.delete_info_window(&self.id).await;
    }
}
