//! Declarative cluster container adapter
//!
//! Owns the one-shot clusterer initialization and forwards tunable changes
//! as narrow, independently-awaited setter calls. Marker adapters for the
//! container's children compose against [`ClusterAdapter::host`].

use crate::adapter::lifecycle::{BindingState, SubscriptionSet};
use crate::api::events::EventStream;
use crate::core::options::{ChangeSet, ClusterCalculator, ClusterDelta, ClusterOptions};
use crate::event::{ClusterEvent, ClusterEventKind};
use crate::manager::cluster::ClusterManager;
use crate::manager::marker::MarkerHost;
use crate::Result;
use std::sync::{Arc, Mutex};

pub struct ClusterAdapter {
    manager: Arc<ClusterManager>,
    declared: Mutex<ClusterOptions>,
    state: BindingState,
    subscriptions: SubscriptionSet,
}

impl ClusterAdapter {
    pub fn new(manager: Arc<ClusterManager>, options: ClusterOptions) -> Self {
        Self {
            manager,
            declared: Mutex::new(options),
            state: BindingState::new(),
            subscriptions: SubscriptionSet::new(),
        }
    }

    /// The marker destination child adapters compose with
    pub fn host(&self) -> Arc<dyn MarkerHost> {
        self.manager.clone()
    }

    pub fn manager(&self) -> Arc<ClusterManager> {
        self.manager.clone()
    }

    async fn ensure_added(&self) -> Result<bool> {
        if !self.state.try_add() {
            return Ok(false);
        }
        let options = self
            .declared
            .lock()
            .map(|declared| declared.clone())
            .unwrap_or_default();
        self.manager.init(options).await?;
        Ok(true)
    }

    /// First-render lifecycle hook; constructs the clusterer
    pub async fn on_init(&self) -> Result<()> {
        self.ensure_added().await?;
        Ok(())
    }

    /// Change-detection hook: forwards each changed tunable through its own
    /// setter; unchanged tunables are not re-sent.
    pub async fn on_changes(&self, changes: &ChangeSet) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }
        let delta = {
            let Ok(mut declared) = self.declared.lock() else {
                return Ok(());
            };
            let delta = ClusterDelta::from_change_set(changes);
            declared.merge(&delta);
            delta
        };
        if self.ensure_added().await? {
            return Ok(());
        }
        if delta.is_empty() {
            return Ok(());
        }

        self.manager.set_grid_size(delta.grid_size).await;
        self.manager.set_max_zoom(delta.max_zoom).await;
        self.manager.set_styles(delta.styles).await;
        self.manager.set_average_center(delta.average_center).await;
        self.manager
            .set_minimum_cluster_size(delta.minimum_cluster_size)
            .await;
        self.manager.set_image_path(delta.image_path).await;
        self.manager.set_image_extension(delta.image_extension).await;
        self.manager.set_zoom_on_click(delta.zoom_on_click).await;
        Ok(())
    }

    /// Calculator changes arrive programmatically rather than through a
    /// change set; forwarded once the container is added.
    pub async fn set_calculator(&self, calculator: ClusterCalculator) {
        if let Ok(mut declared) = self.declared.lock() {
            declared.calculator = Some(calculator.clone());
        }
        if self.state.is_added() {
            self.manager.set_calculator(Some(calculator)).await;
        }
    }

    /// Output stream for one native clusterer event
    pub async fn events(&self, kind: ClusterEventKind) -> EventStream<ClusterEvent> {
        let mut stream = self.manager.cluster_events(kind).await;
        self.subscriptions.adopt(&mut stream);
        stream
    }

    /// Teardown hook: disposes subscriptions, then empties the container
    pub async fn on_destroy(&self) {
        if !self.state.destroy() {
            return;
        }
        self.subscriptions.dispose_all();
        self.manager.clear_markers().await;
    }
}
