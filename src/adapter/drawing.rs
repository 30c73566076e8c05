//! Declarative drawing controller adapter

use crate::adapter::lifecycle::{BindingState, SubscriptionSet};
use crate::api::events::EventStream;
use crate::api::handle::MapHandle;
use crate::core::options::{ChangeSet, DrawingDelta, ShapeKind};
use crate::event::ShapeComplete;
use crate::manager::drawing::DrawingManager;
use crate::Result;
use std::sync::Arc;

pub struct DrawingAdapter {
    map: MapHandle,
    manager: Arc<DrawingManager>,
    state: BindingState,
    subscriptions: SubscriptionSet,
}

impl DrawingAdapter {
    pub fn new(map: MapHandle, manager: Arc<DrawingManager>) -> Self {
        Self {
            map,
            manager,
            state: BindingState::new(),
            subscriptions: SubscriptionSet::new(),
        }
    }

    pub fn manager(&self) -> Arc<DrawingManager> {
        self.manager.clone()
    }

    async fn ensure_attached(&self) -> Result<()> {
        if !self.state.try_add() {
            return Ok(());
        }
        let api = self.map.get_map().await;
        self.manager.set_map(Some(api)).await
    }

    /// First-render lifecycle hook; attaches the controller
    pub async fn on_init(&self) -> Result<()> {
        self.ensure_attached().await
    }

    /// Change-detection hook: every changed option is collected into one
    /// patch and applied with a single native call.
    pub async fn on_changes(&self, changes: &ChangeSet) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }
        let delta = DrawingDelta::from_change_set(changes);
        self.manager.apply(delta).await;
        self.ensure_attached().await
    }

    /// Output stream of completed shapes, optionally for one overlay kind
    pub async fn completions(&self, filter: Option<ShapeKind>) -> Option<EventStream<ShapeComplete>> {
        let mut stream = self.manager.completions(filter).await?;
        self.subscriptions.adopt(&mut stream);
        Some(stream)
    }

    /// Teardown hook: disposes subscriptions and detaches the controller
    pub async fn on_destroy(&self) -> Result<()> {
        if !self.state.destroy() {
            return Ok(());
        }
        self.subscriptions.dispose_all();
        self.manager.set_map(None).await
    }
}
