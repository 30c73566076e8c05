//! Marker lifecycle against the map's own overlay set

use crate::api::events::{event_channel, EventScope, EventStream};
use crate::api::handle::MapHandle;
use crate::api::NativeMarker;
use crate::core::options::{MarkerDelta, MarkerOptions};
use crate::event::{OverlayEvent, OverlayEventKind};
use crate::manager::lifecycle::{EntityId, EntityLifecycle};
use async_trait::async_trait;
use std::sync::Arc;

/// Destination for declared markers. Implemented by [`MarkerManager`]
/// (markers attached directly to the map) and by
/// [`crate::manager::cluster::ClusterManager`] (markers owned by the
/// clustering engine), so a marker adapter composes with either.
#[async_trait]
pub trait MarkerHost: Send + Sync {
    /// Registers a declared marker and begins native creation
    fn add_marker(&self, id: EntityId, options: MarkerOptions);

    /// Forwards only the changed fields to the native marker. No-op for
    /// unknown ids.
    fn update_marker(&self, id: &str, delta: MarkerDelta) -> bool;

    /// Tears the marker down; completes when the native object is detached.
    /// Idempotent: unknown ids resolve immediately.
    async fn delete_marker(&self, id: &str);

    /// Bridges one native marker event into a stream. `None` for unknown ids.
    async fn marker_events(
        &self,
        id: &str,
        kind: OverlayEventKind,
    ) -> Option<EventStream<OverlayEvent>>;
}

/// Owns native markers attached directly to the map context
pub struct MarkerManager {
    map: MapHandle,
    scope: Arc<dyn EventScope>,
    markers: EntityLifecycle<Arc<dyn NativeMarker>>,
}

impl MarkerManager {
    pub fn new(map: MapHandle, scope: Arc<dyn EventScope>) -> Self {
        Self {
            map,
            scope,
            markers: EntityLifecycle::new(),
        }
    }

    /// Resolved native handle for a marker, `None` for unknown ids
    pub async fn native(&self, id: &str) -> Option<Arc<dyn NativeMarker>> {
        self.markers.native(id).await
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[async_trait]
impl MarkerHost for MarkerManager {
    fn add_marker(&self, id: EntityId, options: MarkerOptions) {
        let map = self.map.clone();
        self.markers.insert(id, async move {
            let api = map.get_map().await;
            api.create_marker(options, true).await
        });
    }

    fn update_marker(&self, id: &str, delta: MarkerDelta) -> bool {
        self.markers.apply(id, move |marker| marker.apply(&delta))
    }

    async fn delete_marker(&self, id: &str) {
        self.markers
            .remove(id, |marker| marker.set_attached(false))
            .await;
    }

    async fn marker_events(
        &self,
        id: &str,
        kind: OverlayEventKind,
    ) -> Option<EventStream<OverlayEvent>> {
        let marker = self.markers.native(id).await?;
        let (sink, rx) = event_channel(self.scope.clone());
        let listener = marker.listen(kind, sink);
        Some(EventStream::new(rx, Some(listener)))
    }
}
