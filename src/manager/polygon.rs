//! Polygon lifecycle and path-mutation bridging
//!
//! Polygons are the one overlay kind with nested coordinate rings (holes),
//! and the only one whose geometry mutates natively while a user edits it;
//! both the ring read accessors and the path event stream are futures
//! because the native object may not exist yet.

use crate::api::events::{event_channel, EventScope, EventStream};
use crate::api::handle::MapHandle;
use crate::api::NativePolygon;
use crate::core::geo::LatLng;
use crate::core::options::{PolygonDelta, PolygonOptions};
use crate::event::{OverlayEvent, OverlayEventKind, PathEvent};
use crate::manager::lifecycle::{EntityId, EntityLifecycle};
use std::future::Future;
use std::sync::Arc;

/// Owns native polygon overlays
pub struct PolygonManager {
    map: MapHandle,
    scope: Arc<dyn EventScope>,
    polygons: EntityLifecycle<Arc<dyn NativePolygon>>,
}

impl PolygonManager {
    pub fn new(map: MapHandle, scope: Arc<dyn EventScope>) -> Self {
        Self {
            map,
            scope,
            polygons: EntityLifecycle::new(),
        }
    }

    /// Registers a declared polygon with its full rings and options
    pub fn add_polygon(&self, id: EntityId, options: PolygonOptions) {
        let map = self.map.clone();
        self.polygons.insert(id, async move {
            let api = map.get_map().await;
            api.create_polygon(options).await
        });
    }

    /// Applies only the named changed options; the native object is never
    /// reconstructed. No-op for unknown ids.
    pub fn update_polygon(&self, id: &str, delta: PolygonDelta) -> bool {
        if delta.is_empty() {
            return false;
        }
        self.polygons.apply(id, move |polygon| polygon.apply(&delta))
    }

    /// Tears the polygon down; completes once detached. Idempotent.
    pub fn delete_polygon(&self, id: &str) -> impl Future<Output = ()> + Send + 'static {
        self.polygons
            .remove(id, |polygon| polygon.set_attached(false))
    }

    /// Current outer ring, `None` for unknown ids
    pub async fn path(&self, id: &str) -> Option<Vec<LatLng>> {
        let polygon = self.polygons.native(id).await?;
        Some(polygon.path())
    }

    /// All current rings, `None` for unknown ids
    pub async fn paths(&self, id: &str) -> Option<Vec<Vec<LatLng>>> {
        let polygon = self.polygons.native(id).await?;
        Some(polygon.paths())
    }

    /// Stream of ring mutations (insert/remove/set, any ring). The native
    /// path arrays only exist after resolution, hence the awaited stream.
    pub async fn path_events(&self, id: &str) -> Option<EventStream<PathEvent>> {
        let polygon = self.polygons.native(id).await?;
        let (sink, rx) = event_channel(self.scope.clone());
        let listener = polygon.listen_paths(sink);
        Some(EventStream::new(rx, Some(listener)))
    }

    /// Bridges one native pointer event into a stream
    pub async fn polygon_events(
        &self,
        id: &str,
        kind: OverlayEventKind,
    ) -> Option<EventStream<OverlayEvent>> {
        let polygon = self.polygons.native(id).await?;
        let (sink, rx) = event_channel(self.scope.clone());
        let listener = polygon.listen(kind, sink);
        Some(EventStream::new(rx, Some(listener)))
    }

    /// Resolved native handle, `None` for unknown ids
    pub async fn native(&self, id: &str) -> Option<Arc<dyn NativePolygon>> {
        self.polygons.native(id).await
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}
