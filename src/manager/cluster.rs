//! Cluster lifecycle: one clustering engine per declarative container
//!
//! The clusterer, not the map, owns visual placement of clustered markers;
//! native markers are created detached and handed to the engine. Marker
//! creation and clusterer construction race freely; the add-to-cluster step
//! waits on both, whichever finishes first.

use crate::api::events::{event_channel, EventScope, EventStream};
use crate::api::handle::{Completer, MapHandle, Ready};
use crate::api::{Clusterer, NativeMarker};
use crate::core::options::{
    ClusterCalculator, ClusterOptions, ClusterStyle, MarkerDelta, MarkerOptions,
};
use crate::event::{ClusterEvent, ClusterEventKind, OverlayEvent, OverlayEventKind};
use crate::manager::lifecycle::{EntityId, EntityLifecycle};
use crate::manager::marker::MarkerHost;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Owns the clustering engine of one `<cluster>` container and the native
/// markers living inside it.
pub struct ClusterManager {
    map: MapHandle,
    scope: Arc<dyn EventScope>,
    markers: EntityLifecycle<Arc<dyn NativeMarker>>,
    clusterer: Ready<Arc<dyn Clusterer>>,
    init_slot: Mutex<Option<Completer<Arc<dyn Clusterer>>>>,
}

impl ClusterManager {
    pub fn new(map: MapHandle, scope: Arc<dyn EventScope>) -> Self {
        let (completer, clusterer) = Ready::channel();
        Self {
            map,
            scope,
            markers: EntityLifecycle::new(),
            clusterer,
            init_slot: Mutex::new(Some(completer)),
        }
    }

    /// Constructs the clustering engine once the map resolves. Must be
    /// called exactly once per container lifetime; a second call reports
    /// [`Error::ClustererInitialized`]. Construction errors from the
    /// external engine propagate untranslated.
    pub async fn init(&self, options: ClusterOptions) -> Result<()> {
        let completer = self
            .init_slot
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(Error::ClustererInitialized)?;

        let api = self.map.get_map().await;
        let clusterer = api.create_clusterer(options).await?;
        completer.complete(clusterer);
        Ok(())
    }

    /// Waits for the clusterer; pends until `init` has run
    pub async fn clusterer(&self) -> Arc<dyn Clusterer> {
        self.clusterer.get().await
    }

    /// Resolved native handle for a clustered marker
    pub async fn native(&self, id: &str) -> Option<Arc<dyn NativeMarker>> {
        self.markers.native(id).await
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Tears down every clustered marker, then empties the engine
    pub async fn clear_markers(&self) {
        let removals: Vec<_> = self
            .markers
            .ids()
            .iter()
            .map(|id| self.markers.remove(id, |marker| marker.set_attached(false)))
            .collect();
        futures::future::join_all(removals).await;
        if let Some(clusterer) = self.clusterer.try_get() {
            clusterer.clear();
        }
    }

    // Option setters: each is a narrow, independently-awaited mutation of
    // the resolved engine, and a no-op when the value was not provided.

    pub async fn set_grid_size(&self, size: Option<u32>) {
        if let Some(size) = size {
            self.clusterer.get().await.set_grid_size(size);
        }
    }

    pub async fn set_max_zoom(&self, zoom: Option<u32>) {
        if let Some(zoom) = zoom {
            self.clusterer.get().await.set_max_zoom(zoom);
        }
    }

    pub async fn set_styles(&self, styles: Option<Vec<ClusterStyle>>) {
        if let Some(styles) = styles {
            self.clusterer.get().await.set_styles(styles);
        }
    }

    pub async fn set_average_center(&self, average_center: Option<bool>) {
        if let Some(average_center) = average_center {
            self.clusterer.get().await.set_average_center(average_center);
        }
    }

    pub async fn set_minimum_cluster_size(&self, size: Option<u32>) {
        if let Some(size) = size {
            self.clusterer.get().await.set_minimum_cluster_size(size);
        }
    }

    pub async fn set_image_path(&self, path: Option<String>) {
        if let Some(path) = path {
            self.clusterer.get().await.set_image_path(path);
        }
    }

    pub async fn set_image_extension(&self, extension: Option<String>) {
        if let Some(extension) = extension {
            self.clusterer.get().await.set_image_extension(extension);
        }
    }

    pub async fn set_zoom_on_click(&self, zoom_on_click: Option<bool>) {
        if let Some(zoom_on_click) = zoom_on_click {
            self.clusterer.get().await.set_zoom_on_click(zoom_on_click);
        }
    }

    pub async fn set_calculator(&self, calculator: Option<ClusterCalculator>) {
        if let Some(calculator) = calculator {
            self.clusterer.get().await.set_calculator(calculator);
        }
    }

    /// Bridges a native clusterer event into a stream. Emission re-enters
    /// the scope, so reactive consumers observe the event inside their own
    /// tracked scheduling rather than the engine's callback context.
    pub async fn cluster_events(&self, kind: ClusterEventKind) -> EventStream<ClusterEvent> {
        let clusterer = self.clusterer.get().await;
        let (sink, rx) = event_channel(self.scope.clone());
        let listener = clusterer.listen(kind, sink);
        EventStream::new(rx, Some(listener))
    }
}

#[async_trait]
impl MarkerHost for ClusterManager {
    fn add_marker(&self, id: EntityId, options: MarkerOptions) {
        let map = self.map.clone();
        let clusterer = self.clusterer.clone();
        self.markers.insert(id, async move {
            let api = map.get_map().await;
            // Creation and clusterer readiness race; adding to the engine
            // waits on both regardless of which side finishes first.
            let (marker, clusterer) =
                tokio::join!(api.create_marker(options, false), clusterer.get());
            let marker = marker?;
            clusterer.add_item(marker.clone());
            Ok(marker)
        });
    }

    fn update_marker(&self, id: &str, delta: MarkerDelta) -> bool {
        self.markers.apply(id, move |marker| marker.apply(&delta))
    }

    async fn delete_marker(&self, id: &str) {
        let clusterer = self.clusterer.clone();
        self.markers
            .remove(id, move |marker| {
                // Detach from the map context first so the marker leaves the
                // view before cluster bookkeeping is dropped.
                marker.set_attached(false);
                if let Some(clusterer) = clusterer.try_get() {
                    clusterer.remove_item(marker);
                }
            })
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
