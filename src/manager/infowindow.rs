//! Info window lifecycle
//!
//! Info windows follow the standard entity lifecycle and can anchor to a
//! marker owned by the marker manager; the anchor resolves before the open
//! operation is queued.

use crate::api::events::{event_channel, EventScope, EventStream};
use crate::api::handle::MapHandle;
use crate::api::NativeInfoWindow;
use crate::core::options::{InfoWindowDelta, InfoWindowOptions};
use crate::event::InfoWindowEvent;
use crate::manager::lifecycle::{EntityId, EntityLifecycle};
use crate::manager::marker::MarkerManager;
use std::future::Future;
use std::sync::Arc;

/// Owns native info window overlays
pub struct InfoWindowManager {
    map: MapHandle,
    scope: Arc<dyn EventScope>,
    markers: Arc<MarkerManager>,
    windows: EntityLifecycle<Arc<dyn NativeInfoWindow>>,
}

impl InfoWindowManager {
    pub fn new(map: MapHandle, scope: Arc<dyn EventScope>, markers: Arc<MarkerManager>) -> Self {
        Self {
            map,
            scope,
            markers,
            windows: EntityLifecycle::new(),
        }
    }

    /// Registers a declared info window
    pub fn add_info_window(&self, id: EntityId, options: InfoWindowOptions) {
        let map = self.map.clone();
        self.windows.insert(id, async move {
            let api = map.get_map().await;
            api.create_info_window(options).await
        });
    }

    /// Forwards only the changed fields. No-op for unknown ids.
    pub fn update_info_window(&self, id: &str, delta: InfoWindowDelta) -> bool {
        if delta.is_empty() {
            return false;
        }
        self.windows.apply(id, move |window| window.apply(&delta))
    }

    /// Opens the window, anchored to a marker when `host_marker` names one.
    /// An unknown marker id opens the window free-standing.
    pub async fn open(&self, id: &str, host_marker: Option<&str>) {
        let anchor = match host_marker {
            Some(marker_id) => {
                let anchor = self.markers.native(marker_id).await;
                if anchor.is_none() {
                    log::debug!("info window `{id}` host marker `{marker_id}` is not registered");
                }
                anchor
            }
            None => None,
        };
        self.windows.apply(id, move |window| window.open(anchor));
    }

    /// Closes the window. No-op for unknown ids.
    pub fn close(&self, id: &str) -> bool {
        self.windows.apply(id, |window| window.close())
    }

    /// Tears the window down; completes once closed. Idempotent.
    pub fn delete_info_window(&self, id: &str) -> impl Future<Output = ()> + Send + 'static {
        self.windows.remove(id, |window| window.close())
    }

    /// Stream of close-click events, `None` for unknown ids
    pub async fn info_window_events(&self, id: &str) -> Option<EventStream<InfoWindowEvent>> {
        let window = self.windows.native(id).await?;
        let (sink, rx) = event_channel(self.scope.clone());
        let listener = window.listen(sink);
        Some(EventStream::new(rx, Some(listener)))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
