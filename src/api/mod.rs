//! Contracts consumed from the external mapping stack
//!
//! The mapping API, the clustering engine and the drawing controller are
//! external collaborators; these traits describe exactly what the manager
//! layer needs from them and nothing more. The surface is injected through
//! a [`handle::MapHandle`] rather than read from ambient global state, so a
//! substitute implementation (see [`crate::testing`]) can stand in for the
//! real stack.
//!
//! Native handles are owned by their managers. The traits expose read
//! accessors and narrow setters only; nothing here allows a holder of a
//! handle to restructure a native object.

pub mod events;
pub mod handle;

use crate::core::geo::LatLng;
use crate::core::options::{
    ClusterCalculator, ClusterOptions, ClusterStyle, DrawingDelta, DrawingOptions,
    InfoWindowDelta, InfoWindowOptions, MarkerDelta, MarkerOptions, PolygonDelta, PolygonOptions,
};
use crate::event::{
    ClusterEvent, ClusterEventKind, InfoWindowEvent, OverlayEvent, OverlayEventKind, PathEvent,
    ShapeComplete,
};
use crate::Result;
use async_trait::async_trait;
use events::{EventSink, ListenerHandle};
use std::sync::Arc;

/// Asynchronous object-creation surface of the mapping API.
///
/// Construction is asynchronous because the native surface itself only
/// becomes available once the external API has loaded. Errors raised by the
/// external library (malformed options and the like) propagate untranslated.
#[async_trait]
pub trait MapApi: Send + Sync {
    /// Creates a native marker. `attach` controls whether the marker joins
    /// the map's own overlay set; cluster-managed markers are created
    /// detached because the clusterer owns their visual placement.
    async fn create_marker(
        &self,
        options: MarkerOptions,
        attach: bool,
    ) -> Result<Arc<dyn NativeMarker>>;

    async fn create_polygon(&self, options: PolygonOptions) -> Result<Arc<dyn NativePolygon>>;

    /// Constructs a clustering engine bound to this map with an empty
    /// initial item set.
    async fn create_clusterer(&self, options: ClusterOptions) -> Result<Arc<dyn Clusterer>>;

    async fn create_info_window(
        &self,
        options: InfoWindowOptions,
    ) -> Result<Arc<dyn NativeInfoWindow>>;

    /// Whether the drawing sub-library was loaded alongside the map API.
    /// A missing sub-library is a deployment issue, not a programming
    /// error; callers degrade instead of failing.
    fn drawing_supported(&self) -> bool;

    async fn create_drawing_controller(
        &self,
        options: DrawingOptions,
    ) -> Result<Arc<dyn DrawingController>>;
}

/// A native marker overlay
pub trait NativeMarker: Send + Sync {
    /// Applies only the fields present in the delta
    fn apply(&self, delta: &MarkerDelta);

    /// Attaches to or detaches from the map's overlay set
    fn set_attached(&self, attached: bool);

    fn is_attached(&self) -> bool;

    fn position(&self) -> LatLng;

    fn listen(&self, kind: OverlayEventKind, sink: EventSink<OverlayEvent>) -> ListenerHandle;
}

/// A native polygon overlay with one or more coordinate rings
pub trait NativePolygon: Send + Sync {
    fn apply(&self, delta: &PolygonDelta);

    fn set_attached(&self, attached: bool);

    fn is_attached(&self) -> bool;

    /// Current outer ring
    fn path(&self) -> Vec<LatLng>;

    /// All rings, outer ring first
    fn paths(&self) -> Vec<Vec<LatLng>>;

    fn listen(&self, kind: OverlayEventKind, sink: EventSink<OverlayEvent>) -> ListenerHandle;

    /// Subscribes to insertion/removal/mutation on any ring
    fn listen_paths(&self, sink: EventSink<PathEvent>) -> ListenerHandle;
}

/// The external clustering engine. Items are added and removed through the
/// engine, never directly on the map; the engine owns visual placement.
pub trait Clusterer: Send + Sync {
    fn add_item(&self, marker: Arc<dyn NativeMarker>);

    fn remove_item(&self, marker: &Arc<dyn NativeMarker>);

    fn clear(&self);

    fn set_grid_size(&self, size: u32);

    fn set_max_zoom(&self, zoom: u32);

    fn set_styles(&self, styles: Vec<ClusterStyle>);

    fn set_average_center(&self, average_center: bool);

    fn set_minimum_cluster_size(&self, size: u32);

    fn set_image_path(&self, path: String);

    fn set_image_extension(&self, extension: String);

    fn set_zoom_on_click(&self, zoom_on_click: bool);

    fn set_calculator(&self, calculator: ClusterCalculator);

    fn listen(&self, kind: ClusterEventKind, sink: EventSink<ClusterEvent>) -> ListenerHandle;
}

/// The native interactive drawing controller
pub trait DrawingController: Send + Sync {
    fn set_attached(&self, attached: bool);

    /// Applies all changed options in one native call
    fn apply(&self, delta: &DrawingDelta);

    /// Subscribes to shape-completion events for every overlay kind
    fn listen(&self, sink: EventSink<ShapeComplete>) -> ListenerHandle;
}

/// A native info window overlay
pub trait NativeInfoWindow: Send + Sync {
    fn apply(&self, delta: &InfoWindowDelta);

    /// Opens the window, optionally anchored to a marker
    fn open(&self, anchor: Option<Arc<dyn NativeMarker>>);

    fn close(&self);

    fn listen(&self, sink: EventSink<InfoWindowEvent>) -> ListenerHandle;
}
