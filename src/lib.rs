//! # mapbind
//!
//! Declarative overlay bindings for asynchronous map surfaces.
//!
//! This library bridges declarative overlay descriptions (markers, polygons,
//! cluster containers, drawing controllers, info windows) to an imperative,
//! callback-based mapping API that only becomes available asynchronously.
//! The mapping surface is injected as a trait object rather than looked up
//! as ambient global state, so every manager works against a substitute
//! implementation in tests.

pub mod adapter;
pub mod api;
pub mod core;
pub mod event;
pub mod manager;
pub mod prelude;
pub mod testing;

// Re-export public API
pub use crate::core::{
    config::{ClusterProfile, OverlayDefaults},
    geo::{LatLng, LatLngBounds},
};

pub use api::{
    events::{event_channel, CallerScope, EventScope, EventSink, EventStream, ListenerHandle},
    handle::{Completer, MapCompleter, MapHandle, Ready},
    Clusterer, DrawingController, MapApi, NativeInfoWindow, NativeMarker, NativePolygon,
};

pub use manager::{
    cluster::ClusterManager,
    drawing::DrawingManager,
    infowindow::InfoWindowManager,
    lifecycle::{EntityId, EntityLifecycle},
    marker::{MarkerHost, MarkerManager},
    polygon::PolygonManager,
};

pub use adapter::{
    cluster::ClusterAdapter, drawing::DrawingAdapter, infowindow::InfoWindowAdapter,
    marker::MarkerAdapter, polygon::PolygonAdapter,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, BindError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("clusterer already initialized for this container")]
    ClustererInitialized,

    #[error("map surface error: {0}")]
    Surface(String),
}

/// Error type alias for convenience
pub type Error = BindError;
