//! Prelude module for common mapbind types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapbind::prelude::*;`

pub use crate::core::{
    config::{ClusterProfile, OverlayDefaults},
    geo::{LatLng, LatLngBounds},
    options::{
        ChangeSet, ClusterCalculator, ClusterDelta, ClusterIcon, ClusterOptions, ClusterStyle,
        ControlPosition, DrawingDelta, DrawingOptions, InfoWindowDelta, InfoWindowOptions,
        MarkerDelta, MarkerOptions, PolygonDelta, PolygonOptions, ShapeKind, ShapeStyle,
    },
};

pub use crate::api::{
    events::{event_channel, CallerScope, EventScope, EventSink, EventStream, ListenerHandle},
    handle::{Completer, MapCompleter, MapHandle, Ready},
    Clusterer, DrawingController, MapApi, NativeInfoWindow, NativeMarker, NativePolygon,
};

pub use crate::event::{
    ClusterEvent, ClusterEventKind, InfoWindowEvent, OverlayEvent, OverlayEventKind, PathEvent,
    PathEventKind, ShapeComplete,
};

pub use crate::manager::{
    cluster::ClusterManager,
    drawing::DrawingManager,
    infowindow::InfoWindowManager,
    lifecycle::{EntityId, EntityLifecycle},
    marker::{MarkerHost, MarkerManager},
    polygon::PolygonManager,
};

pub use crate::adapter::{
    cluster::ClusterAdapter,
    drawing::DrawingAdapter,
    infowindow::InfoWindowAdapter,
    lifecycle::{BindingState, SubscriptionSet},
    marker::MarkerAdapter,
    polygon::PolygonAdapter,
};

pub use crate::{Error as BindError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Stream;
