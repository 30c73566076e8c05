//! Event payloads emitted by native overlays and re-exposed as streams

use crate::core::geo::{LatLng, LatLngBounds};
use crate::core::options::ShapeKind;
use serde::{Deserialize, Serialize};

/// Pointer interactions shared by markers and polygons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayEventKind {
    Click,
    DoubleClick,
    RightClick,
    DragStart,
    Drag,
    DragEnd,
    MouseOver,
    MouseOut,
}

/// A pointer interaction with an overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayEvent {
    pub kind: OverlayEventKind,
    /// Geographic position of the pointer, when the native event carries one
    pub position: Option<LatLng>,
}

/// Events fired by the clustering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterEventKind {
    Click,
    MouseOver,
    MouseOut,
    ClusteringBegin,
    ClusteringEnd,
}

/// A clustering-engine event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvent {
    pub kind: ClusterEventKind,
    /// Number of markers in the affected cluster, zero for engine-wide events
    pub size: usize,
    pub center: Option<LatLng>,
}

/// Kinds of mutation a polygon ring can undergo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathEventKind {
    Insert,
    Remove,
    Set,
}

/// A mutation of one polygon ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEvent {
    pub kind: PathEventKind,
    /// Which ring changed; ring 0 is the outer boundary
    pub ring: usize,
    /// Index of the affected element within the ring
    pub index: usize,
    /// Previous value for element-level changes (`Remove` and `Set`)
    pub previous: Option<LatLng>,
    /// Snapshot of the ring after the change
    pub path: Vec<LatLng>,
}

/// A shape the user finished drawing interactively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeComplete {
    Circle { center: LatLng, radius: f64 },
    Marker { position: LatLng },
    Polygon { paths: Vec<Vec<LatLng>> },
    Polyline { path: Vec<LatLng> },
    Rectangle { bounds: LatLngBounds },
    /// Generic completion for overlays reported without a payload
    Overlay { kind: ShapeKind },
}

impl ShapeComplete {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Marker { .. } => ShapeKind::Marker,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Polyline { .. } => ShapeKind::Polyline,
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Overlay { kind } => *kind,
        }
    }
}

/// Events fired by an info window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoWindowEvent {
    CloseClick,
}
