//! Enumerated option and delta structs for every overlay kind.
//!
//! The external mapping surface accepts partial option bags; this module
//! expresses those bags as structs with named optional fields instead of
//! maps with arbitrary keys. A `*Delta` value carries only what changed:
//! `None` means "not provided", and on doubly-optional fields `Some(None)`
//! means "explicitly cleared" - the two are never conflated.
//!
//! Change sets arriving from the declarative layer are keyed by bound field
//! name; `from_change_set` converts them by explicit key enumeration, so a
//! key outside the accepted set is dropped rather than forwarded.

use crate::core::geo::LatLng;
use crate::prelude::HashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Bound field name to new value, as reported by the declarative layer
/// for one change-detection pass.
pub type ChangeSet = HashMap<String, Value>;

fn typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

/// `null` means the field was explicitly cleared, not that it was absent.
fn cleared<T: DeserializeOwned>(value: &Value) -> Option<Option<T>> {
    if value.is_null() {
        Some(None)
    } else {
        typed(value).map(Some)
    }
}

/// Accepts either a single ring or an array of rings.
fn parse_paths(value: &Value) -> Option<Vec<Vec<LatLng>>> {
    if let Ok(rings) = serde_json::from_value::<Vec<Vec<LatLng>>>(value.clone()) {
        return Some(rings);
    }
    serde_json::from_value::<Vec<LatLng>>(value.clone())
        .ok()
        .map(|ring| vec![ring])
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Declared state of a marker overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub title: Option<String>,
    pub label: Option<String>,
    pub icon_url: Option<String>,
    pub draggable: bool,
    pub clickable: bool,
    pub visible: bool,
    pub opacity: f64,
    pub z_index: Option<i32>,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            position: LatLng::default(),
            title: None,
            label: None,
            icon_url: None,
            draggable: false,
            clickable: true,
            visible: true,
            opacity: 1.0,
            z_index: None,
        }
    }
}

impl MarkerOptions {
    /// Folds a delta into the declared state
    pub fn merge(&mut self, delta: &MarkerDelta) {
        if let Some(position) = delta.position {
            self.position = position;
        }
        if let Some(title) = &delta.title {
            self.title = title.clone();
        }
        if let Some(label) = &delta.label {
            self.label = label.clone();
        }
        if let Some(icon_url) = &delta.icon_url {
            self.icon_url = icon_url.clone();
        }
        if let Some(draggable) = delta.draggable {
            self.draggable = draggable;
        }
        if let Some(clickable) = delta.clickable {
            self.clickable = clickable;
        }
        if let Some(visible) = delta.visible {
            self.visible = visible;
        }
        if let Some(opacity) = delta.opacity {
            self.opacity = opacity;
        }
        if let Some(z_index) = delta.z_index {
            self.z_index = z_index;
        }
    }
}

/// Changed marker fields for one update cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDelta {
    pub position: Option<LatLng>,
    pub title: Option<Option<String>>,
    pub label: Option<Option<String>>,
    pub icon_url: Option<Option<String>>,
    pub draggable: Option<bool>,
    pub clickable: Option<bool>,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub z_index: Option<Option<i32>>,
}

impl MarkerDelta {
    pub fn is_empty(&self) -> bool {
        *self == MarkerDelta::default()
    }

    /// Builds a delta from a change set. Latitude and longitude arrive as
    /// separate bound fields; the missing half is taken from `base`.
    pub fn from_change_set(changes: &ChangeSet, base: &MarkerOptions) -> Self {
        let mut delta = MarkerDelta::default();
        for (key, value) in changes {
            match key.as_str() {
                // combined below
                "latitude" | "longitude" => {}
                "title" => delta.title = cleared(value),
                "label" => delta.label = cleared(value),
                "iconUrl" => delta.icon_url = cleared(value),
                "draggable" => delta.draggable = typed(value),
                "clickable" => delta.clickable = typed(value),
                "visible" => delta.visible = typed(value),
                "opacity" => delta.opacity = typed(value),
                "zIndex" => delta.z_index = cleared(value),
                other => log::trace!("dropping unknown marker binding `{other}`"),
            }
        }
        if changes.contains_key("latitude") || changes.contains_key("longitude") {
            let lat = changes
                .get("latitude")
                .and_then(typed::<f64>)
                .unwrap_or(base.position.lat);
            let lng = changes
                .get("longitude")
                .and_then(typed::<f64>)
                .unwrap_or(base.position.lng);
            delta.position = Some(LatLng::new(lat, lng));
        }
        delta
    }
}

// ---------------------------------------------------------------------------
// Polygons
// ---------------------------------------------------------------------------

/// Declared state of a polygon overlay. `paths` holds one or more rings;
/// rings past the first describe holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolygonOptions {
    pub paths: Vec<Vec<LatLng>>,
    pub clickable: bool,
    pub draggable: bool,
    pub editable: bool,
    pub geodesic: bool,
    pub visible: bool,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub stroke_color: Option<String>,
    pub stroke_opacity: Option<f64>,
    pub stroke_weight: Option<f64>,
    pub icon: Option<String>,
    pub z_index: Option<i32>,
}

impl Default for PolygonOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            clickable: true,
            draggable: false,
            editable: false,
            geodesic: false,
            visible: true,
            fill_color: None,
            fill_opacity: None,
            stroke_color: None,
            stroke_opacity: None,
            stroke_weight: None,
            icon: None,
            z_index: None,
        }
    }
}

impl PolygonOptions {
    pub fn merge(&mut self, delta: &PolygonDelta) {
        if let Some(paths) = &delta.paths {
            self.paths = paths.clone();
        }
        if let Some(clickable) = delta.clickable {
            self.clickable = clickable;
        }
        if let Some(draggable) = delta.draggable {
            self.draggable = draggable;
        }
        if let Some(editable) = delta.editable {
            self.editable = editable;
        }
        if let Some(geodesic) = delta.geodesic {
            self.geodesic = geodesic;
        }
        if let Some(visible) = delta.visible {
            self.visible = visible;
        }
        if let Some(fill_color) = &delta.fill_color {
            self.fill_color = fill_color.clone();
        }
        if let Some(fill_opacity) = delta.fill_opacity {
            self.fill_opacity = fill_opacity;
        }
        if let Some(stroke_color) = &delta.stroke_color {
            self.stroke_color = stroke_color.clone();
        }
        if let Some(stroke_opacity) = delta.stroke_opacity {
            self.stroke_opacity = stroke_opacity;
        }
        if let Some(stroke_weight) = delta.stroke_weight {
            self.stroke_weight = stroke_weight;
        }
        if let Some(icon) = &delta.icon {
            self.icon = icon.clone();
        }
        if let Some(z_index) = delta.z_index {
            self.z_index = z_index;
        }
    }
}

/// Changed polygon fields for one update cycle. The field set is the
/// accepted whitelist; anything else in a change set is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonDelta {
    pub paths: Option<Vec<Vec<LatLng>>>,
    pub clickable: Option<bool>,
    pub draggable: Option<bool>,
    pub editable: Option<bool>,
    pub geodesic: Option<bool>,
    pub visible: Option<bool>,
    pub fill_color: Option<Option<String>>,
    pub fill_opacity: Option<Option<f64>>,
    pub stroke_color: Option<Option<String>>,
    pub stroke_opacity: Option<Option<f64>>,
    pub stroke_weight: Option<Option<f64>>,
    pub icon: Option<Option<String>>,
    pub z_index: Option<Option<i32>>,
    /// The `map` binding: `Some(false)` detaches, `Some(true)` re-attaches.
    pub attached: Option<bool>,
}

impl PolygonDelta {
    pub fn is_empty(&self) -> bool {
        *self == PolygonDelta::default()
    }

    pub fn from_change_set(changes: &ChangeSet) -> Self {
        let mut delta = PolygonDelta::default();
        for (key, value) in changes {
            match key.as_str() {
                "paths" => delta.paths = parse_paths(value),
                "clickable" => delta.clickable = typed(value),
                "draggable" => delta.draggable = typed(value),
                "editable" => delta.editable = typed(value),
                "geodesic" => delta.geodesic = typed(value),
                "visible" => delta.visible = typed(value),
                "fillColor" => delta.fill_color = cleared(value),
                "fillOpacity" => delta.fill_opacity = cleared(value),
                "strokeColor" => delta.stroke_color = cleared(value),
                "strokeOpacity" => delta.stroke_opacity = cleared(value),
                "strokeWeight" => delta.stroke_weight = cleared(value),
                "icon" => delta.icon = cleared(value),
                "zIndex" => delta.z_index = cleared(value),
                "map" => delta.attached = Some(!value.is_null()),
                other => log::trace!("dropping unknown polygon binding `{other}`"),
            }
        }
        delta
    }
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

/// One visual style tier of the clusterer icon set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStyle {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub text_color: Option<String>,
    pub text_size: Option<u32>,
    pub background_position: Option<String>,
}

/// Icon choice produced by a cluster calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterIcon {
    pub text: String,
    /// 1-based index into the style tiers
    pub index: usize,
}

/// Custom mapping from (marker count, style tier count) to a cluster icon
#[derive(Clone)]
pub struct ClusterCalculator(Arc<dyn Fn(usize, usize) -> ClusterIcon + Send + Sync>);

impl ClusterCalculator {
    pub fn new(f: impl Fn(usize, usize) -> ClusterIcon + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, count: usize, num_styles: usize) -> ClusterIcon {
        (self.0)(count, num_styles)
    }
}

impl fmt::Debug for ClusterCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClusterCalculator")
    }
}

/// Tunable parameters of the clustering engine. Every field is optional:
/// an unset field leaves the engine's own default in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterOptions {
    pub grid_size: Option<u32>,
    pub max_zoom: Option<u32>,
    pub styles: Option<Vec<ClusterStyle>>,
    pub average_center: Option<bool>,
    pub minimum_cluster_size: Option<u32>,
    pub image_path: Option<String>,
    pub image_extension: Option<String>,
    pub zoom_on_click: Option<bool>,
    #[serde(skip)]
    pub calculator: Option<ClusterCalculator>,
}

impl ClusterOptions {
    pub fn merge(&mut self, delta: &ClusterDelta) {
        if let Some(grid_size) = delta.grid_size {
            self.grid_size = Some(grid_size);
        }
        if let Some(max_zoom) = delta.max_zoom {
            self.max_zoom = Some(max_zoom);
        }
        if let Some(styles) = &delta.styles {
            self.styles = Some(styles.clone());
        }
        if let Some(average_center) = delta.average_center {
            self.average_center = Some(average_center);
        }
        if let Some(minimum_cluster_size) = delta.minimum_cluster_size {
            self.minimum_cluster_size = Some(minimum_cluster_size);
        }
        if let Some(image_path) = &delta.image_path {
            self.image_path = Some(image_path.clone());
        }
        if let Some(image_extension) = &delta.image_extension {
            self.image_extension = Some(image_extension.clone());
        }
        if let Some(zoom_on_click) = delta.zoom_on_click {
            self.zoom_on_click = Some(zoom_on_click);
        }
    }
}

/// Changed clusterer tunables for one update cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterDelta {
    pub grid_size: Option<u32>,
    pub max_zoom: Option<u32>,
    pub styles: Option<Vec<ClusterStyle>>,
    pub average_center: Option<bool>,
    pub minimum_cluster_size: Option<u32>,
    pub image_path: Option<String>,
    pub image_extension: Option<String>,
    pub zoom_on_click: Option<bool>,
}

impl ClusterDelta {
    pub fn is_empty(&self) -> bool {
        *self == ClusterDelta::default()
    }

    pub fn from_change_set(changes: &ChangeSet) -> Self {
        let mut delta = ClusterDelta::default();
        for (key, value) in changes {
            match key.as_str() {
                "gridSize" => delta.grid_size = typed(value),
                "maxZoom" => delta.max_zoom = typed(value),
                "styles" => delta.styles = typed(value),
                "averageCenter" => delta.average_center = typed(value),
                "minimumClusterSize" => delta.minimum_cluster_size = typed(value),
                "imagePath" => delta.image_path = typed(value),
                "imageExtension" => delta.image_extension = typed(value),
                "zoomOnClick" => delta.zoom_on_click = typed(value),
                other => log::trace!("dropping unknown cluster binding `{other}`"),
            }
        }
        delta
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Overlay kinds an interactive drawing controller can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Marker,
    Polygon,
    Polyline,
    Rectangle,
}

/// Placement of the drawing control on the map surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlPosition {
    TopLeft,
    TopCenter,
    TopRight,
    LeftTop,
    LeftCenter,
    LeftBottom,
    RightTop,
    RightCenter,
    RightBottom,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Shared style bag for drawn circle/polyline/rectangle/polygon overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeStyle {
    pub clickable: bool,
    pub editable: bool,
    pub visible: bool,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub stroke_color: Option<String>,
    pub stroke_opacity: Option<f64>,
    pub stroke_weight: Option<f64>,
    pub z_index: Option<i32>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            clickable: true,
            editable: false,
            visible: true,
            fill_color: None,
            fill_opacity: None,
            stroke_color: None,
            stroke_opacity: None,
            stroke_weight: None,
            z_index: None,
        }
    }
}

/// Declared state of the interactive drawing controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawingOptions {
    /// Currently armed tool; `None` is the pan/select hand
    pub drawing_mode: Option<ShapeKind>,
    pub drawing_control: bool,
    pub control_position: Option<ControlPosition>,
    pub control_modes: Vec<ShapeKind>,
    pub marker_options: Option<MarkerOptions>,
    pub circle_options: Option<ShapeStyle>,
    pub polygon_options: Option<ShapeStyle>,
    pub polyline_options: Option<ShapeStyle>,
    pub rectangle_options: Option<ShapeStyle>,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self {
            drawing_mode: None,
            drawing_control: true,
            control_position: None,
            control_modes: Vec::new(),
            marker_options: None,
            circle_options: None,
            polygon_options: None,
            polyline_options: None,
            rectangle_options: None,
        }
    }
}

impl DrawingOptions {
    pub fn merge(&mut self, delta: &DrawingDelta) {
        if let Some(drawing_mode) = delta.drawing_mode {
            self.drawing_mode = drawing_mode;
        }
        if let Some(drawing_control) = delta.drawing_control {
            self.drawing_control = drawing_control;
        }
        if let Some(control_position) = delta.control_position {
            self.control_position = Some(control_position);
        }
        if let Some(control_modes) = &delta.control_modes {
            self.control_modes = control_modes.clone();
        }
        if let Some(marker_options) = &delta.marker_options {
            self.marker_options = Some(marker_options.clone());
        }
        if let Some(circle_options) = &delta.circle_options {
            self.circle_options = Some(circle_options.clone());
        }
        if let Some(polygon_options) = &delta.polygon_options {
            self.polygon_options = Some(polygon_options.clone());
        }
        if let Some(polyline_options) = &delta.polyline_options {
            self.polyline_options = Some(polyline_options.clone());
        }
        if let Some(rectangle_options) = &delta.rectangle_options {
            self.rectangle_options = Some(rectangle_options.clone());
        }
    }
}

/// Changed drawing-controller fields, applied as one native patch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingDelta {
    pub drawing_mode: Option<Option<ShapeKind>>,
    pub drawing_control: Option<bool>,
    pub control_position: Option<ControlPosition>,
    pub control_modes: Option<Vec<ShapeKind>>,
    pub marker_options: Option<MarkerOptions>,
    pub circle_options: Option<ShapeStyle>,
    pub polygon_options: Option<ShapeStyle>,
    pub polyline_options: Option<ShapeStyle>,
    pub rectangle_options: Option<ShapeStyle>,
}

impl DrawingDelta {
    pub fn is_empty(&self) -> bool {
        *self == DrawingDelta::default()
    }

    pub fn from_change_set(changes: &ChangeSet) -> Self {
        let mut delta = DrawingDelta::default();
        for (key, value) in changes {
            match key.as_str() {
                "drawingMode" => delta.drawing_mode = cleared(value),
                "drawingControl" => delta.drawing_control = typed(value),
                "drawingControlPosition" => delta.control_position = typed(value),
                "drawingModes" => delta.control_modes = typed(value),
                "markerOptions" => delta.marker_options = typed(value),
                "circleOptions" => delta.circle_options = typed(value),
                "polygonOptions" => delta.polygon_options = typed(value),
                "polylineOptions" => delta.polyline_options = typed(value),
                "rectangleOptions" => delta.rectangle_options = typed(value),
                other => log::trace!("dropping unknown drawing binding `{other}`"),
            }
        }
        delta
    }
}

// ---------------------------------------------------------------------------
// Info windows
// ---------------------------------------------------------------------------

/// Declared state of an info window overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfoWindowOptions {
    pub content: String,
    /// Free-standing position; ignored while anchored to a marker
    pub position: Option<LatLng>,
    pub max_width: Option<u32>,
    pub z_index: Option<i32>,
    pub disable_auto_pan: bool,
}

impl InfoWindowOptions {
    pub fn merge(&mut self, delta: &InfoWindowDelta) {
        if let Some(content) = &delta.content {
            self.content = content.clone();
        }
        if let Some(position) = delta.position {
            self.position = Some(position);
        }
        if let Some(max_width) = delta.max_width {
            self.max_width = max_width;
        }
        if let Some(z_index) = delta.z_index {
            self.z_index = z_index;
        }
        if let Some(disable_auto_pan) = delta.disable_auto_pan {
            self.disable_auto_pan = disable_auto_pan;
        }
    }
}

/// Changed info window fields for one update cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoWindowDelta {
    pub content: Option<String>,
    pub position: Option<LatLng>,
    pub max_width: Option<Option<u32>>,
    pub z_index: Option<Option<i32>>,
    pub disable_auto_pan: Option<bool>,
}

impl InfoWindowDelta {
    pub fn is_empty(&self) -> bool {
        *self == InfoWindowDelta::default()
    }

    pub fn from_change_set(changes: &ChangeSet, base: &InfoWindowOptions) -> Self {
        let mut delta = InfoWindowDelta::default();
        for (key, value) in changes {
            match key.as_str() {
                "latitude" | "longitude" => {}
                "content" => delta.content = typed(value),
                "maxWidth" => delta.max_width = cleared(value),
                "zIndex" => delta.z_index = cleared(value),
                "disableAutoPan" => delta.disable_auto_pan = typed(value),
                other => log::trace!("dropping unknown info window binding `{other}`"),
            }
        }
        if changes.contains_key("latitude") || changes.contains_key("longitude") {
            let base_position = base.position.unwrap_or_default();
            let lat = changes
                .get("latitude")
                .and_then(typed::<f64>)
                .unwrap_or(base_position.lat);
            let lng = changes
                .get("longitude")
                .and_then(typed::<f64>)
                .unwrap_or(base_position.lng);
            delta.position = Some(LatLng::new(lat, lng));
        }
        delta
    }
}
