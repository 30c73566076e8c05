//! Substitute mapping surface
//!
//! A full in-memory implementation of the external-surface traits for tests
//! and headless use. Native fakes record attachment changes, applied deltas
//! and clusterer membership; creation can be gated so tests script the
//! resolution order, and listener registrations and disposals are counted
//! globally for leak assertions.

use crate::api::events::{EventScope, EventSink, ListenerHandle};
use crate::api::handle::{Completer, Ready};
use crate::api::{
    Clusterer, DrawingController, MapApi, NativeInfoWindow, NativeMarker, NativePolygon,
};
use crate::core::geo::LatLng;
use crate::core::options::{
    ClusterCalculator, ClusterOptions, ClusterStyle, DrawingDelta, DrawingOptions,
    InfoWindowDelta, InfoWindowOptions, MarkerDelta, MarkerOptions, PolygonDelta, PolygonOptions,
};
use crate::event::{
    ClusterEvent, ClusterEventKind, InfoWindowEvent, OverlayEvent, OverlayEventKind, PathEvent,
    PathEventKind, ShapeComplete,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ListenerCounters {
    subscribed: AtomicUsize,
    disposed: AtomicUsize,
}

/// Listener registry shared by the fakes; counts every registration and
/// disposal against the surface-wide counters.
struct Emitter<K, T> {
    listeners: Arc<Mutex<Vec<(u64, K, EventSink<T>)>>>,
    next_id: Arc<AtomicU64>,
    counters: Arc<ListenerCounters>,
}

impl<K, T> Emitter<K, T>
where
    K: PartialEq + Copy + Send + 'static,
    T: Clone + Send + 'static,
{
    fn new(counters: Arc<ListenerCounters>) -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            counters,
        }
    }

    fn listen(&self, kind: K, sink: EventSink<T>) -> ListenerHandle {
        self.counters.subscribed.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, kind, sink));
        }
        let listeners = self.listeners.clone();
        let counters = self.counters.clone();
        ListenerHandle::new(move || {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.retain(|(listener_id, _, _)| *listener_id != id);
            }
            counters.disposed.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn emit(&self, kind: K, event: T) {
        let sinks: Vec<EventSink<T>> = self
            .listeners
            .lock()
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|(_, listener_kind, _)| *listener_kind == kind)
                    .map(|(_, _, sink)| sink.clone())
                    .collect()
            })
            .unwrap_or_default();
        for sink in sinks {
            sink.emit(event.clone());
        }
    }
}

/// Recordable native marker
pub struct FakeMarker {
    options: Mutex<MarkerOptions>,
    attached: AtomicBool,
    detach_calls: AtomicUsize,
    deltas: Mutex<Vec<MarkerDelta>>,
    events: Emitter<OverlayEventKind, OverlayEvent>,
}

impl FakeMarker {
    fn new(options: MarkerOptions, attached: bool, counters: Arc<ListenerCounters>) -> Self {
        Self {
            options: Mutex::new(options),
            attached: AtomicBool::new(attached),
            detach_calls: AtomicUsize::new(0),
            deltas: Mutex::new(Vec::new()),
            events: Emitter::new(counters),
        }
    }

    pub fn options(&self) -> MarkerOptions {
        self.options.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Deltas applied through the setter surface, in order
    pub fn deltas(&self) -> Vec<MarkerDelta> {
        self.deltas.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls.load(Ordering::SeqCst)
    }

    /// Fires a native pointer event, as the external library would
    pub fn emit(&self, event: OverlayEvent) {
        self.events.emit(event.kind, event);
    }
}

impl NativeMarker for FakeMarker {
    fn apply(&self, delta: &MarkerDelta) {
        if let Ok(mut options) = self.options.lock() {
            options.merge(delta);
        }
        if let Ok(mut deltas) = self.deltas.lock() {
            deltas.push(delta.clone());
        }
    }

    fn set_attached(&self, attached: bool) {
        if !attached {
            self.detach_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.attached.store(attached, Ordering::SeqCst);
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn position(&self) -> LatLng {
        self.options
            .lock()
            .map(|options| options.position)
            .unwrap_or_default()
    }

    fn listen(&self, kind: OverlayEventKind, sink: EventSink<OverlayEvent>) -> ListenerHandle {
        self.events.listen(kind, sink)
    }
}

/// Recordable native polygon with mutable rings
pub struct FakePolygon {
    options: Mutex<PolygonOptions>,
    attached: AtomicBool,
    detach_calls: AtomicUsize,
    deltas: Mutex<Vec<PolygonDelta>>,
    path_events: Emitter<(), PathEvent>,
    events: Emitter<OverlayEventKind, OverlayEvent>,
}

impl FakePolygon {
    fn new(options: PolygonOptions, counters: Arc<ListenerCounters>) -> Self {
        Self {
            options: Mutex::new(options),
            attached: AtomicBool::new(true),
            detach_calls: AtomicUsize::new(0),
            deltas: Mutex::new(Vec::new()),
            path_events: Emitter::new(counters.clone()),
            events: Emitter::new(counters),
        }
    }

    pub fn deltas(&self) -> Vec<PolygonDelta> {
        self.deltas.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls.load(Ordering::SeqCst)
    }

    /// Simulates the user inserting a vertex into a ring
    pub fn insert_vertex(&self, ring: usize, index: usize, vertex: LatLng) {
        let Ok(mut options) = self.options.lock() else {
            return;
        };
        let Some(ring_path) = options.paths.get_mut(ring) else {
            return;
        };
        let index = index.min(ring_path.len());
        ring_path.insert(index, vertex);
        let path = ring_path.clone();
        drop(options);
        self.path_events.emit(
            (),
            PathEvent {
                kind: PathEventKind::Insert,
                ring,
                index,
                previous: None,
                path,
            },
        );
    }

    /// Simulates the user removing a vertex from a ring
    pub fn remove_vertex(&self, ring: usize, index: usize) {
        let Ok(mut options) = self.options.lock() else {
            return;
        };
        let Some(ring_path) = options.paths.get_mut(ring) else {
            return;
        };
        if index >= ring_path.len() {
            return;
        }
        let previous = ring_path.remove(index);
        let path = ring_path.clone();
        drop(options);
        self.path_events.emit(
            (),
            PathEvent {
                kind: PathEventKind::Remove,
                ring,
                index,
                previous: Some(previous),
                path,
            },
        );
    }

    /// Simulates the user moving a vertex of a ring
    pub fn set_vertex(&self, ring: usize, index: usize, vertex: LatLng) {
        let Ok(mut options) = self.options.lock() else {
            return;
        };
        let Some(ring_path) = options.paths.get_mut(ring) else {
            return;
        };
        let Some(slot) = ring_path.get_mut(index) else {
            return;
        };
        let previous = std::mem::replace(slot, vertex);
        let path = ring_path.clone();
        drop(options);
        self.path_events.emit(
            (),
            PathEvent {
                kind: PathEventKind::Set,
                ring,
                index,
                previous: Some(previous),
                path,
            },
        );
    }

    pub fn emit(&self, event: OverlayEvent) {
        self.events.emit(event.kind, event);
    }
}

impl NativePolygon for FakePolygon {
    fn apply(&self, delta: &PolygonDelta) {
        if let Ok(mut options) = self.options.lock() {
            options.merge(delta);
        }
        if let Some(attached) = delta.attached {
            self.set_attached(attached);
        }
        if let Ok(mut deltas) = self.deltas.lock() {
            deltas.push(delta.clone());
        }
    }

    fn set_attached(&self, attached: bool) {
        if !attached {
            self.detach_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.attached.store(attached, Ordering::SeqCst);
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn path(&self) -> Vec<LatLng> {
        self.options
            .lock()
            .ok()
            .and_then(|options| options.paths.first().cloned())
            .unwrap_or_default()
    }

    fn paths(&self) -> Vec<Vec<LatLng>> {
        self.options
            .lock()
            .map(|options| options.paths.clone())
            .unwrap_or_default()
    }

    fn listen(&self, kind: OverlayEventKind, sink: EventSink<OverlayEvent>) -> ListenerHandle {
        self.events.listen(kind, sink)
    }

    fn listen_paths(&self, sink: EventSink<PathEvent>) -> ListenerHandle {
        self.path_events.listen((), sink)
    }
}

/// One recorded clusterer setter invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterSetterCall {
    GridSize(u32),
    MaxZoom(u32),
    Styles(usize),
    AverageCenter(bool),
    MinimumClusterSize(u32),
    ImagePath(String),
    ImageExtension(String),
    ZoomOnClick(bool),
    Calculator,
}

/// Recordable clustering engine
pub struct FakeClusterer {
    options: Mutex<ClusterOptions>,
    items: Mutex<Vec<Arc<dyn NativeMarker>>>,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    clear_calls: AtomicUsize,
    setter_calls: Mutex<Vec<ClusterSetterCall>>,
    events: Emitter<ClusterEventKind, ClusterEvent>,
}

impl FakeClusterer {
    fn new(options: ClusterOptions, counters: Arc<ListenerCounters>) -> Self {
        Self {
            options: Mutex::new(options),
            items: Mutex::new(Vec::new()),
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
            setter_calls: Mutex::new(Vec::new()),
            events: Emitter::new(counters),
        }
    }

    pub fn options(&self) -> ClusterOptions {
        self.options.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn items_len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn contains(&self, marker: &Arc<dyn NativeMarker>) -> bool {
        self.items
            .lock()
            .map(|items| items.iter().any(|item| Arc::ptr_eq(item, marker)))
            .unwrap_or(false)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn setter_calls(&self) -> Vec<ClusterSetterCall> {
        self.setter_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: ClusterSetterCall) {
        if let Ok(mut calls) = self.setter_calls.lock() {
            calls.push(call);
        }
    }

    /// Fires a native clusterer event, as the external engine would
    pub fn emit(&self, event: ClusterEvent) {
        self.events.emit(event.kind, event);
    }
}

impl Clusterer for FakeClusterer {
    fn add_item(&self, marker: Arc<dyn NativeMarker>) {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut items) = self.items.lock() {
            items.push(marker);
        }
    }

    fn remove_item(&self, marker: &Arc<dyn NativeMarker>) {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut items) = self.items.lock() {
            items.retain(|item| !Arc::ptr_eq(item, marker));
        }
    }

    fn clear(&self) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut items) = self.items.lock() {
            items.clear();
        }
    }

    fn set_grid_size(&self, size: u32) {
        if let Ok(mut options) = self.options.lock() {
            options.grid_size = Some(size);
        }
        self.record(ClusterSetterCall::GridSize(size));
    }

    fn set_max_zoom(&self, zoom: u32) {
        if let Ok(mut options) = self.options.lock() {
            options.max_zoom = Some(zoom);
        }
        self.record(ClusterSetterCall::MaxZoom(zoom));
    }

    fn set_styles(&self, styles: Vec<ClusterStyle>) {
        self.record(ClusterSetterCall::Styles(styles.len()));
        if let Ok(mut options) = self.options.lock() {
            options.styles = Some(styles);
        }
    }

    fn set_average_center(&self, average_center: bool) {
        if let Ok(mut options) = self.options.lock() {
            options.average_center = Some(average_center);
        }
        self.record(ClusterSetterCall::AverageCenter(average_center));
    }

    fn set_minimum_cluster_size(&self, size: u32) {
        if let Ok(mut options) = self.options.lock() {
            options.minimum_cluster_size = Some(size);
        }
        self.record(ClusterSetterCall::MinimumClusterSize(size));
    }

    fn set_image_path(&self, path: String) {
        if let Ok(mut options) = self.options.lock() {
            options.image_path = Some(path.clone());
        }
        self.record(ClusterSetterCall::ImagePath(path));
    }

    fn set_image_extension(&self, extension: String) {
        if let Ok(mut options) = self.options.lock() {
            options.image_extension = Some(extension.clone());
        }
        self.record(ClusterSetterCall::ImageExtension(extension));
    }

    fn set_zoom_on_click(&self, zoom_on_click: bool) {
        if let Ok(mut options) = self.options.lock() {
            options.zoom_on_click = Some(zoom_on_click);
        }
        self.record(ClusterSetterCall::ZoomOnClick(zoom_on_click));
    }

    fn set_calculator(&self, calculator: ClusterCalculator) {
        if let Ok(mut options) = self.options.lock() {
            options.calculator = Some(calculator);
        }
        self.record(ClusterSetterCall::Calculator);
    }

    fn listen(&self, kind: ClusterEventKind, sink: EventSink<ClusterEvent>) -> ListenerHandle {
        self.events.listen(kind, sink)
    }
}

/// Recordable drawing controller
pub struct FakeDrawingController {
    options: Mutex<DrawingOptions>,
    attach_history: Mutex<Vec<bool>>,
    patches: Mutex<Vec<DrawingDelta>>,
    completions: Emitter<(), ShapeComplete>,
}

impl FakeDrawingController {
    fn new(options: DrawingOptions, counters: Arc<ListenerCounters>) -> Self {
        Self {
            options: Mutex::new(options),
            attach_history: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            completions: Emitter::new(counters),
        }
    }

    pub fn options(&self) -> DrawingOptions {
        self.options.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Attach/detach transitions in order
    pub fn attach_history(&self) -> Vec<bool> {
        self.attach_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn is_attached(&self) -> bool {
        self.attach_history
            .lock()
            .ok()
            .and_then(|history| history.last().copied())
            .unwrap_or(false)
    }

    /// Applied option patches, one entry per native setter call
    pub fn patches(&self) -> Vec<DrawingDelta> {
        self.patches.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Fires a shape-completion event, as the external library would
    pub fn emit_completion(&self, shape: ShapeComplete) {
        self.completions.emit((), shape);
    }
}

impl DrawingController for FakeDrawingController {
    fn set_attached(&self, attached: bool) {
        if let Ok(mut history) = self.attach_history.lock() {
            history.push(attached);
        }
    }

    fn apply(&self, delta: &DrawingDelta) {
        if let Ok(mut options) = self.options.lock() {
            options.merge(delta);
        }
        if let Ok(mut patches) = self.patches.lock() {
            patches.push(delta.clone());
        }
    }

    fn listen(&self, sink: EventSink<ShapeComplete>) -> ListenerHandle {
        self.completions.listen((), sink)
    }
}

/// Recordable info window
pub struct FakeInfoWindow {
    options: Mutex<InfoWindowOptions>,
    deltas: Mutex<Vec<InfoWindowDelta>>,
    opens: Mutex<Vec<bool>>,
    close_calls: AtomicUsize,
    events: Emitter<(), InfoWindowEvent>,
}

impl FakeInfoWindow {
    fn new(options: InfoWindowOptions, counters: Arc<ListenerCounters>) -> Self {
        Self {
            options: Mutex::new(options),
            deltas: Mutex::new(Vec::new()),
            opens: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            events: Emitter::new(counters),
        }
    }

    pub fn options(&self) -> InfoWindowOptions {
        self.options.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn deltas(&self) -> Vec<InfoWindowDelta> {
        self.deltas.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Open invocations; true when anchored to a marker
    pub fn opens(&self) -> Vec<bool> {
        self.opens.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: InfoWindowEvent) {
        self.events.emit((), event);
    }
}

impl NativeInfoWindow for FakeInfoWindow {
    fn apply(&self, delta: &InfoWindowDelta) {
        if let Ok(mut options) = self.options.lock() {
            options.merge(delta);
        }
        if let Ok(mut deltas) = self.deltas.lock() {
            deltas.push(delta.clone());
        }
    }

    fn open(&self, anchor: Option<Arc<dyn NativeMarker>>) {
        if let Ok(mut opens) = self.opens.lock() {
            opens.push(anchor.is_some());
        }
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn listen(&self, sink: EventSink<InfoWindowEvent>) -> ListenerHandle {
        self.events.listen((), sink)
    }
}

/// In-memory mapping surface standing in for the external API
pub struct FakeMapApi {
    gate: Mutex<Option<Ready<()>>>,
    gate_release: Mutex<Option<Completer<()>>>,
    markers: Mutex<Vec<Arc<FakeMarker>>>,
    polygons: Mutex<Vec<Arc<FakePolygon>>>,
    clusterers: Mutex<Vec<Arc<FakeClusterer>>>,
    drawing_controllers: Mutex<Vec<Arc<FakeDrawingController>>>,
    info_windows: Mutex<Vec<Arc<FakeInfoWindow>>>,
    counters: Arc<ListenerCounters>,
    drawing_supported: AtomicBool,
    reject_markers: AtomicBool,
}

impl FakeMapApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Mutex::new(None),
            gate_release: Mutex::new(None),
            markers: Mutex::new(Vec::new()),
            polygons: Mutex::new(Vec::new()),
            clusterers: Mutex::new(Vec::new()),
            drawing_controllers: Mutex::new(Vec::new()),
            info_windows: Mutex::new(Vec::new()),
            counters: Arc::new(ListenerCounters::default()),
            drawing_supported: AtomicBool::new(true),
            reject_markers: AtomicBool::new(false),
        })
    }

    /// Holds every subsequent native creation until `release_creations`,
    /// letting tests script resolution order.
    pub fn hold_creations(&self) {
        let (release, gate) = Ready::channel();
        if let Ok(mut slot) = self.gate.lock() {
            *slot = Some(gate);
        }
        if let Ok(mut slot) = self.gate_release.lock() {
            *slot = Some(release);
        }
    }

    /// Releases creations held by `hold_creations`
    pub fn release_creations(&self) {
        let release = self.gate_release.lock().ok().and_then(|mut slot| slot.take());
        if let Some(release) = release {
            release.complete(());
        }
        if let Ok(mut slot) = self.gate.lock() {
            *slot = None;
        }
    }

    pub fn set_drawing_supported(&self, supported: bool) {
        self.drawing_supported.store(supported, Ordering::SeqCst);
    }

    /// Makes subsequent marker creations fail, for degraded-mode tests
    pub fn reject_marker_creations(&self, reject: bool) {
        self.reject_markers.store(reject, Ordering::SeqCst);
    }

    pub fn markers(&self) -> Vec<Arc<FakeMarker>> {
        self.markers.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn polygons(&self) -> Vec<Arc<FakePolygon>> {
        self.polygons.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn clusterers(&self) -> Vec<Arc<FakeClusterer>> {
        self.clusterers.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn drawing_controllers(&self) -> Vec<Arc<FakeDrawingController>> {
        self.drawing_controllers
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn info_windows(&self) -> Vec<Arc<FakeInfoWindow>> {
        self.info_windows
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    /// Markers currently in the map's own overlay set
    pub fn attached_marker_count(&self) -> usize {
        self.markers()
            .iter()
            .filter(|marker| marker.is_attached())
            .count()
    }

    pub fn listen_count(&self) -> usize {
        self.counters.subscribed.load(Ordering::SeqCst)
    }

    pub fn dispose_count(&self) -> usize {
        self.counters.disposed.load(Ordering::SeqCst)
    }

    async fn wait_gate(&self) {
        let gate = self
            .gate
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned());
        if let Some(gate) = gate {
            gate.get().await;
        }
    }
}

#[async_trait]
impl MapApi for FakeMapApi {
    async fn create_marker(
        &self,
        options: MarkerOptions,
        attach: bool,
    ) -> Result<Arc<dyn NativeMarker>> {
        self.wait_gate().await;
        if self.reject_markers.load(Ordering::SeqCst) {
            return Err(Error::Surface("marker construction rejected".into()));
        }
        let marker = Arc::new(FakeMarker::new(options, attach, self.counters.clone()));
        if let Ok(mut markers) = self.markers.lock() {
            markers.push(marker.clone());
        }
        Ok(marker)
    }

    async fn create_polygon(&self, options: PolygonOptions) -> Result<Arc<dyn NativePolygon>> {
        self.wait_gate().await;
        let polygon = Arc::new(FakePolygon::new(options, self.counters.clone()));
        if let Ok(mut polygons) = self.polygons.lock() {
            polygons.push(polygon.clone());
        }
        Ok(polygon)
    }

    async fn create_clusterer(&self, options: ClusterOptions) -> Result<Arc<dyn Clusterer>> {
        self.wait_gate().await;
        let clusterer = Arc::new(FakeClusterer::new(options, self.counters.clone()));
        if let Ok(mut clusterers) = self.clusterers.lock() {
            clusterers.push(clusterer.clone());
        }
        Ok(clusterer)
    }

    async fn create_info_window(
        &self,
        options: InfoWindowOptions,
    ) -> Result<Arc<dyn NativeInfoWindow>> {
        self.wait_gate().await;
        let window = Arc::new(FakeInfoWindow::new(options, self.counters.clone()));
        if let Ok(mut windows) = self.info_windows.lock() {
            windows.push(window.clone());
        }
        Ok(window)
    }

    fn drawing_supported(&self) -> bool {
        self.drawing_supported.load(Ordering::SeqCst)
    }

    async fn create_drawing_controller(
        &self,
        options: DrawingOptions,
    ) -> Result<Arc<dyn DrawingController>> {
        self.wait_gate().await;
        let controller = Arc::new(FakeDrawingController::new(options, self.counters.clone()));
        if let Ok(mut controllers) = self.drawing_controllers.lock() {
            controllers.push(controller.clone());
        }
        Ok(controller)
    }
}

/// Scope that counts re-entries, for asserting events rejoin tracked
/// scheduling exactly once per emission
pub struct CountingScope {
    entries: AtomicUsize,
}

impl CountingScope {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: AtomicUsize::new(0),
        })
    }

    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }
}

impl EventScope for CountingScope {
    fn run(&self, f: Box<dyn FnOnce() + Send>) {
        self.entries.fetch_add(1, Ordering::SeqCst);
        f()
    }
}
