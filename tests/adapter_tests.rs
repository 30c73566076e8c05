//! Adapter-layer integration tests: the add-once state machine, change-set
//! filtering, subscription accounting across teardown, and composition of
//! marker adapters with both marker hosts.

use mapbind::prelude::*;
use mapbind::testing::{ClusterSetterCall, CountingScope, FakeMapApi};
use serde_json::{json, Value};

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn scope() -> Arc<dyn EventScope> {
    CallerScope::shared()
}

fn change_set(pairs: &[(&str, Value)]) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for (key, value) in pairs {
        changes.insert((*key).to_string(), value.clone());
    }
    changes
}

#[tokio::test]
async fn subscriptions_are_disposed_exactly_once_per_teardown() {
    let api = FakeMapApi::new();
    let manager = Arc::new(PolygonManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    let adapter = PolygonAdapter::new(
        manager,
        PolygonOptions {
            paths: vec![vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]],
            ..Default::default()
        },
    );

    adapter.on_init();
    let _paths = adapter.path_events().await.expect("stream");
    let _clicks = adapter.events(OverlayEventKind::Click).await.expect("stream");
    let _drags = adapter.events(OverlayEventKind::DragEnd).await.expect("stream");
    assert_eq!(api.listen_count(), 3);
    assert_eq!(api.dispose_count(), 0);

    adapter.on_destroy().await;
    assert_eq!(api.dispose_count(), 3);
    assert_eq!(api.listen_count(), api.dispose_count());

    // a second teardown cycle must not double-dispose
    adapter.on_destroy().await;
    assert_eq!(api.dispose_count(), 3);
}

#[tokio::test]
async fn change_set_forwards_only_whitelisted_fields() {
    let api = FakeMapApi::new();
    let manager = Arc::new(PolygonManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    let adapter = PolygonAdapter::new(manager, PolygonOptions::default());
    adapter.on_init();
    adapter.paths().await.expect("polygon resolves");

    adapter.on_changes(&change_set(&[
        ("strokeColor", json!("red")),
        ("someUnknownField", json!(1)),
    ]));
    settle().await;

    let deltas = api.polygons()[0].deltas();
    assert_eq!(deltas.len(), 1);
    let expected = PolygonDelta {
        stroke_color: Some(Some("red".to_string())),
        ..Default::default()
    };
    assert_eq!(deltas[0], expected);
}

#[tokio::test]
async fn double_trigger_adds_only_once() {
    let api = FakeMapApi::new();
    let manager: Arc<dyn MarkerHost> = Arc::new(MarkerManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    let adapter = MarkerAdapter::new(manager, MarkerOptions::default());

    // change detection can fire before the init hook; whichever comes
    // first performs the add
    adapter.on_changes(&change_set(&[("latitude", json!(3.0))]));
    adapter.on_init();
    adapter.on_changes(&change_set(&[("longitude", json!(4.0))]));
    settle().await;

    let markers = api.markers();
    assert_eq!(markers.len(), 1);
    // the first change set was folded into the add, the second became an update
    assert_eq!(markers[0].options().position, LatLng::new(3.0, 4.0));
    assert_eq!(markers[0].deltas().len(), 1);
}

#[tokio::test]
async fn empty_change_set_sends_nothing() {
    let api = FakeMapApi::new();
    let manager: Arc<dyn MarkerHost> = Arc::new(MarkerManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    let adapter = MarkerAdapter::new(manager, MarkerOptions::default());
    adapter.on_init();
    settle().await;

    adapter.on_changes(&ChangeSet::default());
    adapter.on_changes(&change_set(&[("someUnknownField", json!(1))]));
    settle().await;

    assert!(api.markers()[0].deltas().is_empty());
}

#[tokio::test]
async fn cluster_adapter_forwards_only_changed_tunables() {
    let api = FakeMapApi::new();
    let manager = Arc::new(ClusterManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    let adapter = ClusterAdapter::new(
        manager,
        ClusterOptions {
            grid_size: Some(60),
            ..Default::default()
        },
    );

    adapter.on_init().await.expect("init");
    // a second init hook is absorbed by the idempotency guard
    adapter.on_init().await.expect("second init is a no-op");
    assert_eq!(api.clusterers().len(), 1);
    assert_eq!(api.clusterers()[0].options().grid_size, Some(60));

    adapter
        .on_changes(&change_set(&[("gridSize", json!(80))]))
        .await
        .expect("changes");

    let calls = api.clusterers()[0].setter_calls();
    assert_eq!(calls, vec![ClusterSetterCall::GridSize(80)]);
}

#[tokio::test]
async fn marker_adapter_composes_with_cluster_host() {
    let api = FakeMapApi::new();
    let cluster = ClusterAdapter::new(
        Arc::new(ClusterManager::new(
            MapHandle::resolved(api.clone()),
            scope(),
        )),
        ClusterOptions::default(),
    );
    cluster.on_init().await.expect("init");

    let marker = MarkerAdapter::new(
        cluster.host(),
        MarkerOptions {
            position: LatLng::new(1.0, 2.0),
            ..Default::default()
        },
    );
    marker.on_init();
    cluster.manager().native(marker.id()).await.expect("resolves");

    assert_eq!(api.clusterers()[0].items_len(), 1);
    assert_eq!(api.attached_marker_count(), 0);

    marker.on_destroy().await;
    assert_eq!(api.clusterers()[0].items_len(), 0);

    cluster.on_destroy().await;
    assert_eq!(api.clusterers()[0].clear_calls(), 1);
}

#[tokio::test]
async fn cluster_events_arrive_inside_the_scope() {
    let api = FakeMapApi::new();
    let counting = CountingScope::new();
    let manager = Arc::new(ClusterManager::new(
        MapHandle::resolved(api.clone()),
        counting.clone(),
    ));
    let adapter = ClusterAdapter::new(manager, ClusterOptions::default());
    adapter.on_init().await.expect("init");

    let mut clicks = adapter.events(ClusterEventKind::Click).await;
    api.clusterers()[0].emit(ClusterEvent {
        kind: ClusterEventKind::Click,
        size: 3,
        center: None,
    });

    assert_eq!(counting.entries(), 1);
    let event = clicks.recv().await.expect("event");
    assert_eq!(event.size, 3);

    adapter.on_destroy().await;
    assert_eq!(api.listen_count(), api.dispose_count());
}

#[tokio::test]
async fn drawing_adapter_applies_one_patch_and_detaches() {
    let api = FakeMapApi::new();
    let handle = MapHandle::resolved(api.clone());
    let manager = Arc::new(DrawingManager::new(scope(), DrawingOptions::default()));
    let adapter = DrawingAdapter::new(handle, manager);

    adapter.on_init().await.expect("attach");
    adapter
        .on_changes(&change_set(&[
            ("drawingMode", json!("circle")),
            ("drawingControl", json!(false)),
        ]))
        .await
        .expect("changes");

    let controllers = api.drawing_controllers();
    assert_eq!(controllers[0].patches().len(), 1);
    assert_eq!(controllers[0].options().drawing_mode, Some(ShapeKind::Circle));

    let mut completions = adapter.completions(None).await.expect("stream");
    controllers[0].emit_completion(ShapeComplete::Marker {
        position: LatLng::new(1.0, 1.0),
    });
    assert!(completions.recv().await.is_some());

    adapter.on_destroy().await.expect("detach");
    assert!(!controllers[0].is_attached());
    assert_eq!(api.listen_count(), api.dispose_count());
}

#[tokio::test]
async fn info_window_adapter_lifecycle() {
    let api = FakeMapApi::new();
    let handle = MapHandle::resolved(api.clone());
    let markers = Arc::new(MarkerManager::new(handle.clone(), scope()));
    let manager = Arc::new(InfoWindowManager::new(handle, scope(), markers.clone()));

    let marker = MarkerAdapter::new(markers, MarkerOptions::default());
    marker.on_init();

    let adapter = InfoWindowAdapter::new(
        manager,
        InfoWindowOptions {
            content: "start".into(),
            ..Default::default()
        },
    );
    adapter.on_init();
    let _closes = adapter.events().await.expect("stream");

    adapter.open(Some(marker.id())).await;
    settle().await;
    let windows = api.info_windows();
    assert_eq!(windows[0].opens(), vec![true]);

    adapter.on_changes(&change_set(&[("content", json!("updated"))]));
    settle().await;
    assert_eq!(windows[0].options().content, "updated");

    adapter.on_destroy().await;
    assert_eq!(windows[0].close_calls(), 1);
    assert_eq!(api.listen_count(), api.dispose_count());
}

#[tokio::test]
async fn destroyed_adapter_ignores_further_changes() {
    let api = FakeMapApi::new();
    let manager: Arc<dyn MarkerHost> = Arc::new(MarkerManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    let adapter = MarkerAdapter::new(manager, MarkerOptions::default());
    adapter.on_init();
    settle().await;

    adapter.on_destroy().await;
    adapter.on_changes(&change_set(&[("latitude", json!(8.0))]));
    settle().await;

    assert!(api.markers()[0].deltas().is_empty());
    assert!(!api.markers()[0].is_attached());
}
