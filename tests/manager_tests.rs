//! Manager-layer integration tests against the substitute surface:
//! lifecycle sequencing under scripted resolution order, clustering,
//! path events and drawing state transitions.

use mapbind::prelude::*;
use mapbind::testing::{ClusterSetterCall, CountingScope, FakeMapApi};

/// Lets spawned entity drivers run on the current-thread test runtime
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn scope() -> Arc<dyn EventScope> {
    CallerScope::shared()
}

#[tokio::test]
async fn marker_deleted_before_creation_resolves_never_stays_attached() {
    let api = FakeMapApi::new();
    api.hold_creations();

    let manager = Arc::new(MarkerManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));
    manager.add_marker("m1".into(), MarkerOptions::default());

    // delete is issued while creation is still pending
    let deleter = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.delete_marker("m1").await })
    };
    settle().await;
    assert!(api.markers().is_empty());

    api.release_creations();
    deleter.await.expect("delete task");

    // the add settled after the delete, but must not leave the marker attached
    let markers = api.markers();
    assert_eq!(markers.len(), 1);
    assert!(!markers[0].is_attached());
    assert_eq!(markers[0].detach_calls(), 1);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn update_forwards_only_changed_fields() {
    let api = FakeMapApi::new();
    let manager = MarkerManager::new(MapHandle::resolved(api.clone()), scope());

    manager.add_marker("m1".into(), MarkerOptions::default());
    manager.native("m1").await.expect("marker resolves");

    let delta = MarkerDelta {
        position: Some(LatLng::new(5.0, 6.0)),
        ..Default::default()
    };
    assert!(manager.update_marker("m1", delta.clone()));
    settle().await;

    let markers = api.markers();
    assert_eq!(markers[0].deltas(), vec![delta]);
    assert_eq!(markers[0].position(), LatLng::new(5.0, 6.0));
    // fields absent from the change set were not re-sent
    assert!(markers[0].deltas()[0].title.is_none());
    assert!(markers[0].deltas()[0].opacity.is_none());
}

#[tokio::test]
async fn double_delete_is_idempotent() {
    let api = FakeMapApi::new();
    let manager = MarkerManager::new(MapHandle::resolved(api.clone()), scope());

    manager.add_marker("m1".into(), MarkerOptions::default());
    manager.native("m1").await.expect("marker resolves");

    manager.delete_marker("m1").await;
    manager.delete_marker("m1").await;

    assert_eq!(api.markers()[0].detach_calls(), 1);
    assert!(!manager.update_marker("m1", MarkerDelta::default()));
}

#[tokio::test]
async fn cluster_markers_go_to_the_engine_not_the_map() {
    let api = FakeMapApi::new();
    let manager = ClusterManager::new(MapHandle::resolved(api.clone()), scope());

    let options = ClusterOptions {
        grid_size: Some(60),
        ..Default::default()
    };
    manager.init(options).await.expect("init");

    manager.add_marker(
        "a".into(),
        MarkerOptions {
            position: LatLng::new(0.0, 0.0),
            ..Default::default()
        },
    );
    manager.add_marker(
        "b".into(),
        MarkerOptions {
            position: LatLng::new(0.0, 0.0001),
            ..Default::default()
        },
    );
    manager.native("a").await.expect("a resolves");
    manager.native("b").await.expect("b resolves");

    let clusterers = api.clusterers();
    assert_eq!(clusterers[0].options().grid_size, Some(60));
    // exactly one add-item call per entity, nothing on the top-level map
    assert_eq!(clusterers[0].add_calls(), 2);
    assert_eq!(clusterers[0].items_len(), 2);
    assert_eq!(api.attached_marker_count(), 0);
}

#[tokio::test]
async fn cluster_add_waits_for_both_marker_and_engine() {
    let api = FakeMapApi::new();
    let manager = Arc::new(ClusterManager::new(
        MapHandle::resolved(api.clone()),
        scope(),
    ));

    // marker is declared before the clusterer exists; the add must wait
    manager.add_marker("a".into(), MarkerOptions::default());
    settle().await;
    assert!(api.clusterers().is_empty());

    manager.init(ClusterOptions::default()).await.expect("init");
    manager.native("a").await.expect("a resolves");

    assert_eq!(api.clusterers()[0].items_len(), 1);
}

#[tokio::test]
async fn cluster_delete_detaches_then_unregisters() {
    let api = FakeMapApi::new();
    let manager = ClusterManager::new(MapHandle::resolved(api.clone()), scope());
    manager.init(ClusterOptions::default()).await.expect("init");

    manager.add_marker("a".into(), MarkerOptions::default());
    let marker = manager.native("a").await.expect("a resolves");
    assert!(api.clusterers()[0].contains(&marker));

    manager.delete_marker("a").await;

    let clusterers = api.clusterers();
    assert_eq!(api.markers()[0].detach_calls(), 1);
    assert_eq!(clusterers[0].remove_calls(), 1);
    assert_eq!(clusterers[0].items_len(), 0);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn cluster_double_init_is_reported() {
    let api = FakeMapApi::new();
    let manager = ClusterManager::new(MapHandle::resolved(api.clone()), scope());

    manager.init(ClusterOptions::default()).await.expect("init");
    let second = manager.init(ClusterOptions::default()).await;
    assert!(matches!(second, Err(BindError::ClustererInitialized)));
    assert_eq!(api.clusterers().len(), 1);
}

#[tokio::test]
async fn cluster_setters_skip_unprovided_values() {
    let api = FakeMapApi::new();
    let manager = ClusterManager::new(MapHandle::resolved(api.clone()), scope());
    manager.init(ClusterOptions::default()).await.expect("init");

    // "not provided" is distinct from explicitly falsy
    manager.set_grid_size(None).await;
    manager.set_zoom_on_click(None).await;
    assert!(api.clusterers()[0].setter_calls().is_empty());

    manager.set_zoom_on_click(Some(false)).await;
    assert_eq!(
        api.clusterers()[0].setter_calls(),
        vec![ClusterSetterCall::ZoomOnClick(false)]
    );
}

#[tokio::test]
async fn cluster_events_reenter_the_scope() {
    let api = FakeMapApi::new();
    let counting = CountingScope::new();
    let manager = ClusterManager::new(MapHandle::resolved(api.clone()), counting.clone());
    manager.init(ClusterOptions::default()).await.expect("init");

    let mut events = manager.cluster_events(ClusterEventKind::Click).await;
    let fired = ClusterEvent {
        kind: ClusterEventKind::Click,
        size: 2,
        center: Some(LatLng::new(0.0, 0.0)),
    };
    api.clusterers()[0].emit(fired);

    assert_eq!(counting.entries(), 1);
    assert_eq!(events.recv().await, Some(fired));
}

#[tokio::test]
async fn clear_markers_empties_the_engine() {
    let api = FakeMapApi::new();
    let manager = ClusterManager::new(MapHandle::resolved(api.clone()), scope());
    manager.init(ClusterOptions::default()).await.expect("init");

    manager.add_marker("a".into(), MarkerOptions::default());
    manager.add_marker("b".into(), MarkerOptions::default());
    manager.native("a").await.expect("a resolves");
    manager.native("b").await.expect("b resolves");

    manager.clear_markers().await;
    assert!(manager.is_empty());
    assert_eq!(api.clusterers()[0].items_len(), 0);
    assert_eq!(api.clusterers()[0].clear_calls(), 1);
}

#[tokio::test]
async fn polygon_path_insert_emits_one_event() {
    let api = FakeMapApi::new();
    let manager = PolygonManager::new(MapHandle::resolved(api.clone()), scope());

    let ring: Vec<LatLng> = (0..5).map(|i| LatLng::new(f64::from(i), 0.0)).collect();
    let options = PolygonOptions {
        paths: vec![ring],
        ..Default::default()
    };
    manager.add_polygon("p1".into(), options);

    let mut events = manager.path_events("p1").await.expect("polygon resolves");
    api.polygons()[0].insert_vertex(0, 5, LatLng::new(5.0, 0.0));

    let event = events.recv().await.expect("one event");
    assert_eq!(event.kind, PathEventKind::Insert);
    assert_eq!(event.index, 5);
    assert_eq!(event.ring, 0);
    assert_eq!(event.previous, None);
    assert_eq!(event.path.len(), 6);
    assert_eq!(events.try_recv(), None);

    assert_eq!(manager.path("p1").await.expect("path").len(), 6);
}

#[tokio::test]
async fn polygon_set_vertex_carries_previous_value() {
    let api = FakeMapApi::new();
    let manager = PolygonManager::new(MapHandle::resolved(api.clone()), scope());

    let outer: Vec<LatLng> = (0..4).map(|i| LatLng::new(f64::from(i), 0.0)).collect();
    let hole: Vec<LatLng> = (0..3).map(|i| LatLng::new(0.5, f64::from(i))).collect();
    manager.add_polygon(
        "p1".into(),
        PolygonOptions {
            paths: vec![outer, hole],
            ..Default::default()
        },
    );

    let mut events = manager.path_events("p1").await.expect("polygon resolves");
    api.polygons()[0].set_vertex(1, 2, LatLng::new(9.0, 9.0));

    let event = events.recv().await.expect("one event");
    assert_eq!(event.kind, PathEventKind::Set);
    assert_eq!(event.ring, 1);
    assert_eq!(event.index, 2);
    assert_eq!(event.previous, Some(LatLng::new(0.5, 2.0)));

    let paths = manager.paths("p1").await.expect("paths");
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[1][2], LatLng::new(9.0, 9.0));
}

#[tokio::test]
async fn polygon_delete_before_resolution_is_absorbed() {
    let api = FakeMapApi::new();
    api.hold_creations();
    let manager = PolygonManager::new(MapHandle::resolved(api.clone()), scope());

    manager.add_polygon("p1".into(), PolygonOptions::default());
    let removal = manager.delete_polygon("p1");
    api.release_creations();
    removal.await;

    assert!(!api.polygons()[0].is_attached());
    assert!(manager.is_empty());
}

#[tokio::test]
async fn drawing_detach_before_attach_is_a_noop() {
    let api = FakeMapApi::new();
    let manager = DrawingManager::new(scope(), DrawingOptions::default());

    manager.set_map(None).await.expect("noop detach");
    assert!(api.drawing_controllers().is_empty());
    assert!(!manager.is_attached().await);
}

#[tokio::test]
async fn drawing_missing_capability_degrades_with_diagnostic() {
    let _ = env_logger::builder().is_test(true).try_init();

    let api = FakeMapApi::new();
    api.set_drawing_supported(false);
    let manager = DrawingManager::new(scope(), DrawingOptions::default());

    manager
        .set_map(Some(api.clone()))
        .await
        .expect("degrades, does not fail");
    assert!(api.drawing_controllers().is_empty());
    assert!(!manager.is_attached().await);
}

#[tokio::test]
async fn drawing_patch_is_a_single_native_call() {
    let api = FakeMapApi::new();
    let manager = DrawingManager::new(scope(), DrawingOptions::default());
    manager.set_map(Some(api.clone())).await.expect("attach");

    let delta = DrawingDelta {
        drawing_mode: Some(Some(ShapeKind::Polygon)),
        drawing_control: Some(false),
        ..Default::default()
    };
    manager.apply(delta.clone()).await;

    let controllers = api.drawing_controllers();
    assert_eq!(controllers[0].patches(), vec![delta]);
    assert_eq!(controllers[0].options().drawing_mode, Some(ShapeKind::Polygon));
    assert!(!controllers[0].options().drawing_control);
}

#[tokio::test]
async fn drawing_reattach_reuses_the_controller() {
    let api = FakeMapApi::new();
    let manager = DrawingManager::new(scope(), DrawingOptions::default());

    manager.set_map(Some(api.clone())).await.expect("attach");
    manager.set_map(None).await.expect("detach");
    assert!(!manager.is_attached().await);
    manager.set_map(Some(api.clone())).await.expect("reattach");

    assert_eq!(api.drawing_controllers().len(), 1);
    assert_eq!(
        api.drawing_controllers()[0].attach_history(),
        vec![true, false, true]
    );
    assert!(manager.is_attached().await);
}

#[tokio::test]
async fn drawing_completions_filter_by_kind() {
    let api = FakeMapApi::new();
    let manager = DrawingManager::new(scope(), DrawingOptions::default());
    manager.set_map(Some(api.clone())).await.expect("attach");

    let mut polygons = manager
        .completions(Some(ShapeKind::Polygon))
        .await
        .expect("stream");
    let controllers = api.drawing_controllers();
    controllers[0].emit_completion(ShapeComplete::Circle {
        center: LatLng::default(),
        radius: 10.0,
    });
    controllers[0].emit_completion(ShapeComplete::Polygon {
        paths: vec![vec![LatLng::default()]],
    });

    let event = polygons.recv().await.expect("polygon completion");
    assert_eq!(event.kind(), ShapeKind::Polygon);
    assert_eq!(polygons.try_recv(), None);
}

#[tokio::test]
async fn marker_creation_failure_degrades() {
    let _ = env_logger::builder().is_test(true).try_init();

    let api = FakeMapApi::new();
    api.reject_marker_creations(true);
    let manager = MarkerManager::new(MapHandle::resolved(api.clone()), scope());

    manager.add_marker("m1".into(), MarkerOptions::default());
    settle().await;
    assert!(api.markers().is_empty());

    // queued mutations drop silently, removal still settles
    manager.update_marker("m1", MarkerDelta::default());
    manager.delete_marker("m1").await;
    assert!(manager.is_empty());
}

#[tokio::test]
async fn map_handle_resolution_is_shared() {
    let (handle, completer) = MapHandle::pending();

    let early = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.get_map().await })
    };
    tokio::task::yield_now().await;
    assert!(handle.try_map().is_none());

    let api = FakeMapApi::new();
    assert!(completer.resolve(api.clone()));

    let first = early.await.expect("waiter");
    let second = handle.get_map().await;
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn info_window_opens_anchored_to_marker() {
    let api = FakeMapApi::new();
    let handle = MapHandle::resolved(api.clone());
    let markers = Arc::new(MarkerManager::new(handle.clone(), scope()));
    let manager = InfoWindowManager::new(handle, scope(), markers.clone());

    markers.add_marker("m1".into(), MarkerOptions::default());
    manager.add_info_window(
        "w1".into(),
        InfoWindowOptions {
            content: "hello".into(),
            ..Default::default()
        },
    );

    manager.open("w1", Some("m1")).await;
    settle().await;
    let windows = api.info_windows();
    assert_eq!(windows[0].opens(), vec![true]);
    assert_eq!(windows[0].options().content, "hello");

    assert!(manager.close("w1"));
    settle().await;
    assert_eq!(windows[0].close_calls(), 1);

    manager.delete_info_window("w1").await;
    assert!(manager.is_empty());
    assert_eq!(windows[0].close_calls(), 2);
}
