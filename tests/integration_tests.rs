use mapsync::prelude::*;
use mapsync::testing::{EngineCall, RecordingEngine, RecordingLocationServices};
use serde_json::json;

/// Integration tests driving a map view the way a host and an engine would
#[cfg(test)]
mod integration_tests {
    use super::*;

    fn created_view() -> MapView {
        let mut view = MapView::new(Box::new(RecordingLocationServices::new()));
        view.make_view().expect("fresh view");
        view
    }

    fn bind(view: &mut MapView, engine: &RecordingEngine) {
        view.on_engine_ready(Box::new(engine.clone())).expect("engine binds");
    }

    fn ready_view_at(camera: CameraPosition) -> (MapView, RecordingEngine) {
        let mut view = created_view();
        let engine = RecordingEngine::with_camera(camera);
        bind(&mut view, &engine);
        (view, engine)
    }

    fn event_tags(view: &mut MapView) -> Vec<EventType> {
        view.process_events().iter().map(MapEvent::event_type).collect()
    }

    /// Buffered setters replay exactly once, in call order, each against the
    /// camera state as of its own call
    #[test]
    fn test_buffered_changes_replay_in_order() {
        let mut view = MapView::new(Box::new(RecordingLocationServices::new()));
        view.set_zoom_level(5.0);
        view.make_view();
        view.set_heading(30.0);
        view.set_scroll_enabled(false);
        view.set_style_url("asset://dark.json");
        view.set_min_zoom_level(2.0).unwrap();
        view.set_max_zoom_level(8.0).unwrap();
        view.set_center_coordinate(LatLng::new(10.0, 20.0)).unwrap();
        assert_eq!(view.pending_changes(), 7);

        let engine = RecordingEngine::new();
        bind(&mut view, &engine);

        let origin = LatLng::new(0.0, 0.0);
        let expected = vec![
            EngineCall::Move(CameraUpdate::NewPosition(CameraPosition::new(origin, 5.0, 0.0, 0.0))),
            EngineCall::Move(CameraUpdate::NewPosition(CameraPosition::new(origin, 5.0, 30.0, 0.0))),
            EngineCall::ScrollGestures(false),
            EngineCall::StyleUrl("asset://dark.json".to_string()),
            EngineCall::MinZoomPreference(2.0),
            EngineCall::MinZoomPreference(2.0),
            EngineCall::MaxZoomPreference(8.0),
            EngineCall::Move(CameraUpdate::NewPosition(CameraPosition::new(
                LatLng::new(10.0, 20.0),
                5.0,
                30.0,
                0.0,
            ))),
        ];
        assert_eq!(engine.calls(), expected);
        assert_eq!(view.pending_changes(), 0);

        // A repeated ready callback must not replay anything
        bind(&mut view, &engine);
        assert_eq!(engine.calls().len(), expected.len());
    }

    #[test]
    fn test_setters_apply_immediately_once_ready() {
        let (mut view, engine) = ready_view_at(CameraPosition::default());
        view.set_animated(true);
        engine.clear_calls();

        view.set_pitch(45.0);
        assert!(matches!(
            engine.calls().as_slice(),
            [EngineCall::Ease { token: None, duration: None, .. }]
        ));
        assert_eq!(view.pending_changes(), 0);
    }

    #[test]
    fn test_empty_set_camera_leaves_camera_unchanged() {
        let start = CameraPosition::new(LatLng::new(51.5, -0.12), 12.0, 15.0, 30.0);
        let (mut view, engine) = ready_view_at(start);

        let token = view.set_camera(&CameraConfig::from_value(json!({})).unwrap()).unwrap();
        let finished = engine.advance(Duration::from_millis(2000));

        assert_eq!(finished, vec![token]);
        assert_eq!(engine.camera(), start);
    }

    #[test]
    fn test_set_camera_completes_once_after_duration() {
        let (mut view, engine) = ready_view_at(CameraPosition::default());
        let config = CameraConfig::from_value(json!({"duration": 500, "pitch": 60.0})).unwrap();
        let token = view.set_camera(&config).unwrap();

        for finished in engine.advance(Duration::from_millis(499)) {
            view.on_camera_transition_finished(finished);
        }
        assert!(view.process_events().is_empty());

        for finished in engine.advance(Duration::from_millis(1)) {
            view.on_camera_transition_finished(finished);
        }
        view.on_camera_transition_finished(token);

        assert_eq!(event_tags(&mut view), vec![EventType::SetCameraComplete]);
        assert_eq!(engine.camera().pitch, 60.0);
    }

    #[test]
    fn test_set_camera_uses_configured_default_duration() {
        let mut options = MapViewOptions::default();
        options.camera.set_camera_duration_ms = 750;
        let mut view = MapView::with_options(Box::new(RecordingLocationServices::new()), options);
        view.make_view();
        let engine = RecordingEngine::new();
        bind(&mut view, &engine);

        view.set_camera(&CameraConfig::default()).unwrap();
        assert!(matches!(
            engine.calls().last(),
            Some(EngineCall::Ease { duration: Some(d), .. }) if *d == Duration::from_millis(750)
        ));
    }

    #[test]
    fn test_superseded_fly_to_never_completes() {
        let (mut view, engine) = ready_view_at(CameraPosition::default());
        let first = view.fly_to(LatLng::new(1.0, 1.0), Duration::from_millis(1000)).unwrap();
        let second = view.fly_to(LatLng::new(2.0, 2.0), Duration::from_millis(1000)).unwrap();

        for cancelled in engine.take_cancelled() {
            view.on_camera_transition_cancelled(cancelled);
        }
        // A misbehaving engine may still report the first flight
        view.on_camera_transition_finished(first);
        assert!(view.process_events().is_empty());

        let finished = engine.advance(Duration::from_millis(1000));
        assert_eq!(finished, vec![second]);
        for token in finished {
            view.on_camera_transition_finished(token);
        }

        assert_eq!(event_tags(&mut view), vec![EventType::FlyToComplete]);
        assert_eq!(engine.camera().target, LatLng::new(2.0, 2.0));
    }

    #[test]
    fn test_property_change_supersedes_pending_flight() {
        let (mut view, engine) = ready_view_at(CameraPosition::default());
        let token = view.fly_to(LatLng::new(1.0, 1.0), Duration::from_millis(1000)).unwrap();

        view.set_zoom_level(4.0);
        view.on_camera_transition_finished(token);

        assert!(view.pending_animation().is_none());
        assert!(view.process_events().is_empty());
        assert_eq!(engine.take_cancelled(), vec![token]);
    }

    #[test]
    fn test_fit_bounds_without_geometry_is_silent() {
        let (mut view, engine) = ready_view_at(CameraPosition::default());
        let empty = GeoJson::from_str(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        let single = GeoJson::from_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": {}}
            ]}"#,
        )
        .unwrap();

        view.fit_bounds(&empty, 10.0, Duration::from_millis(300)).unwrap();
        view.fit_bounds(&single, 10.0, Duration::from_millis(300)).unwrap();

        assert!(engine.calls().is_empty());
        assert_eq!(view.pending_events(), 0);
    }

    #[test]
    fn test_fit_bounds_eases_without_completion() {
        let (mut view, engine) = ready_view_at(CameraPosition::default());
        let collection = GeoJson::from_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-10.0, -5.0]}, "properties": null},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [10.0, 5.0]]}, "properties": null}
            ]}"#,
        )
        .unwrap();

        view.fit_bounds(&collection, 20.0, Duration::from_millis(300)).unwrap();

        match engine.calls().as_slice() {
            [EngineCall::Ease {
                update: CameraUpdate::NewBounds { bounds, padding },
                token: None,
                ..
            }] => {
                assert_eq!(*bounds, LatLngBounds::from_coords(-5.0, -10.0, 5.0, 10.0));
                assert_eq!(*padding, 20.0);
            }
            other => panic!("unexpected calls {:?}", other),
        }
        assert!(engine.advance(Duration::from_millis(300)).is_empty());
        assert_eq!(view.pending_events(), 0);
    }

    #[test]
    fn test_region_payload_reflects_camera_at_dispatch() {
        let start = CameraPosition::new(LatLng::new(40.0, -74.0), 3.0, 0.0, 0.0);
        let (mut view, _engine) = ready_view_at(start);

        view.on_map_changed(3);
        // Two rapid changes land before the engine reports the region once
        view.set_zoom_level(7.0);
        view.set_heading(90.0);
        view.on_map_changed(4);

        let events = view.process_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload()["properties"]["zoomLevel"], 3.0);
        assert_eq!(events[0].payload()["properties"]["heading"], 0.0);
        assert_eq!(events[0].payload()["properties"]["animated"], false);
        assert_eq!(events[1].payload()["properties"]["zoomLevel"], 7.0);
        assert_eq!(events[1].payload()["properties"]["heading"], 90.0);
        assert_eq!(events[1].payload()["properties"]["animated"], true);
        assert_eq!(events[1].to_json()["type"], "regiondidchange");
        assert_eq!(
            events[1].payload()["geometry"]["coordinates"],
            json!([-74.0, 40.0])
        );
    }

    #[test]
    fn test_unknown_codes_produce_no_events() {
        let (mut view, _engine) = ready_view_at(CameraPosition::default());
        for code in [-1, 15, 42] {
            view.on_map_changed(code);
        }
        assert_eq!(view.pending_events(), 0);
    }

    #[test]
    fn test_lifecycle_codes_before_engine() {
        let mut view = created_view();
        view.on_map_changed(5);
        view.on_map_changed(0);
        view.on_map_changed(2);

        assert_eq!(
            event_tags(&mut view),
            vec![EventType::WillStartLoadingMap, EventType::RegionIsChanging]
        );
    }

    #[test]
    fn test_listeners_receive_events() {
        use std::sync::{Arc, Mutex};

        let (mut view, _engine) = ready_view_at(CameraPosition::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        view.on(EventType::MapClick, move |event| {
            sink.lock().unwrap().push(event.to_json());
        });

        view.on_map_click(LatLng::new(0.0, 0.0));
        view.on_map_long_click(LatLng::new(0.0, 0.0));
        view.process_events();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["type"], "press");
        assert_eq!(seen[0]["payload"]["properties"]["screenPointX"], 256.0);
    }

    #[test]
    fn test_commands_before_ready_fail() {
        let mut view = created_view();
        let err = view.fly_to(LatLng::new(0.0, 0.0), Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, MapError::EngineNotReady { .. }));
        assert_eq!(err.to_string(), "flyTo requires a ready map engine");
    }
}
