use anyhow::{bail, Context};
use mapsync::{
    testing::{RecordingEngine, RecordingLocationServices},
    CameraConfig, GeoJson, LatLng, LocationFix, MapView, MapViewOptions, MapViewProfile,
};
use serde_json::json;
use std::time::Duration;

/// Wall-clock tick; the recording engine's clock advances by the same amount
const FRAME: Duration = Duration::from_millis(16);

/// Map-changed code the engine raises when an animated transition lands
const REGION_DID_CHANGE_ANIMATED: i32 = 4;

/// Headless session driving a map view against the recording engine
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mapsync::init_logging();

    let options = load_options(std::env::args().nth(1).as_deref())?;
    let services = RecordingLocationServices::new();
    services.set_last_location(Some(LocationFix::new(LatLng::new(37.7749, -122.4194), 0)));

    let mut view = MapView::with_options(Box::new(services.clone()), options);
    let engine = RecordingEngine::new();

    // Host props arrive before the engine exists
    view.set_property("styleURL", &json!("mapbox://styles/mapbox/streets-v11"))?;
    view.set_property("zoomLevel", &json!(11.0))?;
    view.set_property(
        "centerCoordinate",
        &json!(r#"{"type":"Point","coordinates":[-122.4194,37.7749]}"#),
    )?;
    view.set_property("userTrackingMode", &json!(1))?;
    view.set_property("showUserLocation", &json!(true))?;

    let view_options = view.make_view().context("map view already created")?;
    log::info!("constructing engine with {:?}", view_options);

    engine_boot(&mut view, &engine)?;
    view.on_location_connected();
    flush(&mut view);

    view.fly_to(LatLng::new(40.7128, -74.0060), Duration::from_millis(1200))?;
    run_until_idle(&mut view, &engine).await;

    view.on_location_changed(LocationFix::new(LatLng::new(40.7130, -74.0050), 1));
    view.set_camera(&CameraConfig::from_value(json!({"pitch": 45.0, "heading": 90.0, "duration": 800}))?)?;
    run_until_idle(&mut view, &engine).await;

    let route = GeoJson::from_str(
        r#"{"type": "Feature", "properties": {},
            "geometry": {"type": "LineString", "coordinates": [[-74.01, 40.70], [-73.97, 40.78]]}}"#,
    )?;
    view.fit_bounds(&route, 32.0, Duration::from_millis(500))?;
    run_until_idle(&mut view, &engine).await;

    view.on_map_click(LatLng::new(40.75, -73.99));
    flush(&mut view);

    view.dispose();
    log::info!("session finished, location log: {:?}", services.log());
    Ok(())
}

fn load_options(arg: Option<&str>) -> anyhow::Result<MapViewOptions> {
    match arg {
        None => Ok(MapViewProfile::Standard.resolve()),
        Some(path) if path.ends_with(".json") => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading options from {}", path))?;
            Ok(MapViewProfile::Custom(MapViewOptions::from_json(&json)?).resolve())
        }
        Some(name) => match MapViewProfile::from_name(name) {
            Some(profile) => Ok(profile.resolve()),
            None => bail!("unknown profile {:?}, expected standard, navigation, passive or a .json file", name),
        },
    }
}

fn engine_boot(view: &mut MapView, engine: &RecordingEngine) -> anyhow::Result<()> {
    view.on_map_changed(5);
    view.on_engine_ready(Box::new(engine.clone()))?;
    for code in [14, 6, 11, 13] {
        view.on_map_changed(code);
    }
    Ok(())
}

/// Advances the engine clock frame by frame until no transition is running
async fn run_until_idle(view: &mut MapView, engine: &RecordingEngine) {
    let mut ticker = tokio::time::interval(FRAME);

    while engine.is_transitioning() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                log::warn!("interrupted, abandoning transition");
                return;
            }
        }

        for token in engine.take_cancelled() {
            view.on_camera_transition_cancelled(token);
        }
        let finished = engine.advance(FRAME);
        if !engine.is_transitioning() {
            view.on_map_changed(REGION_DID_CHANGE_ANIMATED);
        }
        for token in finished {
            view.on_camera_transition_finished(token);
        }
        flush(view);
    }
}

fn flush(view: &mut MapView) {
    for event in view.process_events() {
        println!("{}", event.to_json());
    }
}
