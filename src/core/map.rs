use crate::{
    core::{
        camera::{AnimationToken, CameraConfig, CameraIntent, CameraPosition, CameraStateMachine, PendingAnimation, ZoomBounds},
        config::MapViewOptions,
        geo::LatLng,
    },
    data::{conversion, geojson::GeoJson},
    input::{EventManager, EventType, MapEvent},
    location::{LocationFix, LocationTrackingController, TrackingMode, TrackingState},
    traits::{LocationServices, MapEngine},
    Error, Result,
};
use serde_json::Value;
use std::time::Duration;

/// Whether the native engine can take calls yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapReadiness {
    NotCreated,
    /// The widget exists but the engine has not reported ready
    AwaitingEngine,
    Ready,
}

/// A host property change that touches the engine
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    StyleUrl(String),
    Animated(bool),
    ScrollEnabled(bool),
    PitchEnabled(bool),
    ShowUserLocation(bool),
    Heading(f64),
    Pitch(f64),
    ZoomLevel(f64),
    MinZoomLevel(f64),
    MaxZoomLevel(f64),
    CenterCoordinate(LatLng),
}

/// A change waiting for the engine, with the camera state as of that change
#[derive(Debug, Clone)]
struct BufferedChange {
    change: PropertyChange,
    intent: CameraIntent,
    zoom_bounds: ZoomBounds,
}

/// What the platform needs to construct the engine widget
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub camera: CameraPosition,
    pub style_url: Option<String>,
}

/// Keeps a native map engine in sync with host properties and turns engine
/// callbacks into [`MapEvent`]s.
///
/// Property setters never fail for lack of an engine: until the engine
/// reports ready they are queued and replayed in call order. Direct camera
/// commands need a ready engine.
pub struct MapView {
    options: MapViewOptions,
    readiness: MapReadiness,
    engine: Option<Box<dyn MapEngine>>,
    camera: CameraStateMachine,
    location: LocationTrackingController,
    events: EventManager,
    pending: Vec<BufferedChange>,
    style_url: Option<String>,
}

impl MapView {
    pub fn new(services: Box<dyn LocationServices>) -> Self {
        Self::with_options(services, MapViewOptions::default())
    }

    pub fn with_options(services: Box<dyn LocationServices>, options: MapViewOptions) -> Self {
        let camera = CameraStateMachine::new(options.camera.set_camera_duration());
        let location = LocationTrackingController::new(
            services,
            options.location.priority,
            options.location.recenter,
        );

        Self {
            options,
            readiness: MapReadiness::NotCreated,
            engine: None,
            camera,
            location,
            events: EventManager::new(),
            pending: Vec::new(),
            style_url: None,
        }
    }

    // Lifecycle

    /// Creates the view; returns the options to build the engine widget with,
    /// or `None` when the view already exists.
    pub fn make_view(&mut self) -> Option<ViewOptions> {
        if self.readiness != MapReadiness::NotCreated {
            log::debug!("map view already created ({:?})", self.readiness);
            return None;
        }

        // The engine is built with the style already, so it must not be set twice
        let before = self.pending.len();
        self.pending
            .retain(|buffered| !matches!(buffered.change, PropertyChange::StyleUrl(_)));
        if self.pending.len() != before {
            log::debug!("style URL handed to view options, dropped from replay queue");
        }

        self.readiness = MapReadiness::AwaitingEngine;
        log::info!("map view created, awaiting engine");
        Some(ViewOptions {
            camera: self.camera.intent().initial_position(),
            style_url: self.style_url.clone(),
        })
    }

    /// Binds the engine and replays every buffered change in call order
    pub fn on_engine_ready(&mut self, engine: Box<dyn MapEngine>) -> Result<()> {
        match self.readiness {
            MapReadiness::NotCreated => {
                log::warn!("engine reported ready before the map view was created");
                return Err(Error::ViewNotCreated);
            }
            MapReadiness::Ready => {
                log::debug!("engine already bound, ignoring ready callback");
                return Ok(());
            }
            MapReadiness::AwaitingEngine => {}
        }

        self.engine = Some(engine);
        self.readiness = MapReadiness::Ready;

        let pending = std::mem::take(&mut self.pending);
        log::info!("engine ready, replaying {} buffered changes", pending.len());

        if let Some(engine) = self.engine.as_deref_mut() {
            for buffered in &pending {
                apply_change(engine, &mut self.camera, &mut self.location, buffered);
            }
        }
        Ok(())
    }

    /// Detaches location tracking and releases the engine
    pub fn dispose(&mut self) {
        if self.readiness == MapReadiness::NotCreated {
            log::debug!("map view not created, nothing to dispose");
            return;
        }

        self.location.teardown();
        self.camera.reset_pending();
        self.engine = None;
        self.pending.clear();
        self.readiness = MapReadiness::NotCreated;
        log::info!("map view disposed");
    }

    // Property setters

    pub fn set_style_url(&mut self, url: &str) {
        self.style_url = Some(url.to_string());
        self.submit(PropertyChange::StyleUrl(url.to_string()));
    }

    pub fn set_animated(&mut self, animated: bool) {
        self.camera.intent_mut().animated = animated;
        self.submit(PropertyChange::Animated(animated));
    }

    pub fn set_scroll_enabled(&mut self, enabled: bool) {
        self.submit(PropertyChange::ScrollEnabled(enabled));
    }

    pub fn set_pitch_enabled(&mut self, enabled: bool) {
        self.submit(PropertyChange::PitchEnabled(enabled));
    }

    pub fn set_show_user_location(&mut self, show: bool) {
        self.submit(PropertyChange::ShowUserLocation(show));
    }

    pub fn set_heading(&mut self, heading: f64) {
        self.camera.intent_mut().heading = heading;
        self.submit(PropertyChange::Heading(heading));
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.camera.intent_mut().pitch = pitch;
        self.submit(PropertyChange::Pitch(pitch));
    }

    pub fn set_zoom_level(&mut self, zoom: f64) {
        self.camera.intent_mut().zoom = zoom;
        self.submit(PropertyChange::ZoomLevel(zoom));
    }

    pub fn set_min_zoom_level(&mut self, zoom: f64) -> Result<()> {
        let bounds = self.camera.zoom_bounds().with_min(zoom)?;
        self.camera.set_zoom_bounds(bounds);
        self.submit(PropertyChange::MinZoomLevel(zoom));
        Ok(())
    }

    pub fn set_max_zoom_level(&mut self, zoom: f64) -> Result<()> {
        let bounds = self.camera.zoom_bounds().with_max(zoom)?;
        self.camera.set_zoom_bounds(bounds);
        self.submit(PropertyChange::MaxZoomLevel(zoom));
        Ok(())
    }

    pub fn set_center_coordinate(&mut self, center: LatLng) -> Result<()> {
        if !center.is_valid() {
            return Err(Error::InvalidCoordinates(format!(
                "center ({}, {}) out of range",
                center.lat, center.lng
            )));
        }

        self.camera.intent_mut().center = Some(center);
        self.submit(PropertyChange::CenterCoordinate(center));
        Ok(())
    }

    /// Takes effect immediately; the overlay is only touched once it exists
    pub fn set_user_tracking_mode(&mut self, mode: TrackingMode) {
        self.location.set_tracking_mode(mode);
    }

    /// Sets a property by its host name
    pub fn set_property(&mut self, name: &str, value: &Value) -> Result<()> {
        match name {
            "styleURL" => self.set_style_url(expect_str(name, value)?),
            "animated" => self.set_animated(expect_bool(name, value)?),
            "scrollEnabled" => self.set_scroll_enabled(expect_bool(name, value)?),
            "pitchEnabled" => self.set_pitch_enabled(expect_bool(name, value)?),
            "showUserLocation" => self.set_show_user_location(expect_bool(name, value)?),
            "heading" => self.set_heading(expect_f64(name, value)?),
            "pitch" => self.set_pitch(expect_f64(name, value)?),
            "zoomLevel" => self.set_zoom_level(expect_f64(name, value)?),
            "minZoomLevel" => self.set_min_zoom_level(expect_f64(name, value)?)?,
            "maxZoomLevel" => self.set_max_zoom_level(expect_f64(name, value)?)?,
            "centerCoordinate" => {
                let center = conversion::point_from_value(value)
                    .map_err(|e| invalid_property(name, e.to_string()))?;
                self.set_center_coordinate(center)?;
            }
            "userTrackingMode" => {
                let ordinal = value
                    .as_i64()
                    .ok_or_else(|| invalid_property(name, "expected an integer".to_string()))?;
                self.set_user_tracking_mode(TrackingMode::try_from(ordinal)?);
            }
            other => return Err(Error::UnknownProperty(other.to_string())),
        }
        Ok(())
    }

    // Camera commands

    /// Flies to `target`; `flytocomplete` is emitted when the flight lands
    pub fn fly_to(&mut self, target: LatLng, duration: Duration) -> Result<AnimationToken> {
        let engine = ready_engine(self.readiness, &mut self.engine, "flyTo")?;
        Ok(self.camera.fly_to(engine, target, duration))
    }

    /// Eases to `config` merged over the engine camera; `setcameracomplete`
    /// is emitted when it lands
    pub fn set_camera(&mut self, config: &CameraConfig) -> Result<AnimationToken> {
        let engine = ready_engine(self.readiness, &mut self.engine, "setCamera")?;
        Ok(self.camera.set_camera(engine, config))
    }

    /// Fits the camera to the geometries in `geojson`. Does nothing when they
    /// do not span at least two valid coordinates.
    pub fn fit_bounds(&mut self, geojson: &GeoJson, padding: f64, duration: Duration) -> Result<()> {
        let engine = ready_engine(self.readiness, &mut self.engine, "fitBounds")?;

        match conversion::to_lat_lng_bounds(geojson) {
            Some(bounds) => self.camera.fit_bounds(engine, bounds, padding, duration),
            None => log::debug!("fitBounds without usable geometry, skipping"),
        }
        Ok(())
    }

    // Engine callbacks

    pub fn on_map_click(&mut self, coordinate: LatLng) {
        self.emit_click(coordinate, false);
    }

    pub fn on_map_long_click(&mut self, coordinate: LatLng) {
        self.emit_click(coordinate, true);
    }

    /// Translates a raw map-changed code. Region snapshots are read from the
    /// engine camera at this point.
    pub fn on_map_changed(&mut self, code: i32) {
        let engine = self.engine.as_deref();
        let event = MapEvent::from_map_change(code, || engine.map(|e| e.camera_position()));

        match event {
            Some(event) => self.events.emit(event),
            None => log::debug!("no event for map change code {}", code),
        }
    }

    pub fn on_camera_transition_finished(&mut self, token: AnimationToken) {
        if let Some(completion) = self.camera.finish(token) {
            self.events.emit(MapEvent::CameraComplete(completion));
        }
    }

    pub fn on_camera_transition_cancelled(&mut self, token: AnimationToken) {
        self.camera.cancel(token);
    }

    pub fn on_location_connected(&mut self) {
        match self.engine.as_deref_mut() {
            Some(engine) => self.location.on_connected(engine, &mut self.camera),
            None => log::debug!("location connected without an engine"),
        }
    }

    pub fn on_location_changed(&mut self, fix: LocationFix) {
        match self.engine.as_deref_mut() {
            Some(engine) => {
                self.location
                    .on_location_changed(fix, engine, &mut self.camera, &mut self.events)
            }
            None => log::debug!("location fix without an engine"),
        }
    }

    // Events

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: EventType, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(event_type, callback);
    }

    /// Deliver queued events to listeners and return them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }

    pub fn pending_events(&self) -> usize {
        self.events.pending_events()
    }

    // Accessors

    pub fn readiness(&self) -> MapReadiness {
        self.readiness
    }

    pub fn options(&self) -> &MapViewOptions {
        &self.options
    }

    pub fn camera_intent(&self) -> &CameraIntent {
        self.camera.intent()
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        self.camera.zoom_bounds()
    }

    pub fn style_url(&self) -> Option<&str> {
        self.style_url.as_deref()
    }

    pub fn pending_animation(&self) -> Option<PendingAnimation> {
        self.camera.pending_animation()
    }

    /// Number of changes waiting for the engine
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }

    pub fn tracking_state(&self) -> TrackingState {
        self.location.state()
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.location.tracking_mode()
    }

    fn submit(&mut self, change: PropertyChange) {
        let buffered = BufferedChange {
            change,
            intent: *self.camera.intent(),
            zoom_bounds: self.camera.zoom_bounds(),
        };

        match (self.readiness, self.engine.as_deref_mut()) {
            (MapReadiness::Ready, Some(engine)) => {
                apply_change(engine, &mut self.camera, &mut self.location, &buffered)
            }
            _ => {
                log::debug!("buffering {:?} until the engine is ready", buffered.change);
                self.pending.push(buffered);
            }
        }
    }

    fn emit_click(&mut self, coordinate: LatLng, long: bool) {
        let Some(engine) = self.engine.as_deref() else {
            log::debug!("click without an engine, dropping");
            return;
        };

        let screen_point = engine.to_screen_location(coordinate);
        let event = if long {
            MapEvent::long_click(coordinate, screen_point)
        } else {
            MapEvent::click(coordinate, screen_point)
        };
        self.events.emit(event);
    }
}

fn apply_change(
    engine: &mut dyn MapEngine,
    camera: &mut CameraStateMachine,
    location: &mut LocationTrackingController,
    buffered: &BufferedChange,
) {
    match &buffered.change {
        PropertyChange::StyleUrl(url) => engine.set_style_url(url),
        PropertyChange::Animated(_)
        | PropertyChange::Heading(_)
        | PropertyChange::Pitch(_)
        | PropertyChange::ZoomLevel(_) => camera.reconcile(engine, &buffered.intent, false),
        PropertyChange::CenterCoordinate(_) => camera.reconcile(engine, &buffered.intent, true),
        PropertyChange::ScrollEnabled(enabled) => engine.set_scroll_gestures_enabled(*enabled),
        PropertyChange::PitchEnabled(enabled) => engine.set_tilt_gestures_enabled(*enabled),
        PropertyChange::MinZoomLevel(_) | PropertyChange::MaxZoomLevel(_) => {
            buffered.zoom_bounds.apply(engine)
        }
        PropertyChange::ShowUserLocation(true) => location.enable(),
        PropertyChange::ShowUserLocation(false) => location.disable(),
    }
}

fn ready_engine<'a>(
    readiness: MapReadiness,
    engine: &'a mut Option<Box<dyn MapEngine>>,
    command: &'static str,
) -> Result<&'a mut dyn MapEngine> {
    match (readiness, engine.as_deref_mut()) {
        (MapReadiness::Ready, Some(engine)) => Ok(engine),
        _ => {
            log::warn!("{} called before the engine is ready", command);
            Err(Error::EngineNotReady { command })
        }
    }
}

fn invalid_property(name: &str, reason: String) -> Error {
    Error::InvalidProperty {
        name: name.to_string(),
        reason,
    }
}

fn expect_bool(name: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid_property(name, format!("expected a boolean, got {}", value)))
}

fn expect_f64(name: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| invalid_property(name, format!("expected a number, got {}", value)))
}

fn expect_str<'v>(name: &str, value: &'v Value) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| invalid_property(name, format!("expected a string, got {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine, RecordingLocationServices};
    use serde_json::json;

    fn view() -> MapView {
        MapView::new(Box::new(RecordingLocationServices::new()))
    }

    fn ready_view() -> (MapView, RecordingEngine) {
        let mut view = view();
        let engine = RecordingEngine::new();
        view.make_view();
        view.on_engine_ready(Box::new(engine.clone())).unwrap();
        (view, engine)
    }

    #[test]
    fn test_engine_ready_before_view_is_rejected() {
        let mut view = view();
        let result = view.on_engine_ready(Box::new(RecordingEngine::new()));
        assert!(matches!(result, Err(Error::ViewNotCreated)));
        assert_eq!(view.readiness(), MapReadiness::NotCreated);
    }

    #[test]
    fn test_make_view_uses_intent() {
        let mut view = view();
        view.set_zoom_level(9.0);
        view.set_style_url("mapbox://styles/light");
        view.set_center_coordinate(LatLng::new(1.0, 2.0)).unwrap();

        let options = view.make_view().unwrap();
        assert_eq!(options.camera.zoom, 9.0);
        assert_eq!(options.camera.target, LatLng::new(1.0, 2.0));
        assert_eq!(options.style_url.as_deref(), Some("mapbox://styles/light"));
        assert!(view.make_view().is_none());
    }

    #[test]
    fn test_style_reaches_engine_once() {
        let mut view = view();
        view.set_style_url("mapbox://styles/light");
        view.set_zoom_level(4.0);

        let options = view.make_view().unwrap();
        assert_eq!(options.style_url.as_deref(), Some("mapbox://styles/light"));
        assert_eq!(view.pending_changes(), 1);

        view.set_style_url("mapbox://styles/dark");
        let engine = RecordingEngine::new();
        view.on_engine_ready(Box::new(engine.clone())).unwrap();

        let styles: Vec<_> = engine
            .calls()
            .into_iter()
            .filter(|call| matches!(call, EngineCall::StyleUrl(_)))
            .collect();
        assert_eq!(styles, vec![EngineCall::StyleUrl("mapbox://styles/dark".to_string())]);
    }

    #[test]
    fn test_second_ready_callback_keeps_first_engine() {
        let (mut view, engine) = ready_view();
        let other = RecordingEngine::new();
        view.on_engine_ready(Box::new(other.clone())).unwrap();

        view.set_scroll_enabled(false);
        assert_eq!(engine.calls(), vec![EngineCall::ScrollGestures(false)]);
        assert!(other.calls().is_empty());
    }

    #[test]
    fn test_commands_need_engine() {
        let mut view = view();
        view.make_view();

        let result = view.fly_to(LatLng::new(0.0, 0.0), Duration::from_millis(10));
        assert!(matches!(result, Err(Error::EngineNotReady { command: "flyTo" })));
        assert!(view.set_camera(&CameraConfig::default()).is_err());
    }

    #[test]
    fn test_set_property_dispatch() {
        let (mut view, engine) = ready_view();

        view.set_property("pitchEnabled", &json!(true)).unwrap();
        view.set_property("styleURL", &json!("asset://style.json")).unwrap();
        view.set_property("userTrackingMode", &json!(2)).unwrap();

        assert!(engine.tilt_enabled());
        assert_eq!(engine.style_url().as_deref(), Some("asset://style.json"));
        assert_eq!(view.tracking_mode(), TrackingMode::FollowWithHeading);
    }

    #[test]
    fn test_set_property_errors() {
        let mut view = view();

        assert!(matches!(
            view.set_property("zoomlevel", &json!(3)),
            Err(Error::UnknownProperty(name)) if name == "zoomlevel"
        ));
        assert!(matches!(
            view.set_property("heading", &json!("north")),
            Err(Error::InvalidProperty { .. })
        ));
        assert!(matches!(
            view.set_property("userTrackingMode", &json!(7)),
            Err(Error::InvalidProperty { .. })
        ));
        assert!(view.set_property("centerCoordinate", &json!({"type": "Point"})).is_err());
        assert_eq!(view.pending_changes(), 0);
    }

    #[test]
    fn test_center_accepts_string_encoding() {
        let mut view = view();
        view.set_property(
            "centerCoordinate",
            &json!(r#"{"type":"Point","coordinates":[-73.98,40.75]}"#),
        )
        .unwrap();
        assert_eq!(view.camera_intent().center, Some(LatLng::new(40.75, -73.98)));
    }

    #[test]
    fn test_inverted_zoom_bounds_leave_state_unchanged() {
        let mut view = view();
        view.set_max_zoom_level(10.0).unwrap();
        assert!(view.set_min_zoom_level(12.0).is_err());
        assert_eq!(view.zoom_bounds(), ZoomBounds { min: None, max: Some(10.0) });
        assert_eq!(view.pending_changes(), 1);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut view, _engine) = ready_view();
        view.dispose();
        view.dispose();

        assert_eq!(view.readiness(), MapReadiness::NotCreated);
        assert!(view.fit_bounds(&GeoJson::FeatureCollection { features: vec![] }, 0.0, Duration::ZERO).is_err());
    }

    #[test]
    fn test_click_payload_uses_projection() {
        let (mut view, _engine) = ready_view();
        view.on_map_click(LatLng::new(0.0, 0.0));
        view.on_map_long_click(LatLng::new(0.0, 0.0));

        let events = view.process_events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            MapEvent::Click { screen_point, .. } => {
                assert_eq!(screen_point.x, 256.0);
                assert_eq!(screen_point.y, 256.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[1].event_type(), EventType::MapLongClick);
    }
}
