//! In-memory collaborators
//!
//! [`RecordingEngine`] and [`RecordingLocationServices`] stand in for the
//! platform when no native engine is around: in tests, and in the demo binary.
//! Both are cheap handles over shared state, so a clone can be boxed into a
//! [`crate::MapView`] while the original is kept for inspection.

use crate::{
    core::{
        camera::{AnimationToken, CameraPosition, CameraUpdate},
        geo::{LatLng, Point},
    },
    location::{LocationFix, LocationPriority, TrackingMode},
    traits::{LocationOverlay, LocationServices, LocationSource, MapEngine},
};
use std::{cell::RefCell, rc::Rc, time::Duration};

/// Transition length used when a dispatch does not specify one
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(300);

/// Viewport size used for screen projection
pub const VIEWPORT_SIZE: Point = Point { x: 512.0, y: 512.0 };

/// A call received by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Move(CameraUpdate),
    Ease {
        update: CameraUpdate,
        duration: Option<Duration>,
        token: Option<AnimationToken>,
    },
    Animate {
        update: CameraUpdate,
        duration: Option<Duration>,
        token: Option<AnimationToken>,
    },
    StyleUrl(String),
    ScrollGestures(bool),
    TiltGestures(bool),
    MinZoomPreference(f64),
    MaxZoomPreference(f64),
}

#[derive(Debug, Clone)]
struct Transition {
    update: CameraUpdate,
    token: Option<AnimationToken>,
    ends_at: Duration,
}

#[derive(Debug, Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    camera: CameraPosition,
    clock: Duration,
    transition: Option<Transition>,
    cancelled: Vec<AnimationToken>,
    min_zoom: Option<f64>,
    max_zoom: Option<f64>,
    style_url: Option<String>,
    scroll_enabled: bool,
    tilt_enabled: bool,
}

impl EngineState {
    fn clamp_zoom(&self, zoom: f64) -> f64 {
        let zoom = self.min_zoom.map_or(zoom, |min| zoom.max(min));
        self.max_zoom.map_or(zoom, |max| zoom.min(max))
    }

    fn land(&mut self, update: CameraUpdate) {
        let mut camera = update.resolve(self.camera);
        camera.zoom = self.clamp_zoom(camera.zoom);
        self.camera = camera;
    }

    /// Any new dispatch interrupts the running transition
    fn interrupt(&mut self) {
        if let Some(Transition { token: Some(token), .. }) = self.transition.take() {
            self.cancelled.push(token);
        }
    }

    fn start(&mut self, update: CameraUpdate, duration: Option<Duration>, token: Option<AnimationToken>) {
        self.interrupt();
        let ends_at = self.clock + duration.unwrap_or(DEFAULT_TRANSITION);
        self.transition = Some(Transition {
            update,
            token,
            ends_at,
        });
    }
}

/// Map engine that records every call and runs transitions on a virtual clock
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    state: Rc<RefCell<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(camera: CameraPosition) -> Self {
        let engine = Self::new();
        engine.state.borrow_mut().camera = camera;
        engine
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn camera(&self) -> CameraPosition {
        self.state.borrow().camera
    }

    pub fn style_url(&self) -> Option<String> {
        self.state.borrow().style_url.clone()
    }

    pub fn scroll_enabled(&self) -> bool {
        self.state.borrow().scroll_enabled
    }

    pub fn tilt_enabled(&self) -> bool {
        self.state.borrow().tilt_enabled
    }

    pub fn zoom_preferences(&self) -> (Option<f64>, Option<f64>) {
        let state = self.state.borrow();
        (state.min_zoom, state.max_zoom)
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.borrow().transition.is_some()
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.state.borrow().clock
    }

    /// Moves the clock forward and lands a transition that is due.
    ///
    /// Returns the token of a finished correlated transition, to be passed to
    /// `MapView::on_camera_transition_finished`.
    pub fn advance(&self, elapsed: Duration) -> Vec<AnimationToken> {
        let mut state = self.state.borrow_mut();
        state.clock += elapsed;

        let due = matches!(&state.transition, Some(t) if t.ends_at <= state.clock);
        if !due {
            return Vec::new();
        }

        match state.transition.take() {
            Some(transition) => {
                state.land(transition.update);
                transition.token.into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    /// Tokens of correlated transitions interrupted since the last call
    pub fn take_cancelled(&self) -> Vec<AnimationToken> {
        std::mem::take(&mut self.state.borrow_mut().cancelled)
    }
}

impl MapEngine for RecordingEngine {
    fn camera_position(&self) -> CameraPosition {
        self.state.borrow().camera
    }

    fn move_camera(&mut self, update: CameraUpdate) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::Move(update));
        state.interrupt();
        state.land(update);
    }

    fn ease_camera(&mut self, update: CameraUpdate, duration: Option<Duration>, token: Option<AnimationToken>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::Ease {
            update,
            duration,
            token,
        });
        state.start(update, duration, token);
    }

    fn animate_camera(&mut self, update: CameraUpdate, duration: Option<Duration>, token: Option<AnimationToken>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::Animate {
            update,
            duration,
            token,
        });
        state.start(update, duration, token);
    }

    fn to_screen_location(&self, coordinate: LatLng) -> Point {
        let camera = self.state.borrow().camera;
        let origin = camera.target.project(camera.zoom);
        let half = Point::new(VIEWPORT_SIZE.x / 2.0, VIEWPORT_SIZE.y / 2.0);

        coordinate.project(camera.zoom).subtract(&origin).add(&half)
    }

    fn set_style_url(&mut self, url: &str) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::StyleUrl(url.to_string()));
        state.style_url = Some(url.to_string());
    }

    fn set_scroll_gestures_enabled(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::ScrollGestures(enabled));
        state.scroll_enabled = enabled;
    }

    fn set_tilt_gestures_enabled(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::TiltGestures(enabled));
        state.tilt_enabled = enabled;
    }

    fn set_min_zoom_preference(&mut self, zoom: f64) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::MinZoomPreference(zoom));
        state.min_zoom = Some(zoom);
        let clamped = state.clamp_zoom(state.camera.zoom);
        state.camera.zoom = clamped;
    }

    fn set_max_zoom_preference(&mut self, zoom: f64) {
        let mut state = self.state.borrow_mut();
        state.calls.push(EngineCall::MaxZoomPreference(zoom));
        state.max_zoom = Some(zoom);
        let clamped = state.clamp_zoom(state.camera.zoom);
        state.camera.zoom = clamped;
    }
}

/// Counters kept by [`RecordingLocationServices`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationLog {
    pub sources_created: usize,
    pub overlays_created: usize,
    pub activations: usize,
    pub deactivations: usize,
    /// Listeners currently registered
    pub listeners: usize,
    pub update_requests: usize,
    pub priority: Option<LocationPriority>,
    pub overlay_enabled: Option<bool>,
    pub overlay_mode: Option<TrackingMode>,
}

#[derive(Debug, Default)]
struct LocationState {
    log: LocationLog,
    last_location: Option<LocationFix>,
}

type SharedLocation = Rc<RefCell<LocationState>>;

/// Location services that count what the tracking controller asks for
#[derive(Debug, Clone, Default)]
pub struct RecordingLocationServices {
    state: SharedLocation,
}

impl RecordingLocationServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> LocationLog {
        self.state.borrow().log.clone()
    }

    /// Fix reported as the platform's last known location
    pub fn set_last_location(&self, fix: Option<LocationFix>) {
        self.state.borrow_mut().last_location = fix;
    }
}

impl LocationServices for RecordingLocationServices {
    fn create_source(&mut self) -> Box<dyn LocationSource> {
        self.state.borrow_mut().log.sources_created += 1;
        Box::new(RecordingSource(self.state.clone()))
    }

    fn create_overlay(&mut self) -> Box<dyn LocationOverlay> {
        self.state.borrow_mut().log.overlays_created += 1;
        Box::new(RecordingOverlay(self.state.clone()))
    }
}

struct RecordingSource(SharedLocation);

impl LocationSource for RecordingSource {
    fn set_priority(&mut self, priority: LocationPriority) {
        self.0.borrow_mut().log.priority = Some(priority);
    }

    fn add_listener(&mut self) {
        self.0.borrow_mut().log.listeners += 1;
    }

    fn remove_listener(&mut self) {
        let mut state = self.0.borrow_mut();
        state.log.listeners = state.log.listeners.saturating_sub(1);
    }

    fn activate(&mut self) {
        self.0.borrow_mut().log.activations += 1;
    }

    fn deactivate(&mut self) {
        self.0.borrow_mut().log.deactivations += 1;
    }

    fn request_location_updates(&mut self) {
        self.0.borrow_mut().log.update_requests += 1;
    }

    fn last_location(&self) -> Option<LocationFix> {
        self.0.borrow().last_location.clone()
    }
}

struct RecordingOverlay(SharedLocation);

impl LocationOverlay for RecordingOverlay {
    fn set_enabled(&mut self, enabled: bool) {
        self.0.borrow_mut().log.overlay_enabled = Some(enabled);
    }

    fn tracking_mode(&self) -> TrackingMode {
        self.0.borrow().log.overlay_mode.unwrap_or_default()
    }

    fn set_tracking_mode(&mut self, mode: TrackingMode) {
        self.0.borrow_mut().log.overlay_mode = Some(mode);
    }
}
