use super::{LocationFix, LocationPriority, RecenterPolicy, TrackingMode};
use crate::core::camera::CameraStateMachine;
use crate::input::{EventManager, MapEvent};
use crate::traits::{LocationOverlay, LocationServices, LocationSource, MapEngine};

/// Lifecycle of the location subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Disabled,
    /// Source activated, waiting for it to connect
    Activating,
    Active,
}

/// Drives the location source and user-location overlay.
///
/// At most one source and one overlay exist; both are created lazily the
/// first time the user location is shown and live until teardown.
pub struct LocationTrackingController {
    services: Box<dyn LocationServices>,
    source: Option<Box<dyn LocationSource>>,
    overlay: Option<Box<dyn LocationOverlay>>,
    state: TrackingState,
    tracking_mode: TrackingMode,
    priority: LocationPriority,
    recenter: RecenterPolicy,
}

impl LocationTrackingController {
    pub fn new(
        services: Box<dyn LocationServices>,
        priority: LocationPriority,
        recenter: RecenterPolicy,
    ) -> Self {
        Self {
            services,
            source: None,
            overlay: None,
            state: TrackingState::Disabled,
            tracking_mode: TrackingMode::None,
            priority,
            recenter,
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.tracking_mode
    }

    /// Starts the subscription; a no-op unless currently disabled
    pub fn enable(&mut self) {
        if self.state != TrackingState::Disabled {
            log::debug!("location tracking already {:?}", self.state);
            return;
        }

        let priority = self.priority;
        let services = &mut self.services;
        let source = self.source.get_or_insert_with(|| {
            let mut source = services.create_source();
            source.set_priority(priority);
            source
        });
        source.add_listener();
        source.activate();

        let overlay = self
            .overlay
            .get_or_insert_with(|| services.create_overlay());
        overlay.set_enabled(true);
        if overlay.tracking_mode() != self.tracking_mode {
            overlay.set_tracking_mode(self.tracking_mode);
        }

        self.state = TrackingState::Activating;
        log::info!("location tracking activating");
    }

    /// Stops the subscription from any state
    pub fn disable(&mut self) {
        if self.state == TrackingState::Disabled {
            return;
        }

        if let Some(source) = self.source.as_mut() {
            source.remove_listener();
            source.deactivate();
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_enabled(false);
        }

        self.state = TrackingState::Disabled;
        log::info!("location tracking disabled");
    }

    /// The source is up: request fixes and jump to the last known one.
    /// The jump happens whatever the recenter policy says.
    pub fn on_connected(&mut self, engine: &mut dyn MapEngine, camera: &mut CameraStateMachine) {
        if self.state != TrackingState::Activating {
            log::debug!("ignoring location connect while {:?}", self.state);
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };

        source.request_location_updates();
        self.state = TrackingState::Active;

        if let Some(fix) = source.last_location() {
            camera.center_on(engine, fix.coordinate, false);
        }
    }

    /// Reports the fix to the host and follows it with the camera
    pub fn on_location_changed(
        &mut self,
        fix: LocationFix,
        engine: &mut dyn MapEngine,
        camera: &mut CameraStateMachine,
        events: &mut EventManager,
    ) {
        if self.state != TrackingState::Active {
            log::debug!("dropping location fix while {:?}", self.state);
            return;
        }

        let target = fix.coordinate;
        events.emit(MapEvent::UserLocation(fix));

        if self.recenter.should_recenter(self.tracking_mode) {
            camera.center_on(engine, target, true);
        }
    }

    /// Stores the mode; the overlay is only touched if it already exists
    pub fn set_tracking_mode(&mut self, mode: TrackingMode) {
        self.tracking_mode = mode;

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_tracking_mode(mode);
        }
    }

    /// Detaches everything; safe to call repeatedly
    pub fn teardown(&mut self) {
        self.disable();
        self.source = None;
        self.overlay = None;
    }
}
