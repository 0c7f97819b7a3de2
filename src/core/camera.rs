//! Camera intent and its reconciliation against the engine camera.
//!
//! [`CameraStateMachine`] holds what the host asked for (center, zoom,
//! heading, pitch, zoom bounds) and turns each change or explicit command into
//! exactly one engine dispatch. Animated dispatches that the host wants to hear
//! back about are correlated with an [`AnimationToken`]; only the most recent
//! one is ever resolved.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::input::events::EventType;
use crate::traits::MapEngine;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Duration used by `set_camera` when the request does not carry one
pub const DEFAULT_SET_CAMERA_DURATION_MS: u64 = 2000;

/// Camera state as the engine reports it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub target: LatLng,
    pub zoom: f64,
    /// Bearing in degrees
    pub heading: f64,
    /// Tilt in degrees
    pub pitch: f64,
}

impl CameraPosition {
    pub fn new(target: LatLng, zoom: f64, heading: f64, pitch: f64) -> Self {
        Self {
            target,
            zoom,
            heading,
            pitch,
        }
    }

    pub fn with_target(mut self, target: LatLng) -> Self {
        self.target = target;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }
}

impl Default for CameraPosition {
    fn default() -> Self {
        Self::new(LatLng::default(), 0.0, 0.0, 0.0)
    }
}

/// A camera change request handed to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraUpdate {
    /// Replace the whole camera
    NewPosition(CameraPosition),
    /// Move the target only, keeping zoom, heading and pitch
    NewLatLng(LatLng),
    /// Fit the camera to a box with uniform padding in pixels
    NewBounds { bounds: LatLngBounds, padding: f64 },
}

impl CameraUpdate {
    /// Position the engine ends up at when starting from `from`.
    ///
    /// Bounds fitting depends on the viewport, so only the target moves here;
    /// real engines compute the zoom themselves.
    pub fn resolve(&self, from: CameraPosition) -> CameraPosition {
        match self {
            CameraUpdate::NewPosition(position) => *position,
            CameraUpdate::NewLatLng(target) => from.with_target(*target),
            CameraUpdate::NewBounds { bounds, .. } => from.with_target(bounds.center()),
        }
    }
}

/// Correlates an in-flight transition with its completion callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationToken(pub u64);

/// A transition whose completion the host is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAnimation {
    pub token: AnimationToken,
    pub completion: EventType,
}

/// What the host has asked the camera to look like
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraIntent {
    /// Unset until the host provides a center
    pub center: Option<LatLng>,
    pub zoom: f64,
    pub heading: f64,
    pub pitch: f64,
    pub animated: bool,
}

impl CameraIntent {
    /// Camera used to construct the engine before it reports ready
    pub fn initial_position(&self) -> CameraPosition {
        CameraPosition::new(
            self.center.unwrap_or_default(),
            self.zoom,
            self.heading,
            self.pitch,
        )
    }

    /// Applies heading, pitch and zoom on top of `previous`; the target is
    /// only replaced when `update_target` is set and a center is known.
    pub fn build_position(&self, previous: CameraPosition, update_target: bool) -> CameraPosition {
        let position = previous
            .with_heading(self.heading)
            .with_pitch(self.pitch)
            .with_zoom(self.zoom);

        match self.center {
            Some(center) if update_target => position.with_target(center),
            _ => position,
        }
    }
}

/// Optional zoom range preferences
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ZoomBounds {
    /// Returns the bounds with a new minimum, rejecting an inverted range
    pub fn with_min(self, min: f64) -> Result<Self> {
        Self { min: Some(min), ..self }.validated()
    }

    /// Returns the bounds with a new maximum, rejecting an inverted range
    pub fn with_max(self, max: f64) -> Result<Self> {
        Self { max: Some(max), ..self }.validated()
    }

    fn validated(self) -> Result<Self> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(Error::InvalidZoomBounds { min, max }),
            _ => Ok(self),
        }
    }

    /// Pushes every present bound to the engine, which clamps the live zoom
    pub fn apply(&self, engine: &mut dyn MapEngine) {
        if let Some(min) = self.min {
            engine.set_min_zoom_preference(min);
        }
        if let Some(max) = self.max {
            engine.set_max_zoom_preference(max);
        }
    }
}

/// Options recognized by `set_camera`; absent fields keep the engine value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    pub pitch: Option<f64>,
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_center")]
    pub center_coordinate: Option<LatLng>,
    /// Milliseconds
    pub duration: Option<u64>,
}

fn deserialize_center<'de, D>(deserializer: D) -> std::result::Result<Option<LatLng>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => crate::data::conversion::point_from_value(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl CameraConfig {
    /// Parses a host request object
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Owns camera intent, zoom bounds and the single pending animation
#[derive(Debug)]
pub struct CameraStateMachine {
    intent: CameraIntent,
    zoom_bounds: ZoomBounds,
    in_flight: Option<PendingAnimation>,
    next_token: u64,
    default_duration: Duration,
}

impl CameraStateMachine {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            intent: CameraIntent::default(),
            zoom_bounds: ZoomBounds::default(),
            in_flight: None,
            next_token: 1,
            default_duration,
        }
    }

    pub fn intent(&self) -> &CameraIntent {
        &self.intent
    }

    pub fn intent_mut(&mut self) -> &mut CameraIntent {
        &mut self.intent
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        self.zoom_bounds
    }

    pub fn set_zoom_bounds(&mut self, bounds: ZoomBounds) {
        self.zoom_bounds = bounds;
    }

    pub fn pending_animation(&self) -> Option<PendingAnimation> {
        self.in_flight
    }

    /// Issues the camera described by `intent`, easing when it is animated
    pub fn reconcile(&mut self, engine: &mut dyn MapEngine, intent: &CameraIntent, update_target: bool) {
        let position = intent.build_position(engine.camera_position(), update_target);
        let update = CameraUpdate::NewPosition(position);

        self.supersede();
        if intent.animated {
            engine.ease_camera(update, None, None);
        } else {
            engine.move_camera(update);
        }
    }

    /// Points the camera at `target`, keeping everything else
    pub fn center_on(&mut self, engine: &mut dyn MapEngine, target: LatLng, animated: bool) {
        let update = CameraUpdate::NewLatLng(target);

        self.supersede();
        if animated {
            engine.animate_camera(update, None, None);
        } else {
            engine.move_camera(update);
        }
    }

    /// Flies to `target` and reports `flytocomplete` when the engine finishes
    pub fn fly_to(&mut self, engine: &mut dyn MapEngine, target: LatLng, duration: Duration) -> AnimationToken {
        let position = engine.camera_position().with_target(target);
        let token = self.begin(EventType::FlyToComplete);

        engine.animate_camera(CameraUpdate::NewPosition(position), Some(duration), Some(token));
        token
    }

    /// Eases to the merged request and reports `setcameracomplete`
    pub fn set_camera(&mut self, engine: &mut dyn MapEngine, config: &CameraConfig) -> AnimationToken {
        let mut position = engine.camera_position();
        if let Some(pitch) = config.pitch {
            position.pitch = pitch;
        }
        if let Some(heading) = config.heading {
            position.heading = heading;
        }
        if let Some(center) = config.center_coordinate {
            position.target = center;
        }

        let duration = config
            .duration
            .map(Duration::from_millis)
            .unwrap_or(self.default_duration);
        let token = self.begin(EventType::SetCameraComplete);

        engine.ease_camera(CameraUpdate::NewPosition(position), Some(duration), Some(token));
        token
    }

    /// Eases to `bounds` without a completion event
    pub fn fit_bounds(
        &mut self,
        engine: &mut dyn MapEngine,
        bounds: LatLngBounds,
        padding: f64,
        duration: Duration,
    ) {
        self.supersede();
        engine.ease_camera(
            CameraUpdate::NewBounds { bounds, padding },
            Some(duration),
            None,
        );
    }

    /// Resolves a finished transition; stale tokens yield nothing
    pub fn finish(&mut self, token: AnimationToken) -> Option<EventType> {
        match self.in_flight {
            Some(pending) if pending.token == token => {
                self.in_flight = None;
                Some(pending.completion)
            }
            _ => {
                log::debug!("ignoring completion for superseded transition {:?}", token);
                None
            }
        }
    }

    /// Drops the pending animation if the engine cancelled it
    pub fn cancel(&mut self, token: AnimationToken) {
        if self.in_flight.map(|pending| pending.token) == Some(token) {
            self.in_flight = None;
        }
    }

    /// Forgets any in-flight transition, as on teardown
    pub fn reset_pending(&mut self) {
        self.in_flight = None;
    }

    fn begin(&mut self, completion: EventType) -> AnimationToken {
        let token = AnimationToken(self.next_token);
        self.next_token += 1;

        if let Some(previous) = self.in_flight.replace(PendingAnimation { token, completion }) {
            log::debug!("transition {:?} superseded by {:?}", previous.token, token);
        }
        token
    }

    /// Any new dispatch cancels the engine's current transition
    fn supersede(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            log::debug!("transition {:?} superseded", previous.token);
        }
    }
}

impl Default for CameraStateMachine {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SET_CAMERA_DURATION_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine};
    use serde_json::json;

    fn engine_at(position: CameraPosition) -> RecordingEngine {
        RecordingEngine::with_camera(position)
    }

    #[test]
    fn test_build_position_keeps_target_without_center_change() {
        let previous = CameraPosition::new(LatLng::new(10.0, 20.0), 3.0, 0.0, 0.0);
        let intent = CameraIntent {
            center: Some(LatLng::new(-5.0, -5.0)),
            zoom: 8.0,
            heading: 45.0,
            pitch: 30.0,
            animated: false,
        };

        let kept = intent.build_position(previous, false);
        assert_eq!(kept.target, previous.target);
        assert_eq!(kept.zoom, 8.0);
        assert_eq!(kept.heading, 45.0);
        assert_eq!(kept.pitch, 30.0);

        let moved = intent.build_position(previous, true);
        assert_eq!(moved.target, LatLng::new(-5.0, -5.0));
    }

    #[test]
    fn test_unset_center_never_resets_target() {
        let previous = CameraPosition::new(LatLng::new(10.0, 20.0), 3.0, 0.0, 0.0);
        let intent = CameraIntent::default();
        assert_eq!(intent.build_position(previous, true).target, previous.target);
    }

    #[test]
    fn test_zoom_bounds_reject_inverted_range() {
        let bounds = ZoomBounds::default().with_min(4.0).unwrap();
        assert!(matches!(
            bounds.with_max(2.0),
            Err(Error::InvalidZoomBounds { min, max }) if min == 4.0 && max == 2.0
        ));
        assert_eq!(bounds.with_max(4.0).unwrap().max, Some(4.0));
    }

    #[test]
    fn test_reconcile_dispatch_mode() {
        let mut engine = engine_at(CameraPosition::default());
        let mut camera = CameraStateMachine::default();

        let mut intent = CameraIntent {
            zoom: 5.0,
            ..Default::default()
        };
        camera.reconcile(&mut engine, &intent, false);
        intent.animated = true;
        camera.reconcile(&mut engine, &intent, false);

        let calls = engine.calls();
        assert!(matches!(calls[0], EngineCall::Move(_)));
        assert!(matches!(calls[1], EngineCall::Ease { token: None, .. }));
    }

    #[test]
    fn test_set_camera_merges_with_engine_state() {
        let start = CameraPosition::new(LatLng::new(1.0, 2.0), 7.0, 10.0, 20.0);
        let mut engine = engine_at(start);
        let mut camera = CameraStateMachine::default();

        let config = CameraConfig::from_value(json!({"heading": 90.0})).unwrap();
        let token = camera.set_camera(&mut engine, &config);

        match engine.calls().last() {
            Some(EngineCall::Ease {
                update: CameraUpdate::NewPosition(position),
                duration,
                token: Some(dispatched),
            }) => {
                assert_eq!(*position, start.with_heading(90.0));
                assert_eq!(*duration, Some(Duration::from_millis(2000)));
                assert_eq!(*dispatched, token);
            }
            other => panic!("unexpected dispatch {:?}", other),
        }
    }

    #[test]
    fn test_camera_config_accepts_string_center() {
        let config = CameraConfig::from_value(json!({
            "centerCoordinate": "{\"type\":\"Point\",\"coordinates\":[2.0,1.0]}",
            "duration": 500
        }))
        .unwrap();

        assert_eq!(config.center_coordinate, Some(LatLng::new(1.0, 2.0)));
        assert_eq!(config.duration, Some(500));
        assert_eq!(config.pitch, None);
    }

    #[test]
    fn test_only_latest_token_resolves() {
        let mut engine = engine_at(CameraPosition::default());
        let mut camera = CameraStateMachine::default();

        let first = camera.fly_to(&mut engine, LatLng::new(1.0, 1.0), Duration::from_millis(100));
        let second = camera.fly_to(&mut engine, LatLng::new(2.0, 2.0), Duration::from_millis(100));

        assert_eq!(camera.finish(first), None);
        assert_eq!(camera.finish(second), Some(EventType::FlyToComplete));
        assert_eq!(camera.finish(second), None);
    }

    #[test]
    fn test_uncorrelated_dispatch_supersedes_pending() {
        let mut engine = engine_at(CameraPosition::default());
        let mut camera = CameraStateMachine::default();

        let token = camera.fly_to(&mut engine, LatLng::new(1.0, 1.0), Duration::from_millis(100));
        camera.center_on(&mut engine, LatLng::new(3.0, 3.0), true);

        assert!(camera.pending_animation().is_none());
        assert_eq!(camera.finish(token), None);
    }

    #[test]
    fn test_cancel_drops_matching_pending() {
        let mut engine = engine_at(CameraPosition::default());
        let mut camera = CameraStateMachine::default();

        let token = camera.set_camera(&mut engine, &CameraConfig::default());
        camera.cancel(AnimationToken(token.0 + 10));
        assert!(camera.pending_animation().is_some());
        camera.cancel(token);
        assert!(camera.pending_animation().is_none());
    }
}
