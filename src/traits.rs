//! Collaborator seams
//!
//! The native engine, the location source and the user-location overlay are
//! owned by the platform. These traits describe the slice of each that the
//! synchronization layer drives; callbacks flow back in through
//! [`crate::MapView`].

use crate::{
    core::{
        camera::{AnimationToken, CameraPosition, CameraUpdate},
        geo::{LatLng, Point},
    },
    location::{LocationFix, LocationPriority, TrackingMode},
};
use std::time::Duration;

/// Handle to the native map engine
pub trait MapEngine {
    /// Current camera state
    fn camera_position(&self) -> CameraPosition;

    /// Jumps to the update without animation
    fn move_camera(&mut self, update: CameraUpdate);

    /// Eases to the update. When a token is given the engine reports back via
    /// `MapView::on_camera_transition_finished` unless a newer transition
    /// supersedes this one.
    fn ease_camera(&mut self, update: CameraUpdate, duration: Option<Duration>, token: Option<AnimationToken>);

    /// Animated flight to the update, with the same completion contract
    fn animate_camera(&mut self, update: CameraUpdate, duration: Option<Duration>, token: Option<AnimationToken>);

    /// Projects a coordinate into view-relative screen pixels
    fn to_screen_location(&self, coordinate: LatLng) -> Point;

    fn set_style_url(&mut self, url: &str);

    fn set_scroll_gestures_enabled(&mut self, enabled: bool);

    fn set_tilt_gestures_enabled(&mut self, enabled: bool);

    fn set_min_zoom_preference(&mut self, zoom: f64);

    fn set_max_zoom_preference(&mut self, zoom: f64);
}

/// Handle to a stream of device location fixes.
///
/// Fixes are delivered to `MapView::on_location_changed` while a listener is
/// registered and updates were requested; `MapView::on_location_connected`
/// signals that the source is up.
pub trait LocationSource {
    fn set_priority(&mut self, priority: LocationPriority);

    fn add_listener(&mut self);

    fn remove_listener(&mut self);

    fn activate(&mut self);

    fn deactivate(&mut self);

    fn request_location_updates(&mut self);

    /// Most recent fix known to the platform, if any
    fn last_location(&self) -> Option<LocationFix>;
}

/// The visual layer showing the device's own location
pub trait LocationOverlay {
    fn set_enabled(&mut self, enabled: bool);

    fn tracking_mode(&self) -> TrackingMode;

    fn set_tracking_mode(&mut self, mode: TrackingMode);
}

/// Creates location collaborators on demand, once the engine is ready
pub trait LocationServices {
    fn create_source(&mut self) -> Box<dyn LocationSource>;

    fn create_overlay(&mut self) -> Box<dyn LocationOverlay>;
}
