//! # mapsync
//!
//! Keeps a native map engine in step with a declarative view tree.
//!
//! The host sets properties (camera, style, gestures, user location) on a
//! [`MapView`]; the view turns them into engine camera updates, buffering
//! them until the engine is ready. Engine callbacks (map-changed codes,
//! clicks, camera transitions, location fixes) come back as a uniform set of
//! [`MapEvent`]s with a JSON wire form.

pub mod core;
pub mod data;
pub mod input;
pub mod location;
pub mod prelude;
pub mod testing;
pub mod traits;

// Re-export public API
pub use crate::core::{
    camera::{AnimationToken, CameraConfig, CameraPosition, CameraUpdate},
    config::{MapViewOptions, MapViewProfile},
    geo::{LatLng, LatLngBounds, Point},
    map::{MapReadiness, MapView},
};

pub use crate::data::geojson::GeoJson;

pub use crate::input::{EventType, MapEvent};

pub use crate::location::{LocationFix, TrackingMode};

pub use crate::traits::{LocationOverlay, LocationServices, LocationSource, MapEngine};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("{command} requires a ready map engine")]
    EngineNotReady { command: &'static str },

    #[error("Map view has not been created")]
    ViewNotCreated,

    #[error("Invalid zoom bounds: min {min} is greater than max {max}")]
    InvalidZoomBounds { min: f64, max: f64 },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend, honoring `RUST_LOG`.
/// Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
