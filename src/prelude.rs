//! Prelude module for common mapsync types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapsync::prelude::*;`

pub use crate::core::{
    camera::{AnimationToken, CameraConfig, CameraIntent, CameraPosition, CameraUpdate, ZoomBounds},
    config::{CameraOptions, LocationOptions, MapViewOptions, MapViewProfile},
    geo::{LatLng, LatLngBounds, Point},
    map::{MapReadiness, MapView, PropertyChange, ViewOptions},
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use crate::input::{EventManager, EventType, MapEvent};

pub use crate::location::{LocationFix, LocationPriority, RecenterPolicy, TrackingMode, TrackingState};

pub use crate::traits::{LocationOverlay, LocationServices, LocationSource, MapEngine};

pub use crate::{Error as MapError, Result};

pub use std::{collections::VecDeque, time::Duration};

pub use fxhash::FxHashMap as HashMap;
