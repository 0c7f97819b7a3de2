//! Configuration for map view behavior
//!
//! Options can be built from a preset profile or deserialized from host JSON.
//! Every field has a default, so partial documents are accepted.

use crate::core::camera::DEFAULT_SET_CAMERA_DURATION_MS;
use crate::location::{LocationPriority, RecenterPolicy};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum MapViewProfile {
    /// Balanced defaults for an embedded map
    Standard,
    /// Turn-by-turn style: high accuracy, camera always follows the device
    Navigation,
    /// Background map: low power, location never moves the camera
    Passive,
    Custom(MapViewOptions),
}

impl MapViewProfile {
    pub fn resolve(&self) -> MapViewOptions {
        match self {
            Self::Standard => MapViewOptions::default(),
            Self::Navigation => MapViewOptions {
                camera: CameraOptions {
                    set_camera_duration_ms: 1000,
                },
                location: LocationOptions {
                    priority: LocationPriority::HighAccuracy,
                    recenter: RecenterPolicy::Always,
                },
            },
            Self::Passive => MapViewOptions {
                camera: CameraOptions::default(),
                location: LocationOptions {
                    priority: LocationPriority::LowPower,
                    recenter: RecenterPolicy::Never,
                },
            },
            Self::Custom(options) => options.clone(),
        }
    }

    /// Looks a preset up by name, as passed on a command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "navigation" => Some(Self::Navigation),
            "passive" => Some(Self::Passive),
            _ => None,
        }
    }
}

impl Default for MapViewProfile {
    fn default() -> Self {
        Self::Standard
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapViewOptions {
    pub camera: CameraOptions,
    pub location: LocationOptions,
}

impl MapViewOptions {
    /// Parses options from a JSON document; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraOptions {
    /// Used by `set_camera` when the request carries no duration
    pub set_camera_duration_ms: u64,
}

impl CameraOptions {
    pub fn set_camera_duration(&self) -> Duration {
        Duration::from_millis(self.set_camera_duration_ms)
    }
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            set_camera_duration_ms: DEFAULT_SET_CAMERA_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationOptions {
    pub priority: LocationPriority,
    pub recenter: RecenterPolicy,
}
