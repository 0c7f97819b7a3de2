pub mod tracking;

use crate::core::geo::LatLng;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub use tracking::{LocationTrackingController, TrackingState};

/// A single fix reported by the location source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub coordinate: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Course over ground in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl LocationFix {
    pub fn new(coordinate: LatLng, timestamp: u64) -> Self {
        Self {
            coordinate,
            altitude: None,
            accuracy: None,
            heading: None,
            speed: None,
            timestamp,
        }
    }
}

/// How the overlay follows the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackingMode {
    #[default]
    None,
    Follow,
    FollowWithHeading,
    FollowWithCourse,
}

impl TrackingMode {
    pub fn is_tracking(self) -> bool {
        self != TrackingMode::None
    }
}

impl TryFrom<i64> for TrackingMode {
    type Error = Error;

    fn try_from(ordinal: i64) -> Result<Self> {
        match ordinal {
            0 => Ok(TrackingMode::None),
            1 => Ok(TrackingMode::Follow),
            2 => Ok(TrackingMode::FollowWithHeading),
            3 => Ok(TrackingMode::FollowWithCourse),
            other => Err(Error::InvalidProperty {
                name: "userTrackingMode".to_string(),
                reason: format!("unknown tracking mode {}", other),
            }),
        }
    }
}

/// Accuracy/power trade-off requested from the location source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPriority {
    NoPower,
    LowPower,
    BalancedPowerAccuracy,
    #[default]
    HighAccuracy,
}

/// When a location fix moves the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecenterPolicy {
    /// Every fix recenters the camera
    Always,
    /// Only while the tracking mode is not `None`
    #[default]
    WhenTracking,
    /// Fixes never move the camera
    Never,
}

impl RecenterPolicy {
    pub fn should_recenter(self, mode: TrackingMode) -> bool {
        match self {
            RecenterPolicy::Always => true,
            RecenterPolicy::WhenTracking => mode.is_tracking(),
            RecenterPolicy::Never => false,
        }
    }
}
