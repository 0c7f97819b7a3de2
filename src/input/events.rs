use crate::core::camera::CameraPosition;
use crate::core::geo::{LatLng, Point};
use crate::data::{conversion, geojson::Properties};
use crate::location::LocationFix;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Type tag carried by every outgoing event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    MapClick,
    MapLongClick,
    RegionWillChange,
    RegionIsChanging,
    RegionDidChange,
    WillStartLoadingMap,
    DidFinishLoadingMap,
    DidFailLoadingMap,
    WillStartRenderingFrame,
    DidFinishRenderingFrame,
    DidFinishRenderingFrameFully,
    WillStartRenderingMap,
    DidFinishRenderingMap,
    DidFinishRenderingMapFully,
    DidFinishLoadingStyle,
    UserLocationUpdated,
    FlyToComplete,
    SetCameraComplete,
}

impl EventType {
    /// Wire tag understood by the host
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::MapClick => "press",
            EventType::MapLongClick => "longpress",
            EventType::RegionWillChange => "regionwillchange",
            EventType::RegionIsChanging => "regionischanging",
            EventType::RegionDidChange => "regiondidchange",
            EventType::WillStartLoadingMap => "willstartloadingmap",
            EventType::DidFinishLoadingMap => "didfinishloadingmap",
            EventType::DidFailLoadingMap => "didfailloadingmap",
            EventType::WillStartRenderingFrame => "willstartrenderingframe",
            EventType::DidFinishRenderingFrame => "didfinishrenderingframe",
            EventType::DidFinishRenderingFrameFully => "didfinishrenderingframefully",
            EventType::WillStartRenderingMap => "willstartrenderingmap",
            EventType::DidFinishRenderingMap => "didfinishrenderingmap",
            EventType::DidFinishRenderingMapFully => "didfinishrenderingmapfully",
            EventType::DidFinishLoadingStyle => "didfinishloadingstyle",
            EventType::UserLocationUpdated => "userlocationupdated",
            EventType::FlyToComplete => "flytocomplete",
            EventType::SetCameraComplete => "setcameracomplete",
        }
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw map-changed codes raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MapChange {
    RegionWillChange = 0,
    RegionWillChangeAnimated = 1,
    RegionIsChanging = 2,
    RegionDidChange = 3,
    RegionDidChangeAnimated = 4,
    WillStartLoadingMap = 5,
    DidFinishLoadingMap = 6,
    DidFailLoadingMap = 7,
    WillStartRenderingFrame = 8,
    DidFinishRenderingFrame = 9,
    DidFinishRenderingFrameFullyRendered = 10,
    WillStartRenderingMap = 11,
    DidFinishRenderingMap = 12,
    DidFinishRenderingMapFullyRendered = 13,
    DidFinishLoadingStyle = 14,
}

impl MapChange {
    pub fn from_code(code: i32) -> Option<Self> {
        let change = match code {
            0 => MapChange::RegionWillChange,
            1 => MapChange::RegionWillChangeAnimated,
            2 => MapChange::RegionIsChanging,
            3 => MapChange::RegionDidChange,
            4 => MapChange::RegionDidChangeAnimated,
            5 => MapChange::WillStartLoadingMap,
            6 => MapChange::DidFinishLoadingMap,
            7 => MapChange::DidFailLoadingMap,
            8 => MapChange::WillStartRenderingFrame,
            9 => MapChange::DidFinishRenderingFrame,
            10 => MapChange::DidFinishRenderingFrameFullyRendered,
            11 => MapChange::WillStartRenderingMap,
            12 => MapChange::DidFinishRenderingMap,
            13 => MapChange::DidFinishRenderingMapFullyRendered,
            14 => MapChange::DidFinishLoadingStyle,
            _ => return None,
        };
        Some(change)
    }

    pub fn event_type(self) -> EventType {
        match self {
            MapChange::RegionWillChange | MapChange::RegionWillChangeAnimated => {
                EventType::RegionWillChange
            }
            MapChange::RegionIsChanging => EventType::RegionIsChanging,
            MapChange::RegionDidChange | MapChange::RegionDidChangeAnimated => {
                EventType::RegionDidChange
            }
            MapChange::WillStartLoadingMap => EventType::WillStartLoadingMap,
            MapChange::DidFinishLoadingMap => EventType::DidFinishLoadingMap,
            MapChange::DidFailLoadingMap => EventType::DidFailLoadingMap,
            MapChange::WillStartRenderingFrame => EventType::WillStartRenderingFrame,
            MapChange::DidFinishRenderingFrame => EventType::DidFinishRenderingFrame,
            MapChange::DidFinishRenderingFrameFullyRendered => {
                EventType::DidFinishRenderingFrameFully
            }
            MapChange::WillStartRenderingMap => EventType::WillStartRenderingMap,
            MapChange::DidFinishRenderingMap => EventType::DidFinishRenderingMap,
            MapChange::DidFinishRenderingMapFullyRendered => EventType::DidFinishRenderingMapFully,
            MapChange::DidFinishLoadingStyle => EventType::DidFinishLoadingStyle,
        }
    }

    /// `Some(animated)` for changes that carry a region snapshot
    pub fn region_snapshot(self) -> Option<bool> {
        match self {
            MapChange::RegionWillChange | MapChange::RegionDidChange => Some(false),
            MapChange::RegionWillChangeAnimated | MapChange::RegionDidChangeAnimated => Some(true),
            _ => None,
        }
    }
}

/// Camera snapshot attached to region will/did change events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPayload {
    pub center: LatLng,
    pub zoom_level: f64,
    pub heading: f64,
    pub pitch: f64,
    pub animated: bool,
}

impl RegionPayload {
    pub fn from_camera(camera: &CameraPosition, animated: bool) -> Self {
        Self {
            center: camera.target,
            zoom_level: camera.zoom,
            heading: camera.heading,
            pitch: camera.pitch,
            animated,
        }
    }

    fn to_json(self) -> Value {
        let mut properties = Properties::new();
        properties.insert("zoomLevel".into(), json!(self.zoom_level));
        properties.insert("heading".into(), json!(self.heading));
        properties.insert("pitch".into(), json!(self.pitch));
        properties.insert("animated".into(), json!(self.animated));
        feature_json(self.center, properties)
    }
}

/// Events emitted to the host
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Press or long press; `event_type` tells which
    Click {
        event_type: EventType,
        coordinate: LatLng,
        screen_point: Point,
    },
    /// Region will/is/did change; is-changing carries no snapshot
    RegionChange {
        event_type: EventType,
        region: Option<RegionPayload>,
    },
    /// Load and render lifecycle notifications
    Lifecycle(EventType),
    UserLocation(LocationFix),
    /// Completion of a correlated camera transition
    CameraComplete(EventType),
}

impl MapEvent {
    pub fn click(coordinate: LatLng, screen_point: Point) -> Self {
        MapEvent::Click {
            event_type: EventType::MapClick,
            coordinate,
            screen_point,
        }
    }

    pub fn long_click(coordinate: LatLng, screen_point: Point) -> Self {
        MapEvent::Click {
            event_type: EventType::MapLongClick,
            coordinate,
            screen_point,
        }
    }

    /// Translates a raw map-changed code. Unknown codes yield `None`; the
    /// camera is only read for region snapshots, at translation time.
    pub fn from_map_change<F>(code: i32, camera: F) -> Option<Self>
    where
        F: FnOnce() -> Option<CameraPosition>,
    {
        let change = MapChange::from_code(code)?;
        let event_type = change.event_type();

        let event = match (change, change.region_snapshot()) {
            (_, Some(animated)) => {
                let camera = camera()?;
                MapEvent::RegionChange {
                    event_type,
                    region: Some(RegionPayload::from_camera(&camera, animated)),
                }
            }
            (MapChange::RegionIsChanging, None) => MapEvent::RegionChange {
                event_type,
                region: None,
            },
            _ => MapEvent::Lifecycle(event_type),
        };
        Some(event)
    }

    pub fn event_type(&self) -> EventType {
        match self {
            MapEvent::Click { event_type, .. } | MapEvent::RegionChange { event_type, .. } => {
                *event_type
            }
            MapEvent::Lifecycle(event_type) | MapEvent::CameraComplete(event_type) => *event_type,
            MapEvent::UserLocation(_) => EventType::UserLocationUpdated,
        }
    }

    /// Payload in host wire form; events without one yield an empty object
    pub fn payload(&self) -> Value {
        match self {
            MapEvent::Click {
                coordinate,
                screen_point,
                ..
            } => {
                let mut properties = Properties::new();
                properties.insert("screenPointX".into(), json!(screen_point.x));
                properties.insert("screenPointY".into(), json!(screen_point.y));
                feature_json(*coordinate, properties)
            }
            MapEvent::RegionChange {
                region: Some(region),
                ..
            } => region.to_json(),
            MapEvent::UserLocation(fix) => {
                let mut properties = match serde_json::to_value(fix) {
                    Ok(Value::Object(map)) => map,
                    _ => Properties::new(),
                };
                properties.remove("coordinate");
                feature_json(fix.coordinate, properties)
            }
            MapEvent::RegionChange { region: None, .. }
            | MapEvent::Lifecycle(_)
            | MapEvent::CameraComplete(_) => json!({}),
        }
    }

    /// `{"type": tag, "payload": ...}` as delivered to the host
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.event_type().as_str(),
            "payload": self.payload(),
        })
    }
}

fn feature_json(coordinate: LatLng, properties: Properties) -> Value {
    serde_json::to_value(conversion::to_point_feature(coordinate, properties))
        .unwrap_or(Value::Null)
}
