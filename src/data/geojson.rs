use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Property bag attached to a feature
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
    #[serde(untagged)]
    Geometry(GeoJsonGeometry),
}

impl GeoJson {
    /// Parses GeoJSON from a string
    pub fn from_str(geojson_str: &str) -> crate::Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| crate::Error::InvalidGeometry(format!("Invalid GeoJSON: {}", e)))
    }

    /// Every geometry carried by this object, in document order
    pub fn geometries(&self) -> Vec<&GeoJsonGeometry> {
        match self {
            GeoJson::Feature(feature) => feature.geometry.iter().collect(),
            GeoJson::FeatureCollection { features } => features
                .iter()
                .filter_map(|feature| feature.geometry.as_ref())
                .collect(),
            GeoJson::Geometry(geometry) => vec![geometry],
        }
    }
}

impl GeoJsonGeometry {
    /// Converts coordinates to LatLng points
    pub fn to_lat_lng_points(&self) -> Vec<LatLng> {
        fn convert(coords: &[[f64; 2]]) -> impl Iterator<Item = LatLng> + '_ {
            coords.iter().map(|c| LatLng::new(c[1], c[0]))
        }

        match self {
            GeoJsonGeometry::Point { coordinates } => {
                vec![LatLng::new(coordinates[1], coordinates[0])]
            }
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => convert(coordinates).collect(),
            GeoJsonGeometry::Polygon { coordinates } => coordinates
                .first()
                .map(|exterior| convert(exterior).collect())
                .unwrap_or_default(),
            GeoJsonGeometry::MultiLineString { coordinates } => coordinates
                .iter()
                .flat_map(|line| convert(line))
                .collect(),
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|polygon| polygon.first())
                .flat_map(|exterior| convert(exterior))
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .flat_map(|geom| geom.to_lat_lng_points())
                .collect(),
        }
    }
}
