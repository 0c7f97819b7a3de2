//! Conversion between host geographic values and engine geometry.
//!
//! The host speaks GeoJSON (points, features, feature collections, often as
//! JSON strings); the engine speaks [`LatLng`], [`LatLngBounds`] and screen
//! [`Point`]s.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Properties};
use crate::{Error, Result};
use geo::BoundingRect;
use geo_types::MultiPoint;

/// Converts a GeoJSON point geometry into an engine coordinate
pub fn to_lat_lng(geometry: &GeoJsonGeometry) -> Result<LatLng> {
    match geometry {
        GeoJsonGeometry::Point { coordinates } => {
            let lat_lng = LatLng::new(coordinates[1], coordinates[0]);
            if lat_lng.is_valid() {
                Ok(lat_lng)
            } else {
                Err(Error::InvalidCoordinates(format!(
                    "{}, {}",
                    coordinates[0], coordinates[1]
                )))
            }
        }
        other => Err(Error::InvalidGeometry(format!(
            "expected a Point, got {:?}",
            other
        ))),
    }
}

/// Reads a point from a host value: a GeoJSON object (Point geometry or
/// Point feature) or a string holding its JSON encoding.
pub fn point_from_value(value: &serde_json::Value) -> Result<LatLng> {
    if let Some(encoded) = value.as_str() {
        let decoded: serde_json::Value = serde_json::from_str(encoded)?;
        return point_from_value(&decoded);
    }

    match serde_json::from_value::<GeoJson>(value.clone())? {
        GeoJson::Geometry(geometry) => to_lat_lng(&geometry),
        GeoJson::Feature(GeoJsonFeature {
            geometry: Some(geometry),
            ..
        }) => to_lat_lng(&geometry),
        _ => Err(Error::InvalidGeometry(
            "expected a Point geometry or feature".to_string(),
        )),
    }
}

/// Converts an engine coordinate into a GeoJSON point geometry
pub fn to_point_geometry(lat_lng: LatLng) -> GeoJsonGeometry {
    GeoJsonGeometry::Point {
        coordinates: [lat_lng.lng, lat_lng.lat],
    }
}

/// Builds a point feature carrying the given properties
pub fn to_point_feature(lat_lng: LatLng, properties: Properties) -> GeoJson {
    GeoJson::Feature(GeoJsonFeature {
        id: None,
        geometry: Some(to_point_geometry(lat_lng)),
        properties: Some(properties),
    })
}

/// Derives the bounding box of every valid coordinate in the collection.
///
/// Returns `None` when fewer than two valid coordinates exist, since the
/// engine cannot fit a camera to a degenerate box.
pub fn to_lat_lng_bounds(geojson: &GeoJson) -> Option<LatLngBounds> {
    let points: Vec<LatLng> = geojson
        .geometries()
        .into_iter()
        .flat_map(|geometry| geometry.to_lat_lng_points())
        .filter(LatLng::is_valid)
        .collect();

    if points.len() < 2 {
        return None;
    }

    let multi_point: MultiPoint<f64> = points
        .iter()
        .map(|p| geo_types::Point::new(p.lng, p.lat))
        .collect();
    let rect = multi_point.bounding_rect()?;

    Some(LatLngBounds::from_coords(
        rect.min().y,
        rect.min().x,
        rect.max().y,
        rect.max().x,
    ))
}
