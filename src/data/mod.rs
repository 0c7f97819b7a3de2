pub mod conversion;
pub mod geojson;
