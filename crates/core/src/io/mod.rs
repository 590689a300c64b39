//! I/O for rasters (GeoTIFF) and vector features (GeoJSON)

mod geojson_io;
mod geotiff;

pub use geojson_io::{read_mask_polygon, read_points, write_polygon_features};
pub use geotiff::{read_geotiff, write_geotiff};
