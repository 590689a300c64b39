//! # hydroshed-core
//!
//! Core types and I/O for the hydroshed watershed-delineation toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid over `ndarray`
//! - `GeoTransform`: affine pixel/world mapping for north-up rasters
//! - `RasterElement`: trait bounding raster cell types
//! - GeoTIFF raster I/O and GeoJSON vector I/O

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}
