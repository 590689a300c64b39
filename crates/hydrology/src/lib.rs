//! # hydroshed-hydrology
//!
//! Hydrological analysis operations for watershed delineation:
//! - Mask extraction: clip a DEM to a polygon boundary
//! - Fill sinks: remove depressions for continuous flow (Planchon-Darboux)
//! - Flow direction: D8 single flow direction, ESRI power-of-two codes
//! - Flow accumulation: upstream contributing cell count
//! - Pour-point snapping: move outlets onto high-accumulation cells
//! - Watershed: catchment delineation from pour points
//! - Basins: partition of the grid into independent drainage basins
//! - Vectorization: labeled rasters to polygon geometries

pub mod d8;
mod basins;
mod fill_sinks;
mod flow_accumulation;
mod flow_direction;
mod mask;
mod snap;
mod vectorize;
mod watershed;

pub use basins::basins;
pub use fill_sinks::{fill_sinks, FillSinksParams};
pub use flow_accumulation::flow_accumulation;
pub use flow_direction::flow_direction;
pub use mask::extract_by_mask;
pub use snap::{snap_pour_points, PourCell, SnapResult};
pub use vectorize::{raster_to_polygon, VectorizeParams};
pub use watershed::watershed;
