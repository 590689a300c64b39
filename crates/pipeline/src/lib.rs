//! # hydroshed-pipeline
//!
//! End-to-end watershed delineation: clip a DEM to an optional mask,
//! fill sinks, derive D8 flow direction and accumulation, snap pour
//! points onto high-accumulation cells, delineate the watershed and
//! all drainage basins, and vectorize both label rasters to GeoJSON.
//!
//! Outputs land in a workspace directory under fixed names so runs
//! are directly comparable; existing files are overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use hydroshed_core::io::{read_geotiff, read_mask_polygon, read_points, write_geotiff, write_polygon_features};
use hydroshed_core::prelude::*;
use hydroshed_hydrology::{
    basins, extract_by_mask, fill_sinks, flow_accumulation, flow_direction, raster_to_polygon,
    snap_pour_points, watershed, FillSinksParams, VectorizeParams,
};

/// Clipped DEM, written only when a mask polygon is supplied.
pub const DEM_CLIPPED: &str = "DEM_Clipped.tif";
/// D8 flow direction raster.
pub const FLOW_DIR: &str = "FlowDir.tif";
/// Flow accumulation raster.
pub const FLOW_ACCU: &str = "FlowAccu.tif";
/// Snapped pour point raster.
pub const SNAPPED_POUR_POINTS: &str = "SnaPP.tif";
/// Watershed label raster.
pub const WATERSHED: &str = "Watershed.tif";
/// Drainage basin label raster.
pub const BASIN: &str = "Basin.tif";
/// Watershed polygon features.
pub const WATERSHED_POLYGON: &str = "Watershed_Polygon.geojson";
/// Drainage basin polygon features.
pub const BASIN_POLYGON: &str = "Basin_Polygon.geojson";

/// Attribute carrying the raster label value on polygon features.
pub const VALUE_FIELD: &str = "gridcode";

/// Inputs and output location for a delineation run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving every output artifact. Created if missing.
    pub workspace: PathBuf,
    /// Input DEM, GeoTIFF.
    pub dem: PathBuf,
    /// Pour point features, GeoJSON points.
    pub pour_points: PathBuf,
    /// Optional clip mask, GeoJSON polygon.
    pub mask: Option<PathBuf>,
}

/// Interpret a raw mask argument: a missing, empty, or whitespace-only
/// value means no clipping.
pub fn mask_path(raw: Option<&str>) -> Option<PathBuf> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Snapping tolerance for pour points, fixed at twice the cell size.
pub fn snap_tolerance(cell_size: f64) -> f64 {
    2.0 * cell_size
}

/// Artifacts written by a completed run, in write order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    fn write_raster<T: RasterElement>(
        &mut self,
        workspace: &Path,
        name: &str,
        raster: &Raster<T>,
    ) -> Result<()> {
        let path = workspace.join(name);
        write_geotiff(raster, &path)?;
        self.artifacts.push(path);
        Ok(())
    }
}

/// Run the full delineation pipeline.
///
/// The filled DEM is an intermediate and is not written; every other
/// stage output is persisted under its fixed name in the workspace.
pub fn run(config: &PipelineConfig) -> Result<RunReport> {
    fs::create_dir_all(&config.workspace)?;
    let mut report = RunReport::default();

    info!(dem = %config.dem.display(), "loading DEM");
    let mut dem: Raster<f64> = read_geotiff(&config.dem)?;

    if let Some(mask_file) = &config.mask {
        info!(mask = %mask_file.display(), "clipping DEM to mask polygon");
        let mask = read_mask_polygon(mask_file)?;
        dem = extract_by_mask(&dem, &mask)?;
        report.write_raster(&config.workspace, DEM_CLIPPED, &dem)?;
    }

    info!("filling sinks");
    let filled = fill_sinks(&dem, FillSinksParams::default())?;

    info!("calculating D8 flow direction");
    let flow_dir = flow_direction(&filled)?;
    report.write_raster(&config.workspace, FLOW_DIR, &flow_dir)?;

    info!("calculating flow accumulation");
    let accumulation = flow_accumulation(&flow_dir)?;
    report.write_raster(&config.workspace, FLOW_ACCU, &accumulation)?;

    let tolerance = snap_tolerance(dem.cell_size());
    info!(tolerance, "snapping pour points");
    let points = read_points(&config.pour_points)?;
    let snapped = snap_pour_points(&points, &accumulation, tolerance)?;
    report.write_raster(&config.workspace, SNAPPED_POUR_POINTS, &snapped.raster)?;

    info!("delineating watershed");
    let watershed_labels = watershed(&flow_dir, &snapped.cells)?;
    report.write_raster(&config.workspace, WATERSHED, &watershed_labels)?;

    info!("delineating drainage basins");
    let basin_labels = basins(&flow_dir, &filled)?;
    report.write_raster(&config.workspace, BASIN, &basin_labels)?;

    info!("converting label rasters to polygons");
    let params = VectorizeParams {
        simplify: true,
        tolerance: dem.cell_size(),
    };
    for (name, labels) in [(WATERSHED_POLYGON, &watershed_labels), (BASIN_POLYGON, &basin_labels)] {
        let features = raster_to_polygon(labels, params)?;
        let path = config.workspace.join(name);
        write_polygon_features(&path, &features, VALUE_FIELD)?;
        report.artifacts.push(path);
    }

    info!(artifacts = report.artifacts.len(), "pipeline finished");
    Ok(report)
}
