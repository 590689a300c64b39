//! Mask extraction (clip)
//!
//! Clips a raster to a polygon boundary: the output covers the
//! intersection of the raster extent and the polygon's bounding box,
//! with cells whose centers fall outside the polygon set to nodata.

use geo::{BoundingRect, Contains};
use geo_types::{Point, Polygon};
use hydroshed_core::{Error, Raster, Result};

/// Extract the cells of `raster` that lie inside `mask`.
///
/// Containment is decided at cell centers. The output grid is cropped
/// to the mask's bounding box, so its transform differs from the input
/// while cell size is preserved. An empty intersection is an error.
pub fn extract_by_mask(raster: &Raster<f64>, mask: &Polygon<f64>) -> Result<Raster<f64>> {
    let rect = mask
        .bounding_rect()
        .ok_or_else(|| Error::Vector("mask polygon has no extent".to_string()))?;

    let (rows, cols) = raster.shape();
    let gt = raster.transform();

    // Rows/cols covered by the mask's bounding box, clamped to the grid.
    // With a north-up transform min_y maps to the larger row index.
    let (c0f, r0f) = gt.geo_to_pixel(rect.min().x, rect.max().y);
    let (c1f, r1f) = gt.geo_to_pixel(rect.max().x, rect.min().y);

    let r0 = r0f.max(0.0).floor() as usize;
    let c0 = c0f.max(0.0).floor() as usize;
    let r1 = (r1f.ceil() as usize).min(rows);
    let c1 = (c1f.ceil() as usize).min(cols);

    if r0 >= r1 || c0 >= c1 {
        return Err(Error::Algorithm(
            "mask polygon does not intersect the raster extent".to_string(),
        ));
    }

    let out_rows = r1 - r0;
    let out_cols = c1 - c0;

    let mut output: Raster<f64> = Raster::new(out_rows, out_cols);
    output.set_transform(gt.window(c0, r0));
    output.set_nodata(raster.nodata());

    let mut any_inside = false;
    for row in 0..out_rows {
        for col in 0..out_cols {
            let (x, y) = raster.cell_center(r0 + row, c0 + col);
            if mask.contains(&Point::new(x, y)) {
                output[(row, col)] = raster[(r0 + row, c0 + col)];
                any_inside = true;
            } else {
                output[(row, col)] = f64::NAN;
            }
        }
    }

    if !any_inside {
        return Err(Error::Algorithm(
            "mask polygon covers no cell centers".to_string(),
        ));
    }

    Ok(output)
}
