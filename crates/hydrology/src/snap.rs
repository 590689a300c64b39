//! Pour-point snapping
//!
//! Digitized outlet points rarely land exactly on the modeled stream.
//! Snapping moves each point to the cell with the highest flow
//! accumulation within a tolerance distance, so the watershed traced
//! from it captures the intended drainage area.

use geo_types::Point;
use hydroshed_core::{Error, Raster, Result};

/// A snapped pour point as a raster cell with its 1-indexed id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PourCell {
    pub id: i32,
    pub row: usize,
    pub col: usize,
}

/// Result of snapping: the labeled pour-point raster and the cells
#[derive(Debug, Clone)]
pub struct SnapResult {
    /// Raster with each snapped cell set to its pour-point id, 0 elsewhere
    pub raster: Raster<i32>,
    /// Snapped cells in input point order (ids are 1-indexed)
    pub cells: Vec<PourCell>,
}

/// Snap pour points onto high-accumulation cells.
///
/// For each input point, cells within `tolerance` world units of its
/// containing cell are searched and the one with the highest
/// accumulation wins; among equals the nearest cell is kept. A point
/// that falls outside the raster extent is an error.
pub fn snap_pour_points(
    points: &[Point<f64>],
    accumulation: &Raster<f64>,
    tolerance: f64,
) -> Result<SnapResult> {
    if tolerance < 0.0 {
        return Err(Error::InvalidParameter {
            name: "tolerance",
            value: tolerance.to_string(),
            reason: "must be non-negative".to_string(),
        });
    }

    let (rows, cols) = accumulation.shape();
    let radius = (tolerance / accumulation.cell_size()).ceil() as isize;

    let mut raster = accumulation.derived::<i32>();
    raster.set_nodata(Some(0));
    let mut cells = Vec::with_capacity(points.len());

    for (idx, point) in points.iter().enumerate() {
        let (row, col) = accumulation
            .world_to_cell(point.x(), point.y())
            .ok_or_else(|| {
                Error::Algorithm(format!(
                    "pour point ({}, {}) is outside the raster extent",
                    point.x(),
                    point.y()
                ))
            })?;

        let (best_row, best_col) = best_cell_in_window(accumulation, row, col, radius);

        let id = (idx + 1) as i32;
        raster[(best_row, best_col)] = id;
        cells.push(PourCell {
            id,
            row: best_row,
            col: best_col,
        });

        debug_assert!(best_row < rows && best_col < cols);
    }

    Ok(SnapResult { raster, cells })
}

/// Cell with maximum accumulation within the window, nearest wins ties
fn best_cell_in_window(
    accumulation: &Raster<f64>,
    row: usize,
    col: usize,
    radius: isize,
) -> (usize, usize) {
    let (rows, cols) = accumulation.shape();

    let r0 = (row as isize - radius).max(0) as usize;
    let r1 = ((row as isize + radius) as usize).min(rows - 1);
    let c0 = (col as isize - radius).max(0) as usize;
    let c1 = ((col as isize + radius) as usize).min(cols - 1);

    let mut best = (row, col);
    let mut best_acc = f64::NEG_INFINITY;
    let mut best_dist = 0i64;

    for r in r0..=r1 {
        for c in c0..=c1 {
            let acc = accumulation[(r, c)];
            if accumulation.is_nodata(acc) {
                continue;
            }

            let dr = r as i64 - row as i64;
            let dc = c as i64 - col as i64;
            let dist = dr * dr + dc * dc;

            if acc > best_acc || (acc == best_acc && dist < best_dist) {
                best_acc = acc;
                best_dist = dist;
                best = (r, c);
            }
        }
    }

    best
}
