//! D8 flow direction
//!
//! Assigns each cell the ESRI power-of-two code of its steepest downslope
//! neighbor (see [`crate::d8`]). Pits, flats and nodata cells get 0.

use crate::d8;
use hydroshed_core::{Raster, Result};
use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Calculate D8 flow direction from a DEM.
///
/// The DEM should be sink-filled first; otherwise interior pits produce
/// cells with no outflow.
pub fn flow_direction(dem: &Raster<f64>) -> Result<Raster<u8>> {
    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();

    #[cfg(feature = "parallel")]
    let row_iter = (0..rows).into_par_iter();
    #[cfg(not(feature = "parallel"))]
    let row_iter = (0..rows).into_iter();

    let codes: Vec<u8> = row_iter
        .flat_map(|row| {
            let mut row_codes = vec![0u8; cols];
            for (col, slot) in row_codes.iter_mut().enumerate() {
                *slot = steepest_descent(dem, row, col, cell_size);
            }
            row_codes
        })
        .collect();

    let mut output = dem.derived::<u8>();
    output.set_nodata(Some(0));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), codes)
        .map_err(|e| hydroshed_core::Error::Other(e.to_string()))?;

    Ok(output)
}

/// D8 code of the steepest downslope neighbor of (row, col), or 0
fn steepest_descent(dem: &Raster<f64>, row: usize, col: usize, cell_size: f64) -> u8 {
    let (rows, cols) = dem.shape();
    let center = dem[(row, col)];

    if dem.is_nodata(center) {
        return 0;
    }

    let mut max_drop = 0.0_f64;
    let mut best = 0u8;

    for (idx, &(dr, dc)) in d8::OFFSETS.iter().enumerate() {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            continue;
        }

        let neighbor = dem[(nr as usize, nc as usize)];
        if dem.is_nodata(neighbor) {
            continue;
        }

        let drop = (center - neighbor) / (d8::DISTANCES[idx] * cell_size);
        if drop > max_drop {
            max_drop = drop;
            best = d8::CODES[idx];
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydroshed_core::GeoTransform;

    fn plane<F: Fn(usize, usize) -> f64>(rows: usize, cols: usize, f: F) -> Raster<f64> {
        let mut dem = Raster::new(rows, cols);
        dem.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                dem[(row, col)] = f(row, col);
            }
        }
        dem
    }

    #[test]
    fn slope_east() {
        let dem = plane(5, 5, |_, col| (5 - col) as f64 * 10.0);
        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir[(2, 2)], 1, "expected E (1), got {}", fdir[(2, 2)]);
    }

    #[test]
    fn slope_south() {
        let dem = plane(5, 5, |row, _| (5 - row) as f64 * 10.0);
        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir[(2, 2)], 4, "expected S (4), got {}", fdir[(2, 2)]);
    }

    #[test]
    fn slope_southeast() {
        let dem = plane(5, 5, |row, col| (10 - row - col) as f64 * 10.0);
        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir[(2, 2)], 2, "expected SE (2), got {}", fdir[(2, 2)]);
    }

    #[test]
    fn pit_gets_zero() {
        let mut dem = plane(5, 5, |_, _| 10.0);
        dem[(2, 2)] = 1.0;
        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir[(2, 2)], 0, "pit should have no direction");
    }

    #[test]
    fn nodata_gets_zero() {
        let mut dem = plane(5, 5, |_, col| (5 - col) as f64);
        dem[(1, 1)] = f64::NAN;
        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir[(1, 1)], 0);
    }
}
