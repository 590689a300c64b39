//! Sink filling for hydrological conditioning
//!
//! Implements the Planchon-Darboux (2001) algorithm: initialize a water
//! surface at the DEM's border values and +inf elsewhere, then drain it
//! iteratively until every interior cell either rests on the terrain or
//! sits an epsilon above a lower neighbor.
//!
//! Reference:
//! Planchon, O., Darboux, F. (2001). A fast, simple and versatile algorithm
//! to fill the depressions of digital elevation models.
//! Catena, 46(2-3), 159-176.

use crate::d8;
use hydroshed_core::{Raster, Result};
use ndarray::Array2;

/// Parameters for sink filling
#[derive(Debug, Clone)]
pub struct FillSinksParams {
    /// Minimum slope to enforce between cells. Zero leaves flat areas
    /// flat after filling.
    pub min_slope: f64,
}

impl Default for FillSinksParams {
    fn default() -> Self {
        Self { min_slope: 0.01 }
    }
}

/// Fill depressions in a DEM so that every cell has a downslope path to
/// the grid edge.
///
/// Sink-filled elevations are a precondition for meaningful flow
/// direction and accumulation. The input raster is not modified.
pub fn fill_sinks(dem: &Raster<f64>, params: FillSinksParams) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();
    let epsilon = params.min_slope * dem.cell_size();

    let big_value = f64::MAX / 2.0;
    let mut water = Array2::from_elem((rows, cols), big_value);

    // Border and nodata cells keep their elevation; they are the outlets
    // the interior drains toward.
    for row in 0..rows {
        for col in 0..cols {
            let elev = dem[(row, col)];
            if dem.is_nodata(elev)
                || row == 0
                || row == rows - 1
                || col == 0
                || col == cols - 1
            {
                water[(row, col)] = elev;
            }
        }
    }

    // Alternate forward and backward sweeps until no cell can be lowered.
    let mut changed = true;
    while changed {
        changed = false;

        changed |= sweep(dem, &mut water, big_value, epsilon, false);
        changed |= sweep(dem, &mut water, big_value, epsilon, true);
    }

    let mut output = dem.like(0.0);
    *output.data_mut() = water;

    Ok(output)
}

/// One relaxation sweep over the interior; returns whether anything changed
fn sweep(
    dem: &Raster<f64>,
    water: &mut Array2<f64>,
    big_value: f64,
    epsilon: f64,
    reverse: bool,
) -> bool {
    let (rows, cols) = dem.shape();
    let mut changed = false;

    let row_range: Vec<usize> = if reverse {
        (1..rows - 1).rev().collect()
    } else {
        (1..rows - 1).collect()
    };
    let col_range: Vec<usize> = if reverse {
        (1..cols - 1).rev().collect()
    } else {
        (1..cols - 1).collect()
    };

    for &row in &row_range {
        for &col in &col_range {
            let elev = dem[(row, col)];
            if dem.is_nodata(elev) || water[(row, col)] <= elev {
                continue;
            }

            for (idx, &(dr, dc)) in d8::OFFSETS.iter().enumerate() {
                let nr = (row as isize + dr) as usize;
                let nc = (col as isize + dc) as usize;

                let neighbor = water[(nr, nc)];
                if neighbor.is_nan() || neighbor >= big_value {
                    continue;
                }

                let drained = neighbor + epsilon * d8::DISTANCES[idx];
                if elev >= drained {
                    // Terrain is above the drained neighbor level; the
                    // water surface settles onto the terrain.
                    water[(row, col)] = elev;
                    changed = true;
                    break;
                }
                if water[(row, col)] > drained {
                    water[(row, col)] = drained;
                    changed = true;
                }
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydroshed_core::GeoTransform;

    fn dem_with_sink() -> Raster<f64> {
        // 7x7 DEM with a depression at the center (3 < surrounding 7s)
        let values = [
            9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, //
            9.0, 8.0, 8.0, 8.0, 8.0, 8.0, 9.0, //
            9.0, 8.0, 7.0, 7.0, 7.0, 8.0, 9.0, //
            9.0, 8.0, 7.0, 3.0, 7.0, 8.0, 9.0, //
            9.0, 8.0, 7.0, 7.0, 7.0, 8.0, 9.0, //
            9.0, 8.0, 8.0, 8.0, 8.0, 8.0, 9.0, //
            9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0,
        ];

        let mut dem = Raster::from_vec(values.to_vec(), 7, 7).unwrap();
        dem.set_transform(GeoTransform::new(0.0, 7.0, 1.0, -1.0));
        dem
    }

    #[test]
    fn raises_depression() {
        let dem = dem_with_sink();
        let filled = fill_sinks(&dem, FillSinksParams { min_slope: 0.0 }).unwrap();

        assert!(
            filled[(3, 3)] >= 7.0,
            "sink should be filled to >= 7.0, got {}",
            filled[(3, 3)]
        );
    }

    #[test]
    fn preserves_border() {
        let dem = dem_with_sink();
        let filled = fill_sinks(&dem, FillSinksParams { min_slope: 0.0 }).unwrap();

        assert_eq!(filled[(0, 0)], 9.0);
        assert_eq!(filled[(0, 3)], 9.0);
        assert_eq!(filled[(6, 6)], 9.0);
    }

    #[test]
    fn drains_through_low_outlet() {
        // Border all 10 except a low outlet at (4,2)=2; interior 5 with a
        // sink at the center.
        let mut dem = Raster::new(5, 5);
        dem.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));

        for row in 0..5 {
            for col in 0..5 {
                let border = row == 0 || row == 4 || col == 0 || col == 4;
                dem[(row, col)] = if border { 10.0 } else { 5.0 };
            }
        }
        dem[(2, 2)] = 1.0;
        dem[(4, 2)] = 2.0;

        let filled = fill_sinks(&dem, FillSinksParams { min_slope: 0.0 }).unwrap();

        assert!(
            filled[(2, 2)] >= 1.0 && filled[(2, 2)] <= 5.0,
            "sink should fill only up to the interior level, got {}",
            filled[(2, 2)]
        );
        assert_eq!(filled[(1, 1)], 5.0, "non-sink interior must be untouched");
    }

    #[test]
    fn monotone_on_clean_dem() {
        // A sloped plane has no sinks; filling never lowers terrain.
        let mut dem = Raster::new(10, 10);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for row in 0..10 {
            for col in 0..10 {
                dem[(row, col)] = (row + col) as f64;
            }
        }

        let filled = fill_sinks(&dem, FillSinksParams::default()).unwrap();

        for row in 0..10 {
            for col in 0..10 {
                assert!(
                    filled[(row, col)] >= dem[(row, col)],
                    "filled < original at ({}, {})",
                    row,
                    col
                );
            }
        }
    }
}
