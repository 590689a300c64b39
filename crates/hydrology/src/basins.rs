//! Sub-basin delineation
//!
//! Partitions the whole grid into independent drainage basins: every
//! outlet cell (a pit, or a cell whose flow leaves the grid) seeds one
//! basin and claims everything upstream of it.

use crate::d8;
use crate::watershed::label_upstream;
use hydroshed_core::{Raster, Result};
use ndarray::Array2;
use std::collections::VecDeque;

/// Delineate all drainage basins of a D8 flow direction raster.
///
/// `dem` is the conditioned elevation grid the directions came from;
/// its nodata cells stay at label 0 (direction code 0 alone cannot
/// tell a true pit from nodata). Basins are labeled 1..n in row-major
/// outlet scan order.
pub fn basins(flow_dir: &Raster<u8>, dem: &Raster<f64>) -> Result<Raster<i32>> {
    let (rows, cols) = flow_dir.shape();
    let mut labels = Array2::<i32>::zeros((rows, cols));
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut next_id: i32 = 0;

    for row in 0..rows {
        for col in 0..cols {
            if dem.is_nodata(dem[(row, col)]) {
                continue;
            }
            let code = flow_dir[(row, col)];
            let is_outlet = d8::downstream(row, col, code, rows, cols).is_none();

            if is_outlet {
                next_id += 1;
                labels[(row, col)] = next_id;
                queue.push_back((row, col));
            }
        }
    }

    label_upstream(flow_dir, &mut labels, &mut queue);

    let mut output = flow_dir.derived::<i32>();
    output.set_nodata(Some(0));
    *output.data_mut() = labels;

    Ok(output)
}
