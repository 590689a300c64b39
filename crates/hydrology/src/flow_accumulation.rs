//! Flow accumulation
//!
//! Counts the upstream cells draining through each cell of a D8 flow
//! direction raster. Cells are processed in topological order: start at
//! cells nothing drains into, push counts downstream as each cell's
//! inputs complete.

use crate::d8;
use hydroshed_core::{Raster, Result};
use ndarray::Array2;

/// Calculate flow accumulation from a D8 flow direction raster.
///
/// Headwater cells get 0; every other cell gets the number of cells
/// upstream of it. Output is floating point so it can be thresholded
/// and compared without casts downstream.
pub fn flow_accumulation(flow_dir: &Raster<u8>) -> Result<Raster<f64>> {
    let (rows, cols) = flow_dir.shape();

    // In-degree: how many neighbors drain into each cell.
    let mut in_degree = Array2::<u32>::zeros((rows, cols));
    for row in 0..rows {
        for col in 0..cols {
            if let Some((nr, nc)) = d8::downstream(row, col, flow_dir[(row, col)], rows, cols) {
                in_degree[(nr, nc)] += 1;
            }
        }
    }

    let mut accumulation = Array2::<f64>::zeros((rows, cols));
    let mut ready: Vec<(usize, usize)> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            if in_degree[(row, col)] == 0 {
                ready.push((row, col));
            }
        }
    }

    while let Some((row, col)) = ready.pop() {
        if let Some((nr, nc)) = d8::downstream(row, col, flow_dir[(row, col)], rows, cols) {
            accumulation[(nr, nc)] += accumulation[(row, col)] + 1.0;

            in_degree[(nr, nc)] -= 1;
            if in_degree[(nr, nc)] == 0 {
                ready.push((nr, nc));
            }
        }
    }

    let mut output = flow_dir.derived::<f64>();
    *output.data_mut() = accumulation;

    Ok(output)
}
