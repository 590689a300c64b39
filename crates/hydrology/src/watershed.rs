//! Watershed delineation from pour points
//!
//! Labels every cell draining through a pour-point cell with that pour
//! point's id, by breadth-first search against the D8 flow directions.

use crate::d8;
use crate::snap::PourCell;
use hydroshed_core::{Raster, Result};
use ndarray::Array2;
use std::collections::VecDeque;

/// Delineate the catchments of the given pour cells.
///
/// Each output cell carries the id of the pour cell it drains through,
/// or 0 if it drains past none of them. Pour cells are typically the
/// product of [`crate::snap_pour_points`]. Where catchments nest, the
/// pour cell reached first claims the upstream area.
pub fn watershed(flow_dir: &Raster<u8>, pour_cells: &[PourCell]) -> Result<Raster<i32>> {
    let (rows, cols) = flow_dir.shape();
    let mut labels = Array2::<i32>::zeros((rows, cols));
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for cell in pour_cells {
        if cell.row < rows && cell.col < cols {
            labels[(cell.row, cell.col)] = cell.id;
            queue.push_back((cell.row, cell.col));
        }
    }

    label_upstream(flow_dir, &mut labels, &mut queue);

    let mut output = flow_dir.derived::<i32>();
    output.set_nodata(Some(0));
    *output.data_mut() = labels;

    Ok(output)
}

/// Propagate labels upstream from the seeded queue.
///
/// A neighbor belongs upstream of (row, col) when its flow direction is
/// the exact opposite of the direction from (row, col) to it.
pub(crate) fn label_upstream(
    flow_dir: &Raster<u8>,
    labels: &mut Array2<i32>,
    queue: &mut VecDeque<(usize, usize)>,
) {
    let (rows, cols) = flow_dir.shape();

    while let Some((row, col)) = queue.pop_front() {
        let label = labels[(row, col)];

        for (idx, &(dr, dc)) in d8::OFFSETS.iter().enumerate() {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);

            if labels[(nr, nc)] != 0 {
                continue;
            }

            let neighbor_dir = flow_dir[(nr, nc)];
            if neighbor_dir != 0 && neighbor_dir == d8::opposite(d8::CODES[idx]) {
                labels[(nr, nc)] = label;
                queue.push_back((nr, nc));
            }
        }
    }
}
