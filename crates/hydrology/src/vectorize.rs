//! Conversion of labeled rasters to polygon geometries.
//!
//! Traces the boundary between differently-labeled cells as directed
//! edges in pixel-corner space, stitches them into closed rings, and
//! emits one `MultiPolygon` per label value. Cells with value zero or
//! nodata are treated as background and produce no geometry.

use std::collections::{BTreeMap, HashMap};

use geo::{Contains, Simplify};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};

use hydroshed_core::prelude::*;

/// Options for [`raster_to_polygon`].
#[derive(Debug, Clone, Copy)]
pub struct VectorizeParams {
    /// Apply Douglas-Peucker simplification to the traced rings.
    pub simplify: bool,
    /// Simplification tolerance in world units. Ignored when
    /// `simplify` is false.
    pub tolerance: f64,
}

impl Default for VectorizeParams {
    fn default() -> Self {
        Self {
            simplify: false,
            tolerance: 0.0,
        }
    }
}

/// Grid corner node, addressed as (col, row).
type Node = (usize, usize);

/// A unit boundary edge between two corner nodes, remembering the
/// labeled cell it belongs to.
struct Edge {
    start: Node,
    end: Node,
    cell: (usize, usize),
}

/// Axis directions in pixel space, clockwise: E, S, W, N.
const DIRS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

fn dir_index(from: Node, to: Node) -> usize {
    let d = (to.0 as i64 - from.0 as i64, to.1 as i64 - from.1 as i64);
    match DIRS.iter().position(|&v| v == d) {
        Some(i) => i,
        None => unreachable!("boundary edges are unit axis steps"),
    }
}

/// Convert a labeled raster into polygon geometries, one entry per
/// distinct positive label, ordered by label value.
///
/// Region exteriors are traced counter-clockwise in world coordinates
/// and interior holes clockwise, so the output is directly usable as
/// GeoJSON ring sets. Collinear vertices along straight boundary runs
/// are removed; when `params.simplify` is set the rings are further
/// reduced with Douglas-Peucker at `params.tolerance`.
pub fn raster_to_polygon(
    labels: &Raster<i32>,
    params: VectorizeParams,
) -> Result<Vec<(i32, MultiPolygon<f64>)>> {
    let (rows, cols) = labels.shape();
    let mut edges: BTreeMap<i32, Vec<Edge>> = BTreeMap::new();

    for r in 0..rows {
        for c in 0..cols {
            let v = labels[(r, c)];
            if labels.is_nodata(v) || v <= 0 {
                continue;
            }
            let differs = |nr: i64, nc: i64| -> bool {
                if nr < 0 || nc < 0 || nr >= rows as i64 || nc >= cols as i64 {
                    return true;
                }
                let n = labels[(nr as usize, nc as usize)];
                labels.is_nodata(n) || n != v
            };
            let bucket = edges.entry(v).or_default();
            // Directed so that walking the edge keeps the region on a
            // consistent side; exteriors come out with positive pixel
            // shoelace area, holes negative.
            if differs(r as i64 - 1, c as i64) {
                bucket.push(Edge {
                    start: (c, r),
                    end: (c + 1, r),
                    cell: (r, c),
                });
            }
            if differs(r as i64, c as i64 + 1) {
                bucket.push(Edge {
                    start: (c + 1, r),
                    end: (c + 1, r + 1),
                    cell: (r, c),
                });
            }
            if differs(r as i64 + 1, c as i64) {
                bucket.push(Edge {
                    start: (c + 1, r + 1),
                    end: (c, r + 1),
                    cell: (r, c),
                });
            }
            if differs(r as i64, c as i64 - 1) {
                bucket.push(Edge {
                    start: (c, r + 1),
                    end: (c, r),
                    cell: (r, c),
                });
            }
        }
    }

    let mut out = Vec::with_capacity(edges.len());
    for (label, label_edges) in edges {
        let rings = stitch_rings(&label_edges)?;
        let multi = assemble(rings, labels.transform(), &params)?;
        out.push((label, multi));
    }
    Ok(out)
}

/// A closed ring of corner nodes plus a cell known to lie on the
/// region side of its first edge.
struct Ring {
    nodes: Vec<Node>,
    cell: (usize, usize),
    /// Twice the signed pixel-space area. Positive for exteriors.
    area2: i64,
}

fn stitch_rings(edges: &[Edge]) -> Result<Vec<Ring>> {
    let mut outgoing: HashMap<Node, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.start).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let origin = edges[first].start;
        let mut nodes = vec![origin];
        let mut current = first;

        loop {
            let node = edges[current].end;
            if node == origin {
                break;
            }
            nodes.push(node);
            let incoming = dir_index(edges[current].start, edges[current].end);
            current = next_edge(edges, &outgoing, &used, node, incoming)?;
            used[current] = true;
        }

        let area2 = shoelace2(&nodes);
        rings.push(Ring {
            nodes: compress_collinear(nodes),
            cell: edges[first].cell,
            area2,
        });
    }
    Ok(rings)
}

/// Pick the next unused edge leaving `node`, preferring the tightest
/// turn around the region (right turn, then straight, then left in
/// pixel space). Keeps rings that merely touch at a corner separate.
fn next_edge(
    edges: &[Edge],
    outgoing: &HashMap<Node, Vec<usize>>,
    used: &[bool],
    node: Node,
    incoming: usize,
) -> Result<usize> {
    let candidates = outgoing
        .get(&node)
        .ok_or_else(|| Error::Algorithm(format!("open boundary ring at node {node:?}")))?;
    for dir in [(incoming + 1) % 4, incoming, (incoming + 3) % 4] {
        for &i in candidates {
            if !used[i] && dir_index(edges[i].start, edges[i].end) == dir {
                return Ok(i);
            }
        }
    }
    Err(Error::Algorithm(format!(
        "open boundary ring at node {node:?}"
    )))
}

fn shoelace2(nodes: &[Node]) -> i64 {
    let n = nodes.len();
    let mut sum = 0i64;
    for i in 0..n {
        let (x0, y0) = nodes[i];
        let (x1, y1) = nodes[(i + 1) % n];
        sum += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    sum
}

/// Drop vertices that lie on a straight run between their neighbors.
fn compress_collinear(nodes: Vec<Node>) -> Vec<Node> {
    let n = nodes.len();
    if n < 4 {
        return nodes;
    }
    let mut kept = Vec::with_capacity(n);
    for i in 0..n {
        let prev = nodes[(i + n - 1) % n];
        let next = nodes[(i + 1) % n];
        if dir_index(prev, nodes[i]) != dir_index(nodes[i], next) {
            kept.push(nodes[i]);
        }
    }
    kept
}

/// Group rings into polygons: each positive-area ring becomes an
/// exterior, each negative-area ring a hole in the exterior that
/// contains its owning cell center.
fn assemble(
    rings: Vec<Ring>,
    transform: &GeoTransform,
    params: &VectorizeParams,
) -> Result<MultiPolygon<f64>> {
    let mut shells: Vec<(Polygon<f64>, Vec<LineString<f64>>)> = Vec::new();
    let mut holes: Vec<Ring> = Vec::new();

    for ring in rings {
        if ring.area2 > 0 {
            shells.push((Polygon::new(to_world(&ring.nodes, transform), vec![]), vec![]));
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let (r, c) = hole.cell;
        let (x, y) = transform.pixel_to_geo(c, r);
        let center = Point::new(x, y);
        let shell = shells
            .iter_mut()
            .find(|(p, _)| p.contains(&center))
            .ok_or_else(|| Error::Algorithm("interior ring outside every exterior".into()))?;
        shell.1.push(to_world(&hole.nodes, transform));
    }

    let polygons = shells
        .into_iter()
        .map(|(shell, interiors)| {
            let poly = Polygon::new(shell.into_inner().0, interiors);
            if params.simplify {
                poly.simplify(&params.tolerance)
            } else {
                poly
            }
        })
        .collect();
    Ok(MultiPolygon(polygons))
}

/// Convert ring nodes to world coordinates.
///
/// The north-up transform negates y, which mirrors ring orientation,
/// so nodes are emitted in reverse: exteriors (positive pixel
/// shoelace) come out counter-clockwise and holes clockwise.
fn to_world(nodes: &[Node], transform: &GeoTransform) -> LineString<f64> {
    let coords: Vec<Coord<f64>> = nodes
        .iter()
        .rev()
        .map(|&(c, r)| {
            let (x, y) = transform.pixel_to_geo_corner(c, r);
            Coord { x, y }
        })
        .collect();
    LineString::from(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, CoordsIter, Winding};

    fn labeled(rows: usize, cols: usize, cells: &[(usize, usize, i32)]) -> Raster<i32> {
        let mut raster = Raster::new(rows, cols);
        raster.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
        raster.set_nodata(Some(-1));
        for &(r, c, v) in cells {
            raster[(r, c)] = v;
        }
        raster
    }

    #[test]
    fn single_cell_becomes_square() {
        let raster = labeled(3, 3, &[(1, 1, 1)]);
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].0, 1);
        let multi = &polys[0].1;
        assert_eq!(multi.0.len(), 1);
        assert_relative_eq!(multi.unsigned_area(), 100.0);

        // Exterior is counter-clockwise in world coordinates.
        assert!(multi.0[0].exterior().is_ccw());
    }

    #[test]
    fn block_collapses_to_four_corners() {
        let raster = labeled(4, 4, &[(1, 1, 5), (1, 2, 5), (2, 1, 5), (2, 2, 5)]);
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        let multi = &polys[0].1;
        assert_eq!(multi.0.len(), 1);
        // Closed ring over 4 distinct corners.
        assert_eq!(multi.0[0].exterior().coords_count(), 5);
        assert_relative_eq!(multi.unsigned_area(), 400.0);
    }

    #[test]
    fn disjoint_blocks_become_multipolygon() {
        let raster = labeled(5, 5, &[(0, 0, 2), (4, 4, 2)]);
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].1 .0.len(), 2);
        assert_relative_eq!(polys[0].1.unsigned_area(), 200.0);
    }

    #[test]
    fn interior_gap_becomes_hole() {
        let mut cells = Vec::new();
        for r in 0..3 {
            for c in 0..3 {
                if (r, c) != (1, 1) {
                    cells.push((r, c, 7));
                }
            }
        }
        let raster = labeled(3, 3, &cells);
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        let multi = &polys[0].1;
        assert_eq!(multi.0.len(), 1);
        assert_eq!(multi.0[0].interiors().len(), 1);
        assert!(multi.0[0].interiors()[0].is_cw(), "holes wind clockwise");
        // 9 cells minus the center gap.
        assert_relative_eq!(multi.unsigned_area(), 800.0);
    }

    #[test]
    fn labels_are_separate_and_ordered() {
        let raster = labeled(2, 4, &[(0, 0, 3), (0, 1, 3), (1, 2, 1), (1, 3, 1)]);
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        assert_eq!(polys.len(), 2);
        assert_eq!(polys[0].0, 1);
        assert_eq!(polys[1].0, 3);
    }

    #[test]
    fn background_and_nodata_are_skipped() {
        let mut raster = labeled(2, 2, &[(0, 0, 1)]);
        raster[(1, 1)] = -1;
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].0, 1);
    }

    #[test]
    fn corner_touching_cells_stay_separate_rings() {
        let raster = labeled(2, 2, &[(0, 0, 1), (1, 1, 1)]);
        let polys = raster_to_polygon(&raster, VectorizeParams::default()).unwrap();

        assert_eq!(polys[0].1 .0.len(), 2);
        assert_relative_eq!(polys[0].1.unsigned_area(), 200.0);
    }
}
