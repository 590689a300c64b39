//! D8 flow direction encoding
//!
//! Directions use the ESRI power-of-two convention:
//!
//! ```text
//!   32  64  128
//!   16   0    1
//!    8   4    2
//! ```
//!
//! 0 means pit, flat or nodata (no outflow). Internally directions are
//! indexed 0..8 in the order E, SE, S, SW, W, NW, N, NE.

/// Direction codes indexed E, SE, S, SW, W, NW, N, NE
pub const CODES: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

/// Neighbor offsets (row, col) matching [`CODES`]; row grows southward
pub const OFFSETS: [(isize, isize); 8] = [
    (0, 1),   // E
    (1, 1),   // SE
    (1, 0),   // S
    (1, -1),  // SW
    (0, -1),  // W
    (-1, -1), // NW
    (-1, 0),  // N
    (-1, 1),  // NE
];

/// Distance factors matching [`CODES`] (diagonals are sqrt(2) cells)
pub const DISTANCES: [f64; 8] = [
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
];

/// Direction index (0..8) for a D8 code, or None for 0 and invalid codes
pub fn code_index(code: u8) -> Option<usize> {
    if code != 0 && code.is_power_of_two() {
        Some(code.trailing_zeros() as usize)
    } else {
        None
    }
}

/// Code of the opposite direction (E <-> W, SE <-> NW, ...)
pub fn opposite(code: u8) -> u8 {
    match code_index(code) {
        Some(idx) => CODES[(idx + 4) % 8],
        None => 0,
    }
}

/// Cell the given cell drains into, or None for pits and off-grid flow
pub fn downstream(
    row: usize,
    col: usize,
    code: u8,
    rows: usize,
    cols: usize,
) -> Option<(usize, usize)> {
    let idx = code_index(code)?;
    let (dr, dc) = OFFSETS[idx];
    let nr = row as isize + dr;
    let nc = col as isize + dc;

    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
        return None;
    }
    Some((nr as usize, nc as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_index_powers_of_two() {
        assert_eq!(code_index(1), Some(0)); // E
        assert_eq!(code_index(4), Some(2)); // S
        assert_eq!(code_index(128), Some(7)); // NE
        assert_eq!(code_index(0), None);
        assert_eq!(code_index(3), None);
    }

    #[test]
    fn opposite_pairs() {
        assert_eq!(opposite(1), 16); // E -> W
        assert_eq!(opposite(16), 1); // W -> E
        assert_eq!(opposite(2), 32); // SE -> NW
        assert_eq!(opposite(64), 4); // N -> S
        assert_eq!(opposite(0), 0);
    }

    #[test]
    fn downstream_clamps_to_grid() {
        // East edge cell flowing east leaves the grid
        assert_eq!(downstream(0, 4, 1, 5, 5), None);
        // Interior cell flowing south
        assert_eq!(downstream(1, 1, 4, 5, 5), Some((2, 1)));
        // Pit
        assert_eq!(downstream(2, 2, 0, 5, 5), None);
    }
}
