//! Deterministic synthetic checkerboard helpers.
//!
//! These generators build perfectly regular pixel grids and fully populated
//! board index grids, which tests combine with a camera to produce observed
//! corners.

use crate::math::{Real, Vec2};
use crate::types::CheckerBoard;

/// A `rows × cols` pixel grid in row-major order starting at `top_left`.
pub fn pixel_grid(rows: usize, cols: usize, top_left: Vec2, spacing: Real) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            points.push(Vec2::new(
                top_left.x + j as Real * spacing,
                top_left.y + i as Real * spacing,
            ));
        }
    }
    points
}

/// A fully populated board whose cell `(i, j)` references corner `i * cols + j`.
pub fn full_board(rows: usize, cols: usize) -> CheckerBoard {
    let mut board = CheckerBoard::new(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            board.set(i, j, (i * cols + j) as u32);
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_row_major() {
        let pts = pixel_grid(2, 3, Vec2::new(10.0, 20.0), 5.0);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], Vec2::new(10.0, 20.0));
        assert_eq!(pts[1], Vec2::new(15.0, 20.0));
        assert_eq!(pts[3], Vec2::new(10.0, 25.0));
    }

    #[test]
    fn full_board_indexes_row_major() {
        let board = full_board(3, 4);
        assert_eq!(board.get(0, 0), Some(0));
        assert_eq!(board.get(1, 0), Some(4));
        assert_eq!(board.get(2, 3), Some(11));
    }
}
