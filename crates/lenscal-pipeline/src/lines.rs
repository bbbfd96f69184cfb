//! Line extraction from detected checkerboards.
//!
//! Five families of candidate lines are read off each board's index grid:
//! rows, columns, ↘ diagonals starting on the top edge, ↘ diagonals starting
//! on the left edge, and ↗ diagonals. Diagonals cover directions away from
//! the board axes, which conditions the radial parameters. The two ↘
//! families share the main diagonal; the duplication is kept by default to
//! match the established behavior and can be disabled.

use lenscal_core::LineWithPoints;

use crate::detector::CheckerDetector;

/// Minimum defined corners for a candidate line to be kept.
pub const MIN_POINTS_PER_LINE: usize = 10;

/// Minimum extracted lines for a view to contribute to the fit.
pub const MIN_LINES_PER_VIEW: usize = 2;

#[derive(Clone, Copy, Debug)]
pub struct ExtractionOptions {
    /// Emit the main diagonal from both ↘ families.
    pub overlapping_diagonals: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            overlapping_diagonals: true,
        }
    }
}

/// Extract every candidate line of every board of one detector output.
pub fn extract_lines(detector: &CheckerDetector, opts: &ExtractionOptions) -> Vec<LineWithPoints> {
    let mut lines = Vec::new();

    for (board_idx, board) in detector.boards.iter().enumerate() {
        let rows = board.rows();
        let cols = board.cols();
        let corner = |i: usize, j: usize| board.get(i, j).map(|c| detector.corners[c].point());

        // Rows.
        for i in 0..rows {
            let mut line = LineWithPoints::new(true, board_idx, i);
            for j in 0..cols {
                if let Some(p) = corner(i, j) {
                    line.points.push(p);
                }
            }
            push_if_long(&mut lines, line);
        }

        // Columns.
        for j in 0..cols {
            let mut line = LineWithPoints::new(false, board_idx, j);
            for i in 0..rows {
                if let Some(p) = corner(i, j) {
                    line.points.push(p);
                }
            }
            push_if_long(&mut lines, line);
        }

        // ↘ diagonals starting on the top edge: cells (i + k, k).
        for i in 0..rows {
            let mut line = LineWithPoints::new(false, board_idx, i);
            let mut k = 0;
            while i + k < rows && k < cols {
                if let Some(p) = corner(i + k, k) {
                    line.points.push(p);
                }
                k += 1;
            }
            push_if_long(&mut lines, line);
        }

        // ↘ diagonals starting on the left edge: cells (k, j + k).
        let first_col = if opts.overlapping_diagonals { 0 } else { 1 };
        for j in first_col..cols {
            let mut line = LineWithPoints::new(false, board_idx, j);
            let mut k = 0;
            while j + k < cols && k < rows {
                if let Some(p) = corner(k, j + k) {
                    line.points.push(p);
                }
                k += 1;
            }
            push_if_long(&mut lines, line);
        }

        // ↗ diagonals: cells (rows - 1 - k, j + k).
        for j in 0..cols {
            let mut line = LineWithPoints::new(false, board_idx, j);
            let mut k = 0;
            while j + k < cols && k < rows {
                if let Some(p) = corner(rows - 1 - k, j + k) {
                    line.points.push(p);
                }
                k += 1;
            }
            push_if_long(&mut lines, line);
        }
    }

    lines
}

fn push_if_long(lines: &mut Vec<LineWithPoints>, line: LineWithPoints) {
    if line.points.len() >= MIN_POINTS_PER_LINE {
        lines.push(line);
    }
}
