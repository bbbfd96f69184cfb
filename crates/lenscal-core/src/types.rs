//! Observation data types shared by the estimation and pipeline layers.

use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

use crate::math::{Real, Vec2};

/// Index into a corner list.
pub type IndexT = u32;

/// Sentinel for an empty board cell.
pub const UNDEFINED_INDEX: IndexT = IndexT::MAX;

/// A detected checkerboard corner with detector metadata.
///
/// Only `center` is consumed by the calibration core; the direction vectors
/// and detection scale are carried through from the detector output.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CheckerBoardCorner {
    pub center: [Real; 2],
    #[serde(default)]
    pub dir1: [Real; 2],
    #[serde(default)]
    pub dir2: [Real; 2],
    #[serde(default)]
    pub scale: Real,
}

impl CheckerBoardCorner {
    pub fn point(&self) -> Vec2 {
        Vec2::new(self.center[0], self.center[1])
    }
}

/// A rectangular grid of corner indices.
///
/// Only the topology is meaningful: a cell either references a corner or
/// holds [`UNDEFINED_INDEX`]. No metric information is attached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckerBoard {
    rows: usize,
    cols: usize,
    cells: Vec<IndexT>,
}

impl CheckerBoard {
    /// Create an empty board where every cell is undefined.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![UNDEFINED_INDEX; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Corner index at `(row, col)`, `None` for undefined cells.
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        let idx = self.cells[row * self.cols + col];
        (idx != UNDEFINED_INDEX).then_some(idx as usize)
    }

    pub fn set(&mut self, row: usize, col: usize, index: IndexT) {
        self.cells[row * self.cols + col] = index;
    }

    pub fn clear(&mut self, row: usize, col: usize) {
        self.cells[row * self.cols + col] = UNDEFINED_INDEX;
    }

    /// Check the cell buffer matches the declared shape and every defined
    /// index stays below `num_corners`. Used after deserialization.
    pub fn is_consistent(&self, num_corners: usize) -> bool {
        self.cells.len() == self.rows * self.cols
            && self
                .cells
                .iter()
                .all(|&c| c == UNDEFINED_INDEX || (c as usize) < num_corners)
    }
}

/// A hypothesized-collinear group of corner observations.
///
/// `angle` and `dist` parameterize the supporting line in normal form
/// (`x cos θ + y sin θ = d`); both are owned by the optimizer once the
/// fit starts. `horizontal`, `board` and `index` identify the provenance
/// of the line and are never read by the residual.
#[derive(Clone, Debug)]
pub struct LineWithPoints {
    pub points: Vec<Vec2>,
    pub angle: Real,
    pub dist: Real,
    pub horizontal: bool,
    pub board: usize,
    pub index: usize,
}

impl LineWithPoints {
    pub fn new(horizontal: bool, board: usize, index: usize) -> Self {
        Self {
            points: Vec::new(),
            angle: FRAC_PI_4,
            dist: 1.0,
            horizontal,
            board,
            index,
        }
    }
}

/// A correspondence sampled from a fitted forward map, used to refit the
/// family in the opposite direction.
#[derive(Clone, Copy, Debug)]
pub struct PointPair {
    pub distorted: Vec2,
    pub undistorted: Vec2,
}
