//! Free/locked parameter bookkeeping shared by both residual modes.
//!
//! The full parameter vector is laid out as
//! `[distortion..., offset_x, offset_y, line_0.angle, line_0.dist, ...]`.
//! Locked blocks are excluded from the solver by mapping between the full
//! vector and the dense vector of free entries.

use lenscal_core::Real;
use nalgebra::DVector;

#[derive(Debug, Clone)]
pub(crate) struct ParamLayout {
    n_dist: usize,
    n_lines: usize,
    free: Vec<usize>,
}

impl ParamLayout {
    pub fn new(
        n_dist: usize,
        n_lines: usize,
        lock_distortions: &[bool],
        lock_offset: bool,
        lock_lines: bool,
    ) -> Self {
        assert_eq!(lock_distortions.len(), n_dist);
        let mut free = Vec::new();
        for (i, locked) in lock_distortions.iter().enumerate() {
            if !locked {
                free.push(i);
            }
        }
        if !lock_offset {
            free.push(n_dist);
            free.push(n_dist + 1);
        }
        if !lock_lines {
            for j in 0..n_lines {
                free.push(n_dist + 2 + 2 * j);
                free.push(n_dist + 2 + 2 * j + 1);
            }
        }
        Self {
            n_dist,
            n_lines,
            free,
        }
    }

    pub fn n_dist(&self) -> usize {
        self.n_dist
    }

    pub fn full_len(&self) -> usize {
        self.n_dist + 2 + 2 * self.n_lines
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    pub fn offset_x_index(&self) -> usize {
        self.n_dist
    }

    pub fn offset_y_index(&self) -> usize {
        self.n_dist + 1
    }

    /// Full index of `line`'s angle parameter; `dist` follows it.
    pub fn line_angle_index(&self, line: usize) -> usize {
        self.n_dist + 2 + 2 * line
    }

    /// Gather the free entries from a full vector.
    pub fn reduce(&self, full: &DVector<Real>) -> DVector<Real> {
        debug_assert_eq!(full.len(), self.full_len());
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&i| full[i]))
    }

    /// Scatter the free entries over a copy of `base`.
    pub fn expand(&self, free: &DVector<Real>, base: &DVector<Real>) -> DVector<Real> {
        debug_assert_eq!(free.len(), self.free.len());
        debug_assert_eq!(base.len(), self.full_len());
        let mut full = base.clone();
        for (k, &i) in self.free.iter().enumerate() {
            full[i] = free[k];
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_orders_distortion_offset_lines() {
        let layout = ParamLayout::new(3, 2, &[true, false, false], false, false);
        assert_eq!(layout.full_len(), 3 + 2 + 4);
        assert_eq!(layout.free_indices(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(layout.offset_x_index(), 3);
        assert_eq!(layout.line_angle_index(1), 7);
    }

    #[test]
    fn reduce_expand_preserve_locked_entries() {
        let layout = ParamLayout::new(2, 1, &[false, true], true, false);
        let base = DVector::from_vec(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let free = layout.reduce(&base);
        assert_eq!(free.as_slice(), &[0.1, 0.5, 0.6]);

        let moved = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let full = layout.expand(&moved, &base);
        assert_eq!(full.as_slice(), &[1.0, 0.2, 0.3, 0.4, 2.0, 3.0]);
    }
}
