//! Grid storage: the accumulation buffers, clipping state and output map.

use num_complex::Complex;
use projection::SkyProjection;

/// Accumulation buffers for a gridding run.
///
/// Holds the weighted sum of samples and the matching sum of weights for
/// every grid cell. Cells are laid out x fastest, then y, polarization and
/// channel.
#[derive(Debug, Clone)]
pub struct GridAccumulator {
    pub nx: usize,
    pub ny: usize,
    pub npol: usize,
    pub nchan: usize,
    /// Sum of kernel * weight * value per cell.
    pub data: Vec<Complex<f32>>,
    /// Sum of kernel * weight per cell.
    pub weights: Vec<f32>,
}

impl GridAccumulator {
    pub fn new(nx: usize, ny: usize, npol: usize, nchan: usize) -> Self {
        let len = nx * ny * npol * nchan;
        Self {
            nx,
            ny,
            npol,
            nchan,
            data: vec![Complex::new(0.0, 0.0); len],
            weights: vec![0.0; len],
        }
    }

    /// Flat index of cell (ix, iy) in polarization plane `ipol`, channel
    /// `ichan`.
    #[inline]
    pub fn index(&self, ix: usize, iy: usize, ipol: usize, ichan: usize) -> usize {
        ix + self.nx * (iy + self.ny * (ipol + self.npol * ichan))
    }
}

/// One remembered extreme contribution to a grid cell.
///
/// The comparison key is the real part of the weighted contribution
/// `kernel * weight * value`; the components are kept separately so the
/// contribution can be subtracted from both accumulation buffers later.
#[derive(Debug, Clone, Copy)]
pub struct ClipRecord {
    pub contribution: f32,
    pub value: Complex<f32>,
    pub weight: f32,
    pub kernel: f32,
}

impl ClipRecord {
    fn unset(contribution: f32) -> Self {
        Self {
            contribution,
            value: Complex::new(0.0, 0.0),
            weight: 0.0,
            kernel: 0.0,
        }
    }
}

/// Per-cell bookkeeping for minmax clipping.
///
/// Contributions are counted once per (row, spatial cell) pair, shared
/// across channels; the extremes themselves are tracked per channel.
#[derive(Debug, Clone)]
pub struct ClipState {
    nx: usize,
    ny: usize,
    npol: usize,
    /// Contributing rows per spatial cell and polarization.
    counts: Vec<u32>,
    minima: Vec<ClipRecord>,
    maxima: Vec<ClipRecord>,
}

impl ClipState {
    pub fn new(nx: usize, ny: usize, npol: usize, nchan: usize) -> Self {
        let len = nx * ny * npol * nchan;
        Self {
            nx,
            ny,
            npol,
            counts: vec![0; nx * ny * npol],
            minima: vec![ClipRecord::unset(f32::INFINITY); len],
            maxima: vec![ClipRecord::unset(f32::NEG_INFINITY); len],
        }
    }

    /// Flat index into the per-cell count array.
    #[inline]
    pub fn cell_index(&self, ix: usize, iy: usize, ipol: usize) -> usize {
        ix + self.nx * (iy + self.ny * ipol)
    }

    /// Record that one more row contributes to the given spatial cell.
    #[inline]
    pub fn count_contribution(&mut self, ix: usize, iy: usize, ipol: usize) {
        let idx = self.cell_index(ix, iy, ipol);
        self.counts[idx] += 1;
    }

    pub fn count(&self, ix: usize, iy: usize, ipol: usize) -> u32 {
        self.counts[self.cell_index(ix, iy, ipol)]
    }

    /// Update the remembered extremes for a grid sample.
    ///
    /// `sample_idx` is the flat accumulator index of the cell; comparisons
    /// are strict, so the first contribution seen wins ties.
    #[inline]
    pub fn observe(&mut self, sample_idx: usize, value: Complex<f32>, weight: f32, kernel: f32) {
        let contribution = kernel * weight * value.re;
        let min = &mut self.minima[sample_idx];
        if contribution < min.contribution {
            *min = ClipRecord {
                contribution,
                value,
                weight,
                kernel,
            };
        }
        let max = &mut self.maxima[sample_idx];
        if contribution > max.contribution {
            *max = ClipRecord {
                contribution,
                value,
                weight,
                kernel,
            };
        }
    }

    pub fn minimum(&self, sample_idx: usize) -> &ClipRecord {
        &self.minima[sample_idx]
    }

    pub fn maximum(&self, sample_idx: usize) -> &ClipRecord {
        &self.maxima[sample_idx]
    }

    pub(crate) fn npol(&self) -> usize {
        self.npol
    }
}

/// The finished, normalized map.
#[derive(Debug, Clone)]
pub struct GriddedMap {
    nx: usize,
    ny: usize,
    npol: usize,
    nchan: usize,
    values: Vec<f32>,
    flags: Vec<bool>,
    projection: SkyProjection,
}

impl GriddedMap {
    pub(crate) fn new(
        nx: usize,
        ny: usize,
        npol: usize,
        nchan: usize,
        values: Vec<f32>,
        flags: Vec<bool>,
        projection: SkyProjection,
    ) -> Self {
        debug_assert_eq!(values.len(), nx * ny * npol * nchan);
        debug_assert_eq!(flags.len(), values.len());
        Self {
            nx,
            ny,
            npol,
            nchan,
            values,
            flags,
            projection,
        }
    }

    /// Map dimensions as (nx, ny, npol, nchan).
    pub fn map_size(&self) -> (usize, usize, usize, usize) {
        (self.nx, self.ny, self.npol, self.nchan)
    }

    /// Cell sizes as (|x|, |y|) in radians.
    pub fn cell_size(&self) -> (f64, f64) {
        self.projection.cell_size()
    }

    /// The sky projection tying pixels to directions.
    pub fn projection(&self) -> &SkyProjection {
        &self.projection
    }

    /// Sky direction of a cell center, or `None` for cells that project off
    /// the sphere.
    pub fn cell_direction(&self, ix: usize, iy: usize) -> Option<(f64, f64)> {
        self.projection.pixel_to_world(ix as f64, iy as f64)
    }

    /// Normalized cell value.
    pub fn value(&self, ix: usize, iy: usize, ipol: usize, ichan: usize) -> f32 {
        self.values[self.index(ix, iy, ipol, ichan)]
    }

    /// Whether a cell received any weight. Flagged cells hold value 0.
    pub fn is_flagged(&self, ix: usize, iy: usize, ipol: usize, ichan: usize) -> bool {
        self.flags[self.index(ix, iy, ipol, ichan)]
    }

    /// All cell values, x fastest.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// All cell flags, x fastest.
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    #[inline]
    fn index(&self, ix: usize, iy: usize, ipol: usize, ichan: usize) -> usize {
        ix + self.nx * (iy + self.ny * (ipol + self.npol * ichan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_index_x_fastest() {
        let acc = GridAccumulator::new(4, 3, 2, 5);
        assert_eq!(acc.index(0, 0, 0, 0), 0);
        assert_eq!(acc.index(1, 0, 0, 0), 1);
        assert_eq!(acc.index(0, 1, 0, 0), 4);
        assert_eq!(acc.index(0, 0, 1, 0), 12);
        assert_eq!(acc.index(0, 0, 0, 1), 24);
        assert_eq!(acc.data.len(), 120);
    }

    #[test]
    fn test_clip_observe_tracks_extremes() {
        let mut clip = ClipState::new(1, 1, 1, 1);
        clip.observe(0, Complex::new(5.0, 0.0), 1.0, 1.0);
        clip.observe(0, Complex::new(-2.0, 0.0), 1.0, 1.0);
        clip.observe(0, Complex::new(3.0, 0.0), 1.0, 1.0);
        assert_eq!(clip.minimum(0).contribution, -2.0);
        assert_eq!(clip.maximum(0).contribution, 5.0);
        assert_eq!(clip.maximum(0).value.re, 5.0);
    }

    #[test]
    fn test_clip_first_extreme_wins_ties() {
        let mut clip = ClipState::new(1, 1, 1, 1);
        clip.observe(0, Complex::new(2.0, 0.0), 1.0, 1.0);
        clip.observe(0, Complex::new(4.0, 0.0), 0.5, 1.0);
        // Same contribution of 2.0; the first record is kept.
        assert_eq!(clip.maximum(0).value.re, 2.0);
        assert_eq!(clip.maximum(0).weight, 1.0);
    }

    #[test]
    fn test_clip_weighted_contribution_is_the_key() {
        let mut clip = ClipState::new(1, 1, 1, 1);
        // A large value with a tiny weight contributes less than a modest
        // value at full weight.
        clip.observe(0, Complex::new(100.0, 0.0), 0.01, 1.0);
        clip.observe(0, Complex::new(3.0, 0.0), 1.0, 1.0);
        assert_eq!(clip.maximum(0).value.re, 3.0);
        assert_eq!(clip.minimum(0).value.re, 100.0);
    }

    #[test]
    fn test_clip_counts_per_spatial_cell() {
        let mut clip = ClipState::new(2, 2, 1, 3);
        clip.count_contribution(0, 1, 0);
        clip.count_contribution(0, 1, 0);
        assert_eq!(clip.count(0, 1, 0), 2);
        assert_eq!(clip.count(0, 0, 0), 0);
    }
}
