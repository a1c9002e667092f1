//! The convolutional accumulation loop.

use crate::chunk::DataChunk;
use crate::grid::{ClipState, GridAccumulator};
use crate::kernel::KernelProfile;

/// Strategy interface for spreading a chunk of samples onto the grid.
///
/// The inner loop is the hottest code in a gridding run; keeping it behind a
/// trait lets alternative implementations (different kernel factorizations,
/// vectorized walks) slot in without touching the pipeline machinery.
/// Implementations are the sole mutators of the accumulation buffers and are
/// only ever invoked from the consumer role, never concurrently with
/// themselves.
pub trait Spreader: Sync {
    /// Spread one chunk of rows onto the grid for one polarization plane.
    ///
    /// `positions` holds the continuous pixel coordinate of each row,
    /// already projected from its sky direction.
    fn spread(
        &self,
        chunk: &DataChunk,
        positions: &[(f64, f64)],
        ipol: usize,
        acc: &mut GridAccumulator,
        clip: Option<&mut ClipState>,
    );
}

/// The default spreader: a separable kernel, looked up per axis from one
/// tabulated radial profile.
#[derive(Debug, Clone)]
pub struct SeparableSpreader {
    profile: KernelProfile,
}

impl SeparableSpreader {
    pub fn new(profile: KernelProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &KernelProfile {
        &self.profile
    }
}

impl Spreader for SeparableSpreader {
    fn spread(
        &self,
        chunk: &DataChunk,
        positions: &[(f64, f64)],
        ipol: usize,
        acc: &mut GridAccumulator,
        clip: Option<&mut ClipState>,
    ) {
        grid_chunk(chunk, positions, ipol, &self.profile, acc, clip);
    }
}

fn grid_chunk(
    chunk: &DataChunk,
    positions: &[(f64, f64)],
    ipol: usize,
    profile: &KernelProfile,
    acc: &mut GridAccumulator,
    mut clip: Option<&mut ClipState>,
) {
    debug_assert_eq!(positions.len(), chunk.nrow);
    debug_assert_eq!(chunk.nchan, acc.nchan);

    let support = profile.support as isize;
    let sampling = profile.sampling as f64;
    let (nx, ny) = (acc.nx as isize, acc.ny as isize);

    for irow in 0..chunk.nrow {
        if chunk.row_flagged[irow] {
            continue;
        }
        let (x, y) = positions[irow];
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let loc_x = x.round() as isize;
        let loc_y = y.round() as isize;

        for dy in -support..=support {
            let iy = loc_y + dy;
            if iy < 0 || iy >= ny {
                continue;
            }
            let ky = profile.value(((iy as f64 - y) * sampling).abs().round() as usize);
            if ky == 0.0 {
                continue;
            }
            for dx in -support..=support {
                let ix = loc_x + dx;
                if ix < 0 || ix >= nx {
                    continue;
                }
                let kx = profile.value(((ix as f64 - x) * sampling).abs().round() as usize);
                let k = kx * ky;
                if k == 0.0 {
                    continue;
                }

                if let Some(clip) = clip.as_deref_mut() {
                    clip.count_contribution(ix as usize, iy as usize, ipol);
                }

                for ichan in 0..chunk.nchan {
                    let si = chunk.sample_index(ichan, irow);
                    if chunk.flagged[si] {
                        continue;
                    }
                    let value = chunk.spectra[si];
                    let weight = chunk.weights[si];
                    let gi = acc.index(ix as usize, iy as usize, ipol, ichan);
                    acc.data[gi] += value * (k * weight);
                    acc.weights[gi] += k * weight;
                    if let Some(clip) = clip.as_deref_mut() {
                        clip.observe(gi, value, weight, k);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridderConfig, KernelKind};
    use num_complex::Complex;

    fn box_profile() -> KernelProfile {
        KernelProfile::tabulate(&GridderConfig::default()).unwrap()
    }

    fn chunk_with_rows(values: &[f32]) -> DataChunk {
        let mut chunk = DataChunk::new(1, values.len());
        chunk.truncate(values.len());
        for (i, &v) in values.iter().enumerate() {
            chunk.spectra[i] = Complex::new(v, 0.0);
            chunk.weights[i] = 1.0;
        }
        chunk
    }

    #[test]
    fn test_rows_land_on_nearest_cell() {
        let chunk = chunk_with_rows(&[2.0, 4.0]);
        let mut acc = GridAccumulator::new(3, 3, 1, 1);
        // Both rows sit within half a pixel of cell (1, 1).
        grid_chunk(
            &chunk,
            &[(1.0, 1.0), (1.2, 0.9)],
            0,
            &box_profile(),
            &mut acc,
            None,
        );
        let gi = acc.index(1, 1, 0, 0);
        assert_eq!(acc.data[gi].re, 6.0);
        assert_eq!(acc.weights[gi], 2.0);
        // No spill into neighbours for a support-0 box kernel.
        assert_eq!(acc.weights[acc.index(0, 1, 0, 0)], 0.0);
        assert_eq!(acc.weights[acc.index(2, 1, 0, 0)], 0.0);
    }

    #[test]
    fn test_row_flag_skips_whole_row() {
        let mut chunk = chunk_with_rows(&[2.0, 4.0]);
        chunk.row_flagged[0] = true;
        let mut acc = GridAccumulator::new(1, 1, 1, 1);
        grid_chunk(
            &chunk,
            &[(0.0, 0.0), (0.0, 0.0)],
            0,
            &box_profile(),
            &mut acc,
            None,
        );
        assert_eq!(acc.data[0].re, 4.0);
        assert_eq!(acc.weights[0], 1.0);
    }

    #[test]
    fn test_channel_flag_skips_sample() {
        let mut chunk = DataChunk::new(2, 1);
        chunk.truncate(1);
        chunk.spectra = vec![Complex::new(1.0, 0.0), Complex::new(9.0, 0.0)];
        chunk.weights = vec![1.0, 1.0];
        chunk.flagged[1] = true;
        let mut acc = GridAccumulator::new(1, 1, 1, 2);
        grid_chunk(&chunk, &[(0.0, 0.0)], 0, &box_profile(), &mut acc, None);
        assert_eq!(acc.weights[acc.index(0, 0, 0, 0)], 1.0);
        assert_eq!(acc.weights[acc.index(0, 0, 0, 1)], 0.0);
    }

    #[test]
    fn test_out_of_bounds_rows_are_dropped() {
        let chunk = chunk_with_rows(&[5.0]);
        let mut acc = GridAccumulator::new(2, 2, 1, 1);
        grid_chunk(&chunk, &[(7.0, -3.0)], 0, &box_profile(), &mut acc, None);
        assert!(acc.weights.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_spheroidal_spreads_over_support() {
        let cfg = GridderConfig {
            kernel: KernelKind::Spheroidal,
            ..GridderConfig::default()
        };
        let profile = KernelProfile::tabulate(&cfg).unwrap();
        let chunk = chunk_with_rows(&[1.0]);
        let mut acc = GridAccumulator::new(9, 9, 1, 1);
        grid_chunk(&chunk, &[(4.0, 4.0)], 0, &profile, &mut acc, None);
        let center = acc.weights[acc.index(4, 4, 0, 0)];
        let near = acc.weights[acc.index(5, 4, 0, 0)];
        let far = acc.weights[acc.index(6, 4, 0, 0)];
        assert!(center > near && near > far && far > 0.0);
        // The profile is zero at the support radius of 3 pixels.
        assert_eq!(acc.weights[acc.index(7, 4, 0, 0)], 0.0);
    }

    #[test]
    fn test_clip_state_counts_once_per_row_and_cell() {
        let chunk = chunk_with_rows(&[1.0, 2.0, 3.0]);
        let mut acc = GridAccumulator::new(1, 1, 1, 1);
        let mut clip = ClipState::new(1, 1, 1, 1);
        grid_chunk(
            &chunk,
            &[(0.0, 0.0); 3],
            0,
            &box_profile(),
            &mut acc,
            Some(&mut clip),
        );
        assert_eq!(clip.count(0, 0, 0), 3);
        assert_eq!(clip.minimum(0).value.re, 1.0);
        assert_eq!(clip.maximum(0).value.re, 3.0);
    }
}
