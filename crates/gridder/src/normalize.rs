//! Clipping and final normalization of the accumulated grid.

use crate::grid::{ClipState, GridAccumulator};

/// Remove each cell's most extreme positive and negative contributions.
///
/// Cells with two or fewer contributing rows are left untouched; stripping
/// extremes from them would delete most of the signal.
pub fn clip_extremes(acc: &mut GridAccumulator, clip: &ClipState) {
    debug_assert_eq!(clip.npol(), acc.npol);
    for ipol in 0..acc.npol {
        for iy in 0..acc.ny {
            for ix in 0..acc.nx {
                if clip.count(ix, iy, ipol) <= 2 {
                    continue;
                }
                for ichan in 0..acc.nchan {
                    let gi = acc.index(ix, iy, ipol, ichan);
                    for record in [clip.minimum(gi), clip.maximum(gi)] {
                        let kw = record.kernel * record.weight;
                        acc.data[gi] -= record.value * kw;
                        acc.weights[gi] -= kw;
                    }
                }
            }
        }
    }
}

/// Convert accumulated (value, weight) pairs into a mean map and a validity
/// mask. Cells that gathered no weight report 0 and are flagged.
pub fn normalize(acc: &GridAccumulator) -> (Vec<f32>, Vec<bool>) {
    let mut values = vec![0.0f32; acc.data.len()];
    let mut flags = vec![false; acc.data.len()];
    for (i, (v, f)) in values.iter_mut().zip(flags.iter_mut()).enumerate() {
        let w = acc.weights[i];
        if w > 0.0 {
            *v = acc.data[i].re / w;
        } else {
            *f = true;
        }
    }
    (values, flags)
}
