//! Sample weight evaluation.

use crate::chunk::DataChunk;
use crate::config::WeightScheme;

/// Rewrite a chunk's weight buffer in place with the final gridding weights.
///
/// On entry the weight buffer holds system temperature per sample and
/// `chunk.tint` holds integration time per row. Only the first `chunk.nrow`
/// rows are touched.
pub fn apply_weights(scheme: WeightScheme, chunk: &mut DataChunk) {
    let nchan = chunk.nchan;
    match scheme {
        WeightScheme::Uniform => {
            for w in chunk.weights[..nchan * chunk.nrow].iter_mut() {
                *w = 1.0;
            }
        }
        WeightScheme::Tint => {
            for irow in 0..chunk.nrow {
                let t = chunk.tint[irow] as f32;
                for w in chunk.weights[nchan * irow..nchan * (irow + 1)].iter_mut() {
                    *w = t;
                }
            }
        }
        WeightScheme::Tsys => {
            for w in chunk.weights[..nchan * chunk.nrow].iter_mut() {
                let tsys = *w;
                *w = 1.0 / (tsys * tsys);
            }
        }
        WeightScheme::TintSys => {
            for irow in 0..chunk.nrow {
                let t = chunk.tint[irow] as f32;
                for w in chunk.weights[nchan * irow..nchan * (irow + 1)].iter_mut() {
                    let tsys = *w;
                    *w = t / (tsys * tsys);
                }
            }
        }
    }
}
