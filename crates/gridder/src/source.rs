//! Input abstraction for spectral data.

use crate::chunk::DataChunk;
use crate::error::GridderError;

/// A supplier of single-dish spectra, one polarization at a time.
///
/// Implementations are read on the producer side of the gridding pipeline,
/// so they must be safe to share with the consumer thread holding the rest
/// of the run state.
pub trait SpectraSource: Sync {
    /// Number of spectral channels per row.
    fn nchan(&self) -> usize;

    /// Polarization identifiers, in gridding order.
    fn pol_ids(&self) -> &[u32];

    /// Number of rows available for the given polarization.
    fn nrows(&self, pol: u32) -> usize;

    /// Fill `chunk` with up to `chunk.capacity` rows of polarization `pol`
    /// starting at row `start`, and return how many rows were written.
    ///
    /// The implementation must fill `spectra`, `flagged`, `row_flagged`,
    /// `tint` and `directions`, put system temperature into `weights`, and
    /// call [`DataChunk::truncate`] with the row count it returns.
    fn read_block(
        &self,
        pol: u32,
        start: usize,
        chunk: &mut DataChunk,
    ) -> Result<usize, GridderError>;

    /// Sky directions of every row across all polarizations, used to derive
    /// the map extent before gridding starts.
    fn directions(&self) -> Vec<[f64; 2]>;
}
