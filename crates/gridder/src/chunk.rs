//! Row chunks passed from the reader to the gridding stage.

use num_complex::Complex;

/// A block of spectra read from a source, sized for one pipeline handoff.
///
/// Per-sample arrays (`spectra`, `flagged`, `weights`) are laid out channel
/// fastest: the sample for channel `c` of row `r` lives at `c + nchan * r`.
/// Per-row arrays (`row_flagged`, `tint`, `directions`) have one entry per
/// row.
#[derive(Debug, Clone)]
pub struct DataChunk {
    /// Channels per row.
    pub nchan: usize,
    /// Allocated row capacity.
    pub capacity: usize,
    /// Rows actually filled.
    pub nrow: usize,
    /// Spectral samples, channel fastest.
    pub spectra: Vec<Complex<f32>>,
    /// Per-sample flags; `true` means excluded from gridding.
    pub flagged: Vec<bool>,
    /// Per-row flags; `true` drops the whole row.
    pub row_flagged: Vec<bool>,
    /// Per-sample weights. Sources fill this with system temperature; the
    /// weighting stage rewrites it in place with the final weights.
    pub weights: Vec<f32>,
    /// Integration time per row, in seconds.
    pub tint: Vec<f64>,
    /// Sky direction per row as (longitude, latitude) in radians.
    pub directions: Vec<[f64; 2]>,
}

impl DataChunk {
    /// Allocate a chunk for up to `capacity` rows of `nchan` channels.
    pub fn new(nchan: usize, capacity: usize) -> Self {
        let nsample = nchan * capacity;
        Self {
            nchan,
            capacity,
            nrow: 0,
            spectra: vec![Complex::new(0.0, 0.0); nsample],
            flagged: vec![false; nsample],
            row_flagged: vec![false; capacity],
            weights: vec![0.0; nsample],
            tint: vec![0.0; capacity],
            directions: vec![[0.0, 0.0]; capacity],
        }
    }

    /// Flat index of channel `ichan` in row `irow`.
    #[inline]
    pub fn sample_index(&self, ichan: usize, irow: usize) -> usize {
        ichan + self.nchan * irow
    }

    /// Mark only the first `nrow` rows as filled.
    ///
    /// # Panics
    /// Panics if `nrow` exceeds the chunk capacity.
    pub fn truncate(&mut self, nrow: usize) {
        assert!(nrow <= self.capacity, "chunk row count exceeds capacity");
        self.nrow = nrow;
    }
}
