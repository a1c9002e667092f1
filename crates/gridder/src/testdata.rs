//! In-memory spectra sources for tests and examples.

use num_complex::Complex;

use crate::chunk::DataChunk;
use crate::error::GridderError;
use crate::source::SpectraSource;

/// One spectrum row held in memory.
#[derive(Debug, Clone)]
pub struct MemoryRow {
    /// Sky direction as (longitude, latitude) in radians.
    pub direction: [f64; 2],
    /// Real-valued spectrum, one entry per channel.
    pub values: Vec<f32>,
    /// Per-channel flags; empty means all channels are good.
    pub flagged: Vec<bool>,
    /// Drops the whole row when set.
    pub row_flagged: bool,
    /// Integration time in seconds.
    pub tint: f64,
    /// System temperature: a single entry broadcasts across channels,
    /// otherwise one entry per channel.
    pub tsys: Vec<f32>,
}

impl MemoryRow {
    /// A good row with unit integration time and unit system temperature.
    pub fn new(direction: [f64; 2], values: Vec<f32>) -> Self {
        Self {
            direction,
            values,
            flagged: Vec::new(),
            row_flagged: false,
            tint: 1.0,
            tsys: vec![1.0],
        }
    }
}

/// A [`SpectraSource`] over rows held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    nchan: usize,
    pol_ids: Vec<u32>,
    rows: Vec<Vec<MemoryRow>>,
}

impl MemorySource {
    /// An empty single-polarization source.
    pub fn single_pol(nchan: usize) -> Self {
        Self::with_pols(nchan, vec![0])
    }

    /// An empty source with the given polarization identifiers.
    pub fn with_pols(nchan: usize, pol_ids: Vec<u32>) -> Self {
        let rows = vec![Vec::new(); pol_ids.len()];
        Self {
            nchan,
            pol_ids,
            rows,
        }
    }

    /// Append a row to the given polarization.
    ///
    /// # Panics
    /// Panics if `pol` is not one of this source's polarizations.
    pub fn push_row(&mut self, pol: u32, row: MemoryRow) {
        let idx = self.pol_index(pol).expect("unknown polarization id");
        self.rows[idx].push(row);
    }

    fn pol_index(&self, pol: u32) -> Option<usize> {
        self.pol_ids.iter().position(|&p| p == pol)
    }
}

impl SpectraSource for MemorySource {
    fn nchan(&self) -> usize {
        self.nchan
    }

    fn pol_ids(&self) -> &[u32] {
        &self.pol_ids
    }

    fn nrows(&self, pol: u32) -> usize {
        self.pol_index(pol).map_or(0, |i| self.rows[i].len())
    }

    fn read_block(
        &self,
        pol: u32,
        start: usize,
        chunk: &mut DataChunk,
    ) -> Result<usize, GridderError> {
        let idx = self
            .pol_index(pol)
            .ok_or_else(|| GridderError::SourceRead(format!("unknown polarization {pol}")))?;
        let rows = &self.rows[idx];
        let end = rows.len().min(start + chunk.capacity);
        let count = end.saturating_sub(start);
        for (irow, row) in rows[start..end].iter().enumerate() {
            if row.values.len() != self.nchan {
                return Err(GridderError::SourceRead(format!(
                    "row {} has {} channels, expected {}",
                    start + irow,
                    row.values.len(),
                    self.nchan
                )));
            }
            chunk.directions[irow] = row.direction;
            chunk.row_flagged[irow] = row.row_flagged;
            chunk.tint[irow] = row.tint;
            for ichan in 0..self.nchan {
                let si = chunk.sample_index(ichan, irow);
                chunk.spectra[si] = Complex::new(row.values[ichan], 0.0);
                chunk.flagged[si] = row.flagged.get(ichan).copied().unwrap_or(false);
                chunk.weights[si] = if row.tsys.len() == 1 {
                    row.tsys[0]
                } else {
                    row.tsys[ichan]
                };
            }
        }
        chunk.truncate(count);
        Ok(count)
    }

    fn directions(&self) -> Vec<[f64; 2]> {
        self.rows
            .iter()
            .flatten()
            .map(|row| row.direction)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_block_fills_chunk() {
        let mut source = MemorySource::single_pol(2);
        let mut row = MemoryRow::new([1.0, 0.5], vec![3.0, 4.0]);
        row.tint = 7.0;
        row.tsys = vec![2.0];
        source.push_row(0, row);

        let mut chunk = DataChunk::new(2, 4);
        let read = source.read_block(0, 0, &mut chunk).unwrap();
        assert_eq!(read, 1);
        assert_eq!(chunk.nrow, 1);
        assert_eq!(chunk.spectra[0].re, 3.0);
        assert_eq!(chunk.spectra[1].re, 4.0);
        assert_eq!(chunk.weights, vec![2.0, 2.0, 0.0, 0.0]);
        assert_eq!(chunk.tint[0], 7.0);
        assert_eq!(chunk.directions[0], [1.0, 0.5]);
    }

    #[test]
    fn test_read_block_paginates() {
        let mut source = MemorySource::single_pol(1);
        for i in 0..5 {
            source.push_row(0, MemoryRow::new([0.0, 0.0], vec![i as f32]));
        }
        let mut chunk = DataChunk::new(1, 2);
        assert_eq!(source.read_block(0, 0, &mut chunk).unwrap(), 2);
        assert_eq!(source.read_block(0, 2, &mut chunk).unwrap(), 2);
        assert_eq!(source.read_block(0, 4, &mut chunk).unwrap(), 1);
        assert_eq!(chunk.spectra[0].re, 4.0);
        assert_eq!(source.read_block(0, 5, &mut chunk).unwrap(), 0);
    }

    #[test]
    fn test_per_channel_tsys() {
        let mut source = MemorySource::single_pol(2);
        let mut row = MemoryRow::new([0.0, 0.0], vec![1.0, 1.0]);
        row.tsys = vec![2.0, 4.0];
        source.push_row(0, row);
        let mut chunk = DataChunk::new(2, 1);
        source.read_block(0, 0, &mut chunk).unwrap();
        assert_eq!(chunk.weights, vec![2.0, 4.0]);
    }

    #[test]
    fn test_short_row_is_an_error() {
        let mut source = MemorySource::single_pol(3);
        source.push_row(0, MemoryRow::new([0.0, 0.0], vec![1.0]));
        let mut chunk = DataChunk::new(3, 1);
        assert!(matches!(
            source.read_block(0, 0, &mut chunk),
            Err(GridderError::SourceRead(_))
        ));
    }
}
