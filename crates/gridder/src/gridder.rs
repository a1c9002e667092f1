//! The top-level gridding driver.

use pipeline::Broker;

use crate::accumulate::{SeparableSpreader, Spreader};
use crate::chunk::DataChunk;
use crate::config::{GridderConfig, KernelKind};
use crate::error::GridderError;
use crate::geometry::{resolve_geometry, SkyExtent};
use crate::grid::{ClipState, GridAccumulator, GriddedMap};
use crate::kernel::KernelProfile;
use crate::normalize::{clip_extremes, normalize};
use crate::source::SpectraSource;
use crate::weight::apply_weights;

/// Grids single-dish spectra from one or more sources onto a sky map.
///
/// A `Gridder` is configured once and can run any number of gridding
/// operations. Each run streams every (source, polarization) selection
/// through a producer/consumer pipeline: the producer reads and weights row
/// chunks while the consumer spreads the previous chunk onto the shared
/// accumulation grid.
#[derive(Debug, Clone)]
pub struct Gridder {
    config: GridderConfig,
}

impl Gridder {
    /// Create a gridder, validating the configuration up front.
    pub fn new(config: GridderConfig) -> Result<Self, GridderError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GridderConfig {
        &self.config
    }

    /// Tabulate the configured convolution kernel without running a grid.
    /// Useful for inspecting the effective profile a run would use.
    pub fn kernel_profile(&self) -> Result<KernelProfile, GridderError> {
        KernelProfile::tabulate(&self.config)
    }

    /// Grid every row of every source onto a single map.
    ///
    /// All sources must agree on channel count and polarization layout;
    /// their rows accumulate into the same grid.
    pub fn grid<S: SpectraSource>(&self, sources: &[S]) -> Result<GriddedMap, GridderError> {
        let first = sources
            .first()
            .ok_or_else(|| GridderError::EmptySelection("no input sources".to_string()))?;
        let nchan = first.nchan();
        let pol_ids = first.pol_ids().to_vec();
        if nchan == 0 {
            return Err(GridderError::EmptySelection(
                "sources have zero channels".to_string(),
            ));
        }
        if pol_ids.is_empty() {
            return Err(GridderError::EmptySelection(
                "sources carry no polarizations".to_string(),
            ));
        }
        for (i, source) in sources.iter().enumerate().skip(1) {
            if source.nchan() != nchan {
                return Err(GridderError::SourceMismatch(format!(
                    "source {i} has {} channels, expected {nchan}",
                    source.nchan()
                )));
            }
            if source.pol_ids() != pol_ids.as_slice() {
                return Err(GridderError::SourceMismatch(format!(
                    "source {i} has a different polarization layout"
                )));
            }
        }
        let total_rows: usize = sources
            .iter()
            .flat_map(|s| pol_ids.iter().map(move |&p| s.nrows(p)))
            .sum();
        if total_rows == 0 {
            return Err(GridderError::EmptySelection(
                "sources contain no rows".to_string(),
            ));
        }

        let extent = sources
            .iter()
            .filter_map(|s| SkyExtent::from_directions(&s.directions()))
            .reduce(|mut a, b| {
                a.merge(&b);
                a
            });
        let geometry = resolve_geometry(&self.config.map, extent.as_ref())?;

        let profile = KernelProfile::tabulate(&self.config)?;
        if matches!(
            self.config.kernel,
            KernelKind::Gaussian | KernelKind::GaussJinc
        ) && (geometry.cell_x - geometry.cell_y).abs() > 1e-12 * geometry.cell_y
        {
            tracing::warn!(
                cell_x = geometry.cell_x,
                cell_y = geometry.cell_y,
                "kernel widths are in pixel units but map cells are not square"
            );
        }

        let npol = pol_ids.len();
        tracing::debug!(
            nx = geometry.nx,
            ny = geometry.ny,
            npol,
            nchan,
            kernel = ?profile.kind,
            support = profile.support,
            total_rows,
            "starting gridding run"
        );

        let mut acc = GridAccumulator::new(geometry.nx, geometry.ny, npol, nchan);
        let mut clip = self
            .config
            .clip_extremes
            .then(|| ClipState::new(geometry.nx, geometry.ny, npol, nchan));

        let spreader = SeparableSpreader::new(profile);
        let broker = Broker::new(self.config.look_ahead);
        let projection = &geometry.projection;

        for (isource, source) in sources.iter().enumerate() {
            tracing::debug!(source = isource, "start source");
            for (ipol, &pol) in pol_ids.iter().enumerate() {
                tracing::debug!(pol, "start polarization");
                let nrows = source.nrows(pol);
                if nrows == 0 {
                    continue;
                }
                let capacity = self.config.chunk_capacity.min(nrows);
                let mut cursor = 0usize;

                let produce = || -> Result<Option<DataChunk>, GridderError> {
                    if cursor >= nrows {
                        return Ok(None);
                    }
                    let mut chunk = DataChunk::new(nchan, capacity);
                    let read = source.read_block(pol, cursor, &mut chunk)?;
                    if read == 0 {
                        return Ok(None);
                    }
                    cursor += read;
                    apply_weights(self.config.weight_scheme, &mut chunk);
                    Ok(Some(chunk))
                };

                let acc = &mut acc;
                let clip = &mut clip;
                let consume = |chunk: DataChunk| -> Result<(), GridderError> {
                    let positions: Vec<(f64, f64)> = chunk.directions[..chunk.nrow]
                        .iter()
                        .map(|d| projection.world_to_pixel(d[0], d[1]))
                        .collect();
                    spreader.spread(&chunk, &positions, ipol, acc, clip.as_mut());
                    Ok(())
                };

                broker.run(produce, consume)?;
            }
        }

        if let Some(clip) = &clip {
            clip_extremes(&mut acc, clip);
        }
        let (values, flags) = normalize(&acc);
        Ok(GriddedMap::new(
            geometry.nx,
            geometry.ny,
            npol,
            nchan,
            values,
            flags,
            geometry.projection,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridderConfig;
    use crate::testdata::MemorySource;

    #[test]
    fn test_new_rejects_bad_config() {
        let config = GridderConfig {
            look_ahead: 0,
            ..GridderConfig::default()
        };
        assert!(Gridder::new(config).is_err());
    }

    #[test]
    fn test_no_sources_is_empty_selection() {
        let gridder = Gridder::new(GridderConfig::default()).unwrap();
        let sources: Vec<MemorySource> = vec![];
        assert!(matches!(
            gridder.grid(&sources),
            Err(GridderError::EmptySelection(_))
        ));
    }

    #[test]
    fn test_no_rows_is_empty_selection() {
        let gridder = Gridder::new(GridderConfig::default()).unwrap();
        let sources = vec![MemorySource::single_pol(4)];
        assert!(matches!(
            gridder.grid(&sources),
            Err(GridderError::EmptySelection(_))
        ));
    }

    #[test]
    fn test_channel_count_mismatch_rejected() {
        let gridder = Gridder::new(GridderConfig::default()).unwrap();
        let mut a = MemorySource::single_pol(4);
        a.push_row(0, crate::testdata::MemoryRow::new([1.0, 0.5], vec![1.0; 4]));
        let sources = vec![a, MemorySource::single_pol(8)];
        assert!(matches!(
            gridder.grid(&sources),
            Err(GridderError::SourceMismatch(_))
        ));
    }

    #[test]
    fn test_kernel_profile_export() {
        let gridder = Gridder::new(GridderConfig::default()).unwrap();
        let profile = gridder.kernel_profile().unwrap();
        assert_eq!(profile.values().len(), 200);
        assert_eq!(profile.value(0), 1.0);
    }
}
