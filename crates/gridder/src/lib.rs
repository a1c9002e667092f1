//! Convolutional gridding of single-dish spectra onto regular sky maps.
//!
//! Irregularly-sampled telescope pointings are resampled onto a regular
//! pixel grid by spreading each spectrum across nearby cells, weighted by a
//! tabulated convolution kernel and the sample's statistical weight. The
//! accumulated grid is normalized into a mean map with a validity mask.
//!
//! Input flows through a bounded producer/consumer pipeline (see the
//! `pipeline` crate): a reader thread fills fixed-capacity row chunks while
//! the gridding thread spreads the previous chunk, one polarization at a
//! time.
//!
//! ```
//! use gridder::{Gridder, GridderConfig, MemoryRow, MemorySource};
//!
//! let mut source = MemorySource::single_pol(2);
//! source.push_row(0, MemoryRow::new([1.0, 0.5], vec![3.0, 4.0]));
//! source.push_row(0, MemoryRow::new([1.0, 0.5], vec![5.0, 6.0]));
//!
//! let gridder = Gridder::new(GridderConfig::default())?;
//! let map = gridder.grid(&[source])?;
//! let (nx, ny, npol, nchan) = map.map_size();
//! assert_eq!((npol, nchan), (1, 2));
//! assert_eq!(map.value(nx / 2, ny / 2, 0, 0), 4.0);
//! # Ok::<(), gridder::GridderError>(())
//! ```

pub mod accumulate;
pub mod chunk;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod gridder;
pub mod kernel;
pub mod normalize;
pub mod source;
pub mod testdata;
pub mod weight;

pub use accumulate::{SeparableSpreader, Spreader};
pub use chunk::DataChunk;
pub use config::{GridderConfig, KernelKind, MapSpec, WeightScheme};
pub use error::GridderError;
pub use geometry::{MapGeometry, SkyExtent};
pub use grid::{ClipState, GridAccumulator, GriddedMap};
pub use gridder::Gridder;
pub use kernel::KernelProfile;
pub use source::SpectraSource;
pub use testdata::{MemoryRow, MemorySource};
