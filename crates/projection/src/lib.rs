//! Sky-plane coordinate transformations.
//!
//! Implements the pixel/world mapping used when resampling single-dish
//! pointings onto a regular map.

pub mod angle;
pub mod sin;

pub use angle::unwrap_ra;
pub use sin::SkyProjection;

use thiserror::Error;

/// Errors raised when constructing a projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A cell size of zero (or a non-finite one) cannot define a map.
    #[error("degenerate cell size: ({0}, {1}) rad")]
    DegenerateCell(f64, f64),

    /// The map center must be a real sky direction.
    #[error("invalid map center: ({0}, {1}) rad")]
    InvalidCenter(f64, f64),
}
