//! Error types for the gridding engine.

use thiserror::Error;

/// Errors that can occur while setting up or running a gridding operation.
#[derive(Debug, Error)]
pub enum GridderError {
    /// The requested convolution kernel is not supported.
    #[error("unsupported kernel type: {0}")]
    UnsupportedKernel(String),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The map geometry cannot be derived from the given preferences and
    /// data.
    #[error("invalid map geometry: {0}")]
    InvalidGeometry(String),

    /// The data selection matched nothing to grid.
    #[error("no data selected: {0}")]
    EmptySelection(String),

    /// The input sources disagree on shape or polarization layout.
    #[error("inconsistent sources: {0}")]
    SourceMismatch(String),

    /// A source failed to deliver a block of rows.
    #[error("failed to read source rows: {0}")]
    SourceRead(String),

    /// Projection construction failed.
    #[error(transparent)]
    Projection(#[from] projection::ProjectionError),
}
