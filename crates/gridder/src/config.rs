//! Configuration for the gridding engine.

use serde::{Deserialize, Serialize};

use crate::error::GridderError;

/// Convolution kernel family used to spread samples onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// Pillbox: every cell within the support gets the full sample.
    #[default]
    Box,
    /// Prolate-spheroidal-wave kernel, the usual imaging default.
    Spheroidal,
    /// Truncated Gaussian.
    Gaussian,
    /// Gaussian tapered by a Jinc (J1(x)/x) envelope.
    #[serde(rename = "gauss-jinc")]
    GaussJinc,
}

impl KernelKind {
    /// Parse a kernel name.
    ///
    /// Unlike weight schemes, an unknown kernel is fatal: there is no
    /// sensible fallback that preserves the requested beam shape.
    pub fn from_str(s: &str) -> Result<Self, GridderError> {
        match s.to_lowercase().as_str() {
            "box" => Ok(Self::Box),
            "spheroidal" | "sf" => Ok(Self::Spheroidal),
            "gaussian" | "gauss" => Ok(Self::Gaussian),
            "gauss-jinc" | "gjinc" => Ok(Self::GaussJinc),
            other => Err(GridderError::UnsupportedKernel(other.to_string())),
        }
    }
}

/// How each sample's statistical weight is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightScheme {
    /// All samples weigh the same.
    #[default]
    Uniform,
    /// Weight by integration time.
    Tint,
    /// Weight by 1 / Tsys².
    Tsys,
    /// Weight by integration time / Tsys².
    TintSys,
}

impl WeightScheme {
    /// Parse a weight scheme name, degrading to `Uniform` with a warning on
    /// unknown input.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "uniform" => Self::Uniform,
            "tint" | "integration-time" => Self::Tint,
            "tsys" | "system-temperature" => Self::Tsys,
            "tintsys" | "tint-tsys" => Self::TintSys,
            other => {
                tracing::warn!(
                    scheme = other,
                    "unsupported weight scheme, applying uniform weights"
                );
                Self::Uniform
            }
        }
    }
}

/// User preferences for the output map geometry.
///
/// Any field left unset is derived from the sky extent of the input data
/// (see `geometry::resolve_geometry`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MapSpec {
    /// Map width in pixels.
    pub nx: Option<usize>,
    /// Map height in pixels.
    pub ny: Option<usize>,
    /// Cell size along x in radians (positive; the projection applies the
    /// sign convention).
    pub cell_x: Option<f64>,
    /// Cell size along y in radians.
    pub cell_y: Option<f64>,
    /// Map center as (longitude, latitude) in radians.
    pub center: Option<(f64, f64)>,
}

/// Configuration for a gridding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridderConfig {
    /// Convolution kernel family.
    pub kernel: KernelKind,

    /// Explicit kernel half-width in pixels for box/spheroidal kernels.
    /// Gaussian-family kernels derive their support from the truncation
    /// radius instead.
    pub kernel_support: Option<usize>,

    /// Tabulated kernel samples per pixel of offset.
    pub kernel_sampling: usize,

    /// Gaussian half-width at half maximum, in pixels.
    pub gauss_width: Option<f64>,

    /// Jinc scale parameter, in pixels (gauss-jinc only).
    pub jinc_width: Option<f64>,

    /// Kernel truncation radius in pixels (Gaussian-family kernels).
    pub truncate: Option<f64>,

    /// Sample weighting scheme.
    pub weight_scheme: WeightScheme,

    /// Subtract each cell's most extreme positive and negative
    /// contributions before normalizing.
    pub clip_extremes: bool,

    /// How many chunks the producer may run ahead of the consumer.
    pub look_ahead: usize,

    /// Maximum rows per chunk handed through the pipeline.
    pub chunk_capacity: usize,

    /// Output map geometry preferences.
    pub map: MapSpec,
}

impl Default for GridderConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Box,
            kernel_support: None,
            kernel_sampling: 100,
            gauss_width: None,
            jinc_width: None,
            truncate: None,
            weight_scheme: WeightScheme::Uniform,
            clip_extremes: false,
            look_ahead: 3,
            chunk_capacity: 400,
            map: MapSpec::default(),
        }
    }
}

impl GridderConfig {
    /// Load configuration from environment variables, starting from the
    /// defaults.
    pub fn from_env() -> Result<Self, GridderError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRIDDER_KERNEL") {
            config.kernel = KernelKind::from_str(&val)?;
        }

        if let Ok(val) = std::env::var("GRIDDER_KERNEL_SUPPORT") {
            if let Ok(support) = val.parse() {
                config.kernel_support = Some(support);
            }
        }

        if let Ok(val) = std::env::var("GRIDDER_KERNEL_SAMPLING") {
            if let Ok(sampling) = val.parse() {
                config.kernel_sampling = sampling;
            }
        }

        if let Ok(val) = std::env::var("GRIDDER_WEIGHT_SCHEME") {
            config.weight_scheme = WeightScheme::from_str(&val);
        }

        if let Ok(val) = std::env::var("GRIDDER_CLIP_EXTREMES") {
            config.clip_extremes = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("GRIDDER_LOOK_AHEAD") {
            if let Ok(depth) = val.parse() {
                config.look_ahead = depth;
            }
        }

        if let Ok(val) = std::env::var("GRIDDER_CHUNK_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.chunk_capacity = capacity;
            }
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GridderError> {
        if self.kernel_sampling == 0 {
            return Err(GridderError::InvalidConfig(
                "kernel_sampling must be > 0".to_string(),
            ));
        }

        if self.look_ahead == 0 {
            return Err(GridderError::InvalidConfig(
                "look_ahead must be > 0".to_string(),
            ));
        }

        if self.chunk_capacity == 0 {
            return Err(GridderError::InvalidConfig(
                "chunk_capacity must be > 0".to_string(),
            ));
        }

        for (name, value) in [
            ("gauss_width", self.gauss_width),
            ("jinc_width", self.jinc_width),
            ("truncate", self.truncate),
        ] {
            if let Some(v) = value {
                if v < 0.0 || !v.is_finite() {
                    return Err(GridderError::InvalidConfig(format!(
                        "{name} must be finite and non-negative, got {v}"
                    )));
                }
            }
        }

        if self.map.nx == Some(0) || self.map.ny == Some(0) {
            return Err(GridderError::InvalidConfig(
                "map pixel counts must be > 0".to_string(),
            ));
        }

        for (name, value) in [("cell_x", self.map.cell_x), ("cell_y", self.map.cell_y)] {
            if let Some(v) = value {
                if v <= 0.0 || !v.is_finite() {
                    return Err(GridderError::InvalidConfig(format!(
                        "map {name} must be finite and positive, got {v}"
                    )));
                }
            }
        }

        Ok(())
    }
}
