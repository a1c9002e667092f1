//! Map geometry resolution.
//!
//! Fills in whatever the user left unset in [`MapSpec`] from the sky extent
//! of the input pointings: the map center defaults to the middle of the
//! observed region, pixel counts and cell sizes are derived from the span of
//! the data, and an explicit center is folded onto the same RA branch as the
//! pointings.

use std::f64::consts::PI;

use projection::{unwrap_ra, SkyProjection};

use crate::config::MapSpec;
use crate::error::GridderError;

/// Default cell size when nothing can be derived: 1 arcminute.
const DEFAULT_CELL: f64 = PI / 10800.0;
/// Default spatial extent for degenerate (single-pointing) data: 10 arcmin.
const DEFAULT_EXTENT: f64 = 0.00290888;

/// Bounding box of observed sky directions, RA already unwrapped onto a
/// contiguous branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyExtent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl SkyExtent {
    /// Bounding box of a set of (longitude, latitude) directions, or `None`
    /// when the set is empty.
    pub fn from_directions(directions: &[[f64; 2]]) -> Option<Self> {
        if directions.is_empty() {
            return None;
        }
        let mut ra: Vec<f64> = directions.iter().map(|d| d[0]).collect();
        unwrap_ra(&mut ra);
        let mut extent = Self {
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
        };
        for (lon, d) in ra.iter().zip(directions) {
            extent.xmin = extent.xmin.min(*lon);
            extent.xmax = extent.xmax.max(*lon);
            extent.ymin = extent.ymin.min(d[1]);
            extent.ymax = extent.ymax.max(d[1]);
        }
        Some(extent)
    }

    /// Grow this extent to cover another.
    pub fn merge(&mut self, other: &SkyExtent) {
        self.xmin = self.xmin.min(other.xmin);
        self.xmax = self.xmax.max(other.xmax);
        self.ymin = self.ymin.min(other.ymin);
        self.ymax = self.ymax.max(other.ymax);
    }
}

/// Fully resolved output map geometry.
#[derive(Debug, Clone)]
pub struct MapGeometry {
    pub nx: usize,
    pub ny: usize,
    /// Cell size along x in radians (positive).
    pub cell_x: f64,
    /// Cell size along y in radians (positive).
    pub cell_y: f64,
    /// Map center as (longitude, latitude) in radians.
    pub center: (f64, f64),
    pub projection: SkyProjection,
}

/// Resolve the output geometry from user preferences and the data extent.
///
/// `extent` may be `None` only when `spec` pins down center, pixel counts
/// and both cell sizes itself.
pub fn resolve_geometry(
    spec: &MapSpec,
    extent: Option<&SkyExtent>,
) -> Result<MapGeometry, GridderError> {
    let need = |what: &str| -> Result<&SkyExtent, GridderError> {
        extent.ok_or_else(|| {
            GridderError::InvalidGeometry(format!(
                "{what} not specified and no pointings available to derive it from"
            ))
        })
    };

    let center = match spec.center {
        None => {
            let e = need("map center")?;
            (0.5 * (e.xmin + e.xmax), 0.5 * (e.ymin + e.ymax))
        }
        Some((lon, lat)) => {
            // Fold the user center onto the RA branch the pointings live on.
            let lon = match extent {
                Some(e) => {
                    let base = 0.5 * (e.xmin + e.xmax);
                    let mut best = lon;
                    let mut best_sep = (base - lon).abs();
                    for k in [-1.0, 1.0] {
                        let candidate = lon + k * 2.0 * PI;
                        let sep = (base - candidate).abs();
                        if sep < best_sep {
                            best_sep = sep;
                            best = candidate;
                        }
                    }
                    best
                }
                None => lon,
            };
            (lon, lat)
        }
    };

    // A lone pixel count applies to both axes.
    let (mut nx, mut ny) = match (spec.nx, spec.ny) {
        (None, Some(n)) | (Some(n), None) => (Some(n), Some(n)),
        other => other,
    };

    let width = |e: &SkyExtent| {
        let wx = 2.0 * (e.xmax - center.0).abs().max((e.xmin - center.0).abs());
        let wy = 2.0 * (e.ymax - center.1).abs().max((e.ymin - center.1).abs());
        if wx == 0.0 || wy == 0.0 {
            tracing::debug!("degenerate pointing extent, using 10 arcmin default");
        }
        (
            if wx == 0.0 { DEFAULT_EXTENT } else { wx },
            if wy == 0.0 { DEFAULT_EXTENT } else { wy },
        )
    };

    let (cell_x, cell_y) = match (spec.cell_x, spec.cell_y) {
        (Some(cx), Some(cy)) => (cx, cy),
        (Some(c), None) | (None, Some(c)) => (c, c),
        (None, None) => match (nx, ny) {
            (None, _) | (_, None) => {
                tracing::debug!("no grid preferences given, using 1 arcmin cells");
                (DEFAULT_CELL, DEFAULT_CELL)
            }
            (Some(px), Some(py)) => {
                let (wx, wy) = width(need("cell size")?);
                let cos_dec = center.1.cos();
                let cx = if px > 1 {
                    wx / (px - 1) as f64 * cos_dec
                } else {
                    1.1 * wx / px as f64 * cos_dec
                };
                let cy = if py > 1 {
                    wy / (py - 1) as f64
                } else {
                    1.1 * wy / py as f64
                };
                (cx, cy)
            }
        },
    };

    if nx.is_none() {
        let (wx, wy) = width(need("map size")?);
        nx = Some(((wx / (cell_x / center.1.cos())).ceil() as usize).max(1));
        ny = Some(((wy / cell_y).ceil() as usize).max(1));
    }
    let (nx, ny) = (nx.unwrap_or(1), ny.unwrap_or(1));

    let projection = SkyProjection::new(
        center,
        (-cell_x, cell_y),
        (0.5 * (nx - 1) as f64, 0.5 * (ny - 1) as f64),
    )?;

    Ok(MapGeometry {
        nx,
        ny,
        cell_x,
        cell_y,
        center,
        projection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCMIN: f64 = PI / 10800.0;

    fn extent() -> SkyExtent {
        // 19.5 x 9.5 arcmin patch around (1.0, 0.0).
        SkyExtent {
            xmin: 1.0 - 9.75 * ARCMIN,
            xmax: 1.0 + 9.75 * ARCMIN,
            ymin: -4.75 * ARCMIN,
            ymax: 4.75 * ARCMIN,
        }
    }

    #[test]
    fn test_center_defaults_to_extent_midpoint() {
        let geom = resolve_geometry(&MapSpec::default(), Some(&extent())).unwrap();
        assert!((geom.center.0 - 1.0).abs() < 1e-12);
        assert!(geom.center.1.abs() < 1e-12);
    }

    #[test]
    fn test_everything_unset_uses_arcmin_cells() {
        let geom = resolve_geometry(&MapSpec::default(), Some(&extent())).unwrap();
        assert!((geom.cell_x - ARCMIN).abs() < 1e-15);
        assert!((geom.cell_y - ARCMIN).abs() < 1e-15);
        // 19.5 arcmin of RA at dec 0 with 1 arcmin cells.
        assert_eq!(geom.nx, 20);
        assert_eq!(geom.ny, 10);
    }

    #[test]
    fn test_cells_derived_from_pixel_counts() {
        let spec = MapSpec {
            nx: Some(11),
            ny: Some(11),
            ..MapSpec::default()
        };
        let geom = resolve_geometry(&spec, Some(&extent())).unwrap();
        // wx = 19.5 arcmin over 10 intervals at dec 0.
        assert!((geom.cell_x - 1.95 * ARCMIN).abs() < 1e-14);
        assert!((geom.cell_y - 0.95 * ARCMIN).abs() < 1e-14);
    }

    #[test]
    fn test_single_pixel_count_mirrors() {
        let spec = MapSpec {
            nx: Some(7),
            ..MapSpec::default()
        };
        let geom = resolve_geometry(&spec, Some(&extent())).unwrap();
        assert_eq!(geom.nx, 7);
        assert_eq!(geom.ny, 7);
    }

    #[test]
    fn test_single_pointing_gets_default_extent() {
        let extent = SkyExtent::from_directions(&[[1.0, 0.5]]).unwrap();
        let spec = MapSpec {
            nx: Some(1),
            ny: Some(1),
            ..MapSpec::default()
        };
        let geom = resolve_geometry(&spec, Some(&extent)).unwrap();
        assert!((geom.cell_y - 1.1 * DEFAULT_EXTENT).abs() < 1e-12);
        assert!(geom.cell_x > 0.0);
    }

    #[test]
    fn test_user_center_rotated_onto_data_branch() {
        // Data near RA = 2π - ε, user center given just above zero.
        let directions: Vec<[f64; 2]> = (0..5)
            .map(|i| [2.0 * PI - 0.01 + 0.001 * i as f64, 0.0])
            .collect();
        let extent = SkyExtent::from_directions(&directions).unwrap();
        let spec = MapSpec {
            center: Some((0.02, 0.0)),
            ..MapSpec::default()
        };
        let geom = resolve_geometry(&spec, Some(&extent)).unwrap();
        assert!((geom.center.0 - (0.02 + 2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_fully_specified_needs_no_extent() {
        let spec = MapSpec {
            nx: Some(4),
            ny: Some(4),
            cell_x: Some(ARCMIN),
            cell_y: Some(ARCMIN),
            center: Some((1.0, 0.5)),
        };
        let geom = resolve_geometry(&spec, None).unwrap();
        assert_eq!(geom.nx, 4);
        assert!((geom.projection.ref_x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_underspecified_without_extent_errors() {
        let result = resolve_geometry(&MapSpec::default(), None);
        assert!(matches!(result, Err(GridderError::InvalidGeometry(_))));
    }

    #[test]
    fn test_extent_merge_and_seam_unwrap() {
        let mut a = SkyExtent::from_directions(&[[0.1, 0.0], [2.0 * PI - 0.1, 0.1]]).unwrap();
        // Seam-crossing pointings collapse onto one branch.
        assert!(a.xmax - a.xmin < 0.3);
        let b = SkyExtent::from_directions(&[[2.0 * PI - 0.2, -0.2]]).unwrap();
        a.merge(&b);
        assert!((a.xmin - (2.0 * PI - 0.2)).abs() < 1e-12);
        assert!((a.ymin + 0.2).abs() < 1e-12);
    }
}
