//! SIN (orthographic) sky projection.
//!
//! This is the projection conventionally used for single-dish maps: the
//! celestial sphere is projected onto the tangent plane at the map center
//! along the line of sight, giving direction cosines (l, m) that are then
//! scaled into pixel coordinates.
//!
//! Conventions match the usual FITS-style setup: the x cell size is negative
//! (right ascension increases to the left), the reference pixel sits at the
//! map center, and all angles are in radians.

use crate::ProjectionError;

/// SIN projection parameters.
#[derive(Debug, Clone)]
pub struct SkyProjection {
    /// Map center longitude (radians).
    pub lon0: f64,
    /// Map center latitude (radians).
    pub lat0: f64,
    /// Pixel increment along x (radians/pixel, typically negative).
    pub inc_x: f64,
    /// Pixel increment along y (radians/pixel).
    pub inc_y: f64,
    /// Reference pixel x coordinate (continuous).
    pub ref_x: f64,
    /// Reference pixel y coordinate (continuous).
    pub ref_y: f64,
    // Cached trig of the center latitude.
    sin_lat0: f64,
    cos_lat0: f64,
}

impl SkyProjection {
    /// Create a SIN projection.
    ///
    /// # Arguments
    /// * `center` - (longitude, latitude) of the map center in radians
    /// * `increment` - (x, y) cell sizes in radians/pixel; x is typically
    ///   negative so longitude increases leftward
    /// * `reference_pixel` - continuous pixel coordinate of the center
    pub fn new(
        center: (f64, f64),
        increment: (f64, f64),
        reference_pixel: (f64, f64),
    ) -> Result<Self, ProjectionError> {
        let (lon0, lat0) = center;
        let (inc_x, inc_y) = increment;
        if inc_x == 0.0 || inc_y == 0.0 || !inc_x.is_finite() || !inc_y.is_finite() {
            return Err(ProjectionError::DegenerateCell(inc_x, inc_y));
        }
        if !lon0.is_finite() || !lat0.is_finite() || lat0.abs() > std::f64::consts::FRAC_PI_2 {
            return Err(ProjectionError::InvalidCenter(lon0, lat0));
        }
        Ok(Self {
            lon0,
            lat0,
            inc_x,
            inc_y,
            ref_x: reference_pixel.0,
            ref_y: reference_pixel.1,
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
        })
    }

    /// Project a sky direction to a continuous pixel coordinate.
    ///
    /// Directions on the far hemisphere still produce a coordinate (the
    /// orthographic forward map is defined everywhere); callers gridding
    /// real pointings only ever see directions close to the map center.
    pub fn world_to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let dlon = lon - self.lon0;
        let (sin_lat, cos_lat) = (lat.sin(), lat.cos());
        let l = cos_lat * dlon.sin();
        let m = sin_lat * self.cos_lat0 - cos_lat * self.sin_lat0 * dlon.cos();
        (self.ref_x + l / self.inc_x, self.ref_y + m / self.inc_y)
    }

    /// Convert a continuous pixel coordinate back to a sky direction.
    ///
    /// Returns `None` for pixels that fall outside the projected hemisphere
    /// (direction cosines with l² + m² > 1).
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let l = (x - self.ref_x) * self.inc_x;
        let m = (y - self.ref_y) * self.inc_y;
        let r2 = l * l + m * m;
        if r2 > 1.0 {
            return None;
        }
        let cos_r = (1.0 - r2).sqrt();
        let lat = (cos_r * self.sin_lat0 + m * self.cos_lat0).asin();
        let lon = self.lon0 + l.atan2(cos_r * self.cos_lat0 - m * self.sin_lat0);
        Some((lon, lat))
    }

    /// Cell sizes as (|x|, |y|) in radians.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.inc_x.abs(), self.inc_y.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCMIN: f64 = std::f64::consts::PI / (180.0 * 60.0);

    fn projection() -> SkyProjection {
        // 1 arcmin cells, center pixel of a 21x21 map.
        SkyProjection::new((1.0, 0.5), (-ARCMIN, ARCMIN), (10.0, 10.0)).unwrap()
    }

    #[test]
    fn test_center_maps_to_reference_pixel() {
        let proj = projection();
        let (x, y) = proj.world_to_pixel(1.0, 0.5);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_near_center() {
        let proj = projection();
        for (dx, dy) in [(0.0, 0.0), (3.2, -1.5), (-7.0, 8.25)] {
            let (lon, lat) = proj.pixel_to_world(10.0 + dx, 10.0 + dy).unwrap();
            let (x, y) = proj.world_to_pixel(lon, lat);
            assert!((x - (10.0 + dx)).abs() < 1e-9);
            assert!((y - (10.0 + dy)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ra_increases_leftward() {
        let proj = projection();
        // A direction east of center (larger longitude) lands at smaller x.
        let (x, _) = proj.world_to_pixel(1.0 + 2.0 * ARCMIN, 0.5);
        assert!(x < 10.0);
        // One cell of latitude moves one pixel up.
        let (_, y) = proj.world_to_pixel(1.0, 0.5 + ARCMIN);
        assert!((y - 11.0).abs() < 1e-3);
    }

    #[test]
    fn test_pixel_outside_hemisphere() {
        let proj = projection();
        // ~2 radians worth of pixels from center is far outside the sphere.
        assert!(proj.pixel_to_world(10.0 + 2.0 / ARCMIN, 10.0).is_none());
    }

    #[test]
    fn test_rejects_zero_cell() {
        let result = SkyProjection::new((0.0, 0.0), (0.0, ARCMIN), (0.0, 0.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_polar_overflow_center() {
        let result = SkyProjection::new((0.0, 2.0), (-ARCMIN, ARCMIN), (0.0, 0.0));
        assert!(result.is_err());
    }
}
