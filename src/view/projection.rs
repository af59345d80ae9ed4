//! Spherical Mercator projection in map pixels.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Latitude at which the square Mercator world ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    center: [f64; 2],
}

impl Mercator {
    pub fn new(scale: f64, center: [f64; 2]) -> Self {
        Self { scale, center }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// `(lon, lat)` in degrees to map pixels.
    pub fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let lambda = lon.to_radians();
        let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        [
            self.center[0] + self.scale * lambda,
            self.center[1] - self.scale * (FRAC_PI_4 + phi / 2.0).tan().ln(),
        ]
    }

    /// Map pixels back to `(lon, lat)` in degrees.
    pub fn invert(&self, point: [f64; 2]) -> (f64, f64) {
        let lambda = (point[0] - self.center[0]) / self.scale;
        let y = (self.center[1] - point[1]) / self.scale;
        let phi = 2.0 * y.exp().atan() - FRAC_PI_2;
        (lambda.to_degrees(), phi.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn origin_maps_to_center() {
        let m = Mercator::new(2500.0 / 14.0, [1250.0, 550.0]);
        assert_eq!(m.project(0.0, 0.0), [1250.0, 550.0]);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let m = Mercator::new(100.0, [0.0, 0.0]);
        let [x, y] = m.project(90.0, 45.0);
        assert!(close(x, 100.0 * std::f64::consts::FRAC_PI_2));
        assert!(y < 0.0);
    }

    #[test]
    fn invert_undoes_project() {
        let m = Mercator::new(178.5, [1250.0, 550.0]);
        for &(lon, lat) in &[(0.0, 0.0), (121.5, 25.0), (-70.2, -33.4), (10.0, 80.0)] {
            let (lon2, lat2) = m.invert(m.project(lon, lat));
            assert!(close(lon, lon2) && close(lat, lat2), "{lon},{lat} -> {lon2},{lat2}");
        }
    }
}
