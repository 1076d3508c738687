//! Small-distance geometry used by the analysis pipeline. The thresholds
//! elsewhere in the crate are tuned against these formulas.

use geo::{coord, Intersects, Rect};
use serde::Serialize;

/// Radius of the earth used by [`distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.3;

/// Used to convert metres into degrees of latitude. Degrees of longitude
/// additionally scale by cos(lat).
pub const METRES_PER_DEGREE: f64 = 111111.0;

/// Below this many seconds a speed is reported as zero.
const MIN_SPEED_SECONDS: f64 = 0.000001;

/// Distance in km between two points, using the equirectangular
/// approximation (Pythagoras on a locally flat earth). Only valid
/// for short distances such as consecutive trackpoints.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let r_lat1 = lat1.to_radians();
    let r_lon1 = lon1.to_radians();
    let r_lat2 = lat2.to_radians();
    let r_lon2 = lon2.to_radians();

    let x = (r_lon2 - r_lon1) * ((r_lat1 + r_lat2) / 2.0).cos();
    let y = r_lat2 - r_lat1;
    (x * x + y * y).sqrt() * EARTH_RADIUS_KM
}

/// Initial bearing from the first point to the second, rounded to whole
/// degrees in the range [0, 360). 0 is north, 90 is east.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> i32 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    let degrees = y.atan2(x).to_degrees();

    (degrees.round() as i32).rem_euclid(360)
}

/// The smallest angle between two bearings, in the range [0, 180].
pub fn bearing_delta(x: i32, y: i32) -> i32 {
    let d = (y - x).abs() % 360;
    if d > 180 {
        360 - d
    } else {
        d
    }
}

/// Converts metres per second to km/h.
pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * 3.6
}

/// Calculates speed in km/h from km and seconds. Tiny (or zero)
/// intervals give a speed of 0 rather than infinity.
pub fn speed_kmh(km: f64, seconds: f64) -> f64 {
    let hours = seconds / 3600.0;
    if seconds < MIN_SPEED_SECONDS {
        return 0.0;
    }
    km / hours
}

/// A lat-lon bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// The minimum latitude.
    pub min_lat: f64,
    /// The minimum longitude.
    pub min_lon: f64,
    /// The maximum latitude.
    pub max_lat: f64,
    /// The maximum longitude.
    pub max_lon: f64,
}

impl Bounds {
    /// A zero-area box around a single point.
    pub fn from_point(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        }
    }

    /// Grows the box to include the point.
    pub fn extend(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lat = self.max_lat.max(lat);
        self.max_lon = self.max_lon.max(lon);
    }

    /// Returns the smallest box containing both boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lat: self.min_lat.min(other.min_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lat: self.max_lat.max(other.max_lat),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// The midpoint of the box as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// n.b. x=lon, y=lat.
    fn to_rect(self) -> Rect {
        Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        )
    }
}

/// Merges an optional running box with another box.
pub fn union_bounds(acc: Option<Bounds>, next: Option<Bounds>) -> Option<Bounds> {
    match (acc, next) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// A rough proximity test: grows `a` by `metres / 2` on every side and checks
/// whether it overlaps `b`. The metre to degree conversion uses the latitude
/// of the lower-left corner of `a`.
pub fn within(metres: f64, a: &Bounds, b: &Bounds) -> bool {
    let half = metres / 2.0;
    let lat_offset = half / METRES_PER_DEGREE;
    let lon_offset = half / (METRES_PER_DEGREE * a.min_lat.to_radians().cos());

    let grown = Bounds {
        min_lat: a.min_lat - lat_offset,
        min_lon: a.min_lon - lon_offset,
        max_lat: a.max_lat + lat_offset,
        max_lon: a.max_lon + lon_offset,
    };

    grown.to_rect().intersects(&b.to_rect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_bearing_known_values() {
        assert_eq!(bearing(40.73423, -73.989418, 40.734265, -73.989428), 348);
        assert_eq!(bearing(40.734265, -73.989428, 40.734229, -73.989418), 168);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert_eq!(bearing(51.0, 0.0, 51.001, 0.0), 0);
        assert_eq!(bearing(51.0, 0.0, 51.0, 0.001), 90);
        assert_eq!(bearing(51.0, 0.0, 50.999, 0.0), 180);
        assert_eq!(bearing(51.0, 0.0, 51.0, -0.001), 270);
    }

    #[test]
    fn test_bearing_always_in_range() {
        let coords = [-0.002, -0.0005, 0.0, 0.0007, 0.003];
        for dlat in coords {
            for dlon in coords {
                let b = bearing(45.0, 7.0, 45.0 + dlat, 7.0 + dlon);
                assert!((0..360).contains(&b), "{b} out of range");
            }
        }
    }

    #[test]
    fn test_bearing_delta_symmetric_and_bounded() {
        for a in (-720..=720).step_by(17) {
            for b in (0..360).step_by(13) {
                let d = bearing_delta(a, b);
                assert_eq!(d, bearing_delta(b, a));
                assert!((0..=180).contains(&d));
            }
        }
    }

    #[test]
    fn test_bearing_delta_wraps() {
        assert_eq!(bearing_delta(350, 10), 20);
        assert_eq!(bearing_delta(0, 180), 180);
        assert_eq!(bearing_delta(90, 90), 0);
        assert_eq!(bearing_delta(10, 300), 70);
    }

    #[test]
    fn test_distance_same_point() {
        assert_eq!(distance_km(51.5, -0.12, 51.5, -0.12), 0.0);
    }

    #[test]
    fn test_distance_one_thousandth_of_a_degree_north() {
        // 0.001 degrees of latitude on a 6371.3km sphere.
        let d = distance_km(51.5, -0.12, 51.501, -0.12);
        assert!(approx_eq(d, 0.1112, 0.0001), "{d}");
    }

    #[test]
    fn test_speed_kmh_zero_seconds() {
        assert_eq!(speed_kmh(1.0, 0.0), 0.0);
        assert!(approx_eq(speed_kmh(1.0, 3600.0), 1.0, 1e-9));
    }

    #[test]
    fn test_mps_to_kmh() {
        assert!(approx_eq(mps_to_kmh(10.0), 36.0, 1e-9));
    }

    #[test]
    fn test_bounds_extend_and_center() {
        let mut b = Bounds::from_point(51.50, -0.10);
        b.extend(51.52, -0.12);
        assert_eq!(b.min_lat, 51.50);
        assert_eq!(b.max_lat, 51.52);
        assert_eq!(b.min_lon, -0.12);
        assert_eq!(b.max_lon, -0.10);
        let (lat, lon) = b.center();
        assert!(approx_eq(lat, 51.51, 1e-9));
        assert!(approx_eq(lon, -0.11, 1e-9));
    }

    #[test]
    fn test_within_close_points() {
        // Roughly 2.2m apart.
        let a = Bounds::from_point(51.50000, -0.12);
        let b = Bounds::from_point(51.50002, -0.12);
        assert!(within(5.0, &a, &b));
    }

    #[test]
    fn test_within_far_points() {
        // Roughly 111m apart.
        let a = Bounds::from_point(51.500, -0.12);
        let b = Bounds::from_point(51.501, -0.12);
        assert!(!within(5.0, &a, &b));
    }

    #[test]
    fn test_union_bounds() {
        let a = Some(Bounds::from_point(1.0, 1.0));
        let b = Some(Bounds::from_point(2.0, -1.0));
        let u = union_bounds(a, b).unwrap();
        assert_eq!(u.min_lat, 1.0);
        assert_eq!(u.max_lat, 2.0);
        assert_eq!(u.min_lon, -1.0);
        assert_eq!(u.max_lon, 1.0);
        assert_eq!(union_bounds(None, None), None);
        assert_eq!(union_bounds(a, None), a);
    }
}
