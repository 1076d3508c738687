use std::f64::consts::PI;

use time::{macros::datetime, Duration, OffsetDateTime};

use crate::{geometry::EARTH_RADIUS_KM, model::Sample};

pub(crate) const BASE_LAT: f64 = 51.5;
pub(crate) const BASE_LON: f64 = -0.12;
pub(crate) const T0: OffsetDateTime = datetime!(2024-06-01 09:00:00 UTC);

/// Degrees of latitude that come out as exactly `metres` from `distance_km`.
pub(crate) fn metres_to_lat(metres: f64) -> f64 {
    metres / (EARTH_RADIUS_KM * 1000.0 * PI / 180.0)
}

pub(crate) fn at(seconds: f64) -> OffsetDateTime {
    T0 + Duration::seconds_f64(seconds)
}

/// Degrees of longitude that come out as roughly `metres` near the base point.
pub(crate) fn metres_to_lon(metres: f64) -> f64 {
    metres_to_lat(metres) / BASE_LAT.to_radians().cos()
}

/// A sample `seconds` after T0, `metres` due north of the base point.
pub(crate) fn sample_at(seconds: f64, metres: f64, speed_mps: f64) -> Sample {
    Sample::new(BASE_LAT + metres_to_lat(metres), BASE_LON, at(seconds)).with_speed(speed_mps)
}

/// A sample `seconds` after T0, offset north and east of the base point.
pub(crate) fn sample_ne(seconds: f64, north: f64, east: f64, speed_mps: f64) -> Sample {
    Sample::new(
        BASE_LAT + metres_to_lat(north),
        BASE_LON + metres_to_lon(east),
        at(seconds),
    )
    .with_speed(speed_mps)
}

/// `count` samples heading north at a constant speed.
pub(crate) fn walk(
    start_seconds: f64,
    start_metres: f64,
    interval_seconds: f64,
    speed_mps: f64,
    count: usize,
) -> Vec<Sample> {
    (0..count)
        .map(|i| {
            let elapsed = i as f64 * interval_seconds;
            sample_at(
                start_seconds + elapsed,
                start_metres + elapsed * speed_mps,
                speed_mps,
            )
        })
        .collect()
}
