use std::{fmt, str::FromStr};

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    formatting::format_utc_date,
    geometry::{bearing, distance_km, mps_to_kmh, speed_kmh},
};

/// Type of GPS fix. none means GPS had no fix. To signify "the fix info is
/// unknown", leave out fixType entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixType {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "2d")]
    TwoDimensional,
    #[serde(rename = "3d")]
    ThreeDimensional,
    #[serde(rename = "dgps")]
    DGPS,
    /// Indicates a military signal was used
    #[serde(rename = "pps")]
    PPS,
}

impl FromStr for FixType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(FixType::None),
            "2d" => Ok(FixType::TwoDimensional),
            "3d" => Ok(FixType::ThreeDimensional),
            "dgps" => Ok(FixType::DGPS),
            "pps" => Ok(FixType::PPS),
            _ => Err(format!("Unknown fix type '{s}'")),
        }
    }
}

impl fmt::Display for FixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FixType::None => "none",
            FixType::TwoDimensional => "2d",
            FixType::ThreeDimensional => "3d",
            FixType::DGPS => "dgps",
            FixType::PPS => "pps",
        };
        f.write_str(s)
    }
}

/// One raw timestamped position+speed record. Samples are never mutated
/// once created; the `with_*` methods are for construction only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Latitude in decimal degrees, WGS84.
    pub lat: f64,
    /// Longitude in decimal degrees, WGS84.
    pub lon: f64,
    /// Elevation in metres.
    pub ele: f64,
    /// UTC timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Course over ground, in degrees.
    pub course: f64,
    /// Speed reported by the device, in metres per second.
    pub speed: f64,
    /// The same speed in km/h.
    pub speed_kmh: f64,
    /// Type of GPS fix, if the device reported one.
    pub fix: Option<FixType>,
    /// Horizontal dilution of precision.
    pub hdop: Option<f64>,
    /// Position dilution of precision.
    pub pdop: Option<f64>,
    /// Vertical dilution of precision. Not used by the analysis.
    pub vdop: Option<f64>,
}

impl Sample {
    /// Creates a stationary sample with no quality indicators.
    pub fn new(lat: f64, lon: f64, time: OffsetDateTime) -> Self {
        Self {
            lat,
            lon,
            ele: 0.0,
            time,
            course: 0.0,
            speed: 0.0,
            speed_kmh: 0.0,
            fix: None,
            hdop: None,
            pdop: None,
            vdop: None,
        }
    }

    pub fn with_elevation(mut self, ele: f64) -> Self {
        self.ele = ele;
        self
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = course;
        self
    }

    /// Sets the reported speed, in metres per second.
    pub fn with_speed(mut self, mps: f64) -> Self {
        self.speed = mps;
        self.speed_kmh = mps_to_kmh(mps);
        self
    }

    pub fn with_fix(mut self, fix: FixType) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn with_hdop(mut self, hdop: f64) -> Self {
        self.hdop = Some(hdop);
        self
    }

    pub fn with_pdop(mut self, pdop: f64) -> Self {
        self.pdop = Some(pdop);
        self
    }

    pub fn with_vdop(mut self, vdop: f64) -> Self {
        self.vdop = Some(vdop);
        self
    }

    /// A missing fix is assumed to be good. No fix, or only a 2D fix, is bad.
    pub fn has_good_fix(&self) -> bool {
        !matches!(self.fix, Some(FixType::None) | Some(FixType::TwoDimensional))
    }

    /// Missing DOP values count as perfect.
    pub fn has_good_dop(&self, max_dop: f64) -> bool {
        self.hdop.unwrap_or_default() <= max_dop && self.pdop.unwrap_or_default() <= max_dop
    }

    /// Distance to `other` in km.
    pub fn distance_km(&self, other: &Sample) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }

    /// Bearing from this sample to `other`, in whole degrees.
    pub fn bearing_to(&self, other: &Sample) -> i32 {
        bearing(self.lat, self.lon, other.lat, other.lon)
    }

    /// Number of seconds between two samples, independent of which is earlier.
    pub fn seconds_between(&self, other: &Sample) -> f64 {
        (self.time - other.time).abs().as_seconds_f64()
    }

    /// The speed, in km/h, needed to travel between the two samples.
    pub fn speed_kmh_between(&self, other: &Sample) -> f64 {
        speed_kmh(self.distance_km(other), self.seconds_between(other))
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, speed: {:.2} m/s, @{}",
            self.lat,
            self.lon,
            self.speed,
            format_utc_date(&self.time)
        )
    }
}

/// The per-point classification made by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    PoorQuality,
    Moving,
    Stopped,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::PoorQuality => write!(f, "poorQuality"),
            Category::Moving => write!(f, "moving"),
            Category::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a sample was left out of the runs and stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscardReason {
    BadFix,
    PoorDop,
    /// Good fix and DOP, but part of a position jump.
    Glitch,
}

/// A Sample plus the fields derived by the classifier. The classifier
/// measures `delta_km` and `delta_seconds` from the last good sample; they
/// are relinked, along with `bearing`, once poor-quality samples have been
/// taken out (see [`crate::classify::link_samples`]).
#[derive(Debug, Clone)]
pub struct ClassifiedSample {
    pub sample: Sample,
    pub category: Category,
    /// Only set when `category` is PoorQuality.
    pub discard_reason: Option<DiscardReason>,
    /// Bearing from the previous sample. The first sample borrows the
    /// bearing of the second.
    pub bearing: i32,
    /// Mean reported speed over the trailing window, m/s. None if the
    /// window could not be filled.
    pub average_speed: Option<f64>,
    /// Speed calculated from the distance and time to the previous sample.
    pub calculated_speed_kmh: f64,
    pub delta_km: f64,
    pub delta_seconds: f64,
}

impl ClassifiedSample {
    pub fn new(sample: Sample, category: Category) -> Self {
        Self {
            sample,
            category,
            discard_reason: None,
            bearing: 0,
            average_speed: None,
            calculated_speed_kmh: 0.0,
            delta_km: 0.0,
            delta_seconds: 0.0,
        }
    }

    pub fn poor_quality(sample: Sample, reason: DiscardReason) -> Self {
        let mut cs = Self::new(sample, Category::PoorQuality);
        cs.discard_reason = Some(reason);
        cs
    }

    pub fn is_poor_quality(&self) -> bool {
        self.category == Category::PoorQuality
    }
}

/// A sample that was dropped, and why.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardedSample {
    pub sample: Sample,
    pub reason: DiscardReason,
}

impl From<ClassifiedSample> for DiscardedSample {
    fn from(value: ClassifiedSample) -> Self {
        let reason = match value.discard_reason {
            Some(reason) => reason,
            None if !value.sample.has_good_fix() => DiscardReason::BadFix,
            None => DiscardReason::PoorDop,
        };

        Self {
            sample: value.sample,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_fix_type_from_str() {
        assert_eq!("2d".parse::<FixType>(), Ok(FixType::TwoDimensional));
        assert_eq!("dgps".parse::<FixType>(), Ok(FixType::DGPS));
        assert!("4d".parse::<FixType>().is_err());
    }

    #[test]
    fn test_fix_type_display_parses_back() {
        for fix in [FixType::None, FixType::TwoDimensional, FixType::ThreeDimensional, FixType::DGPS, FixType::PPS] {
            assert_eq!(fix.to_string().parse::<FixType>(), Ok(fix));
        }
    }

    #[test]
    fn test_good_fix() {
        let s = Sample::new(1.0, 1.0, datetime!(2024-06-01 10:00:00 UTC));
        assert!(s.has_good_fix());
        assert!(s.clone().with_fix(FixType::ThreeDimensional).has_good_fix());
        assert!(!s.clone().with_fix(FixType::TwoDimensional).has_good_fix());
        assert!(!s.with_fix(FixType::None).has_good_fix());
    }

    #[test]
    fn test_good_dop() {
        let s = Sample::new(1.0, 1.0, datetime!(2024-06-01 10:00:00 UTC));
        assert!(s.has_good_dop(3.0));
        assert!(s.clone().with_hdop(3.0).has_good_dop(3.0));
        assert!(!s.clone().with_hdop(3.1).has_good_dop(3.0));
        assert!(!s.with_pdop(8.0).has_good_dop(3.0));
    }

    #[test]
    fn test_seconds_between_is_order_independent() {
        let a = Sample::new(1.0, 1.0, datetime!(2024-06-01 10:00:00 UTC));
        let b = Sample::new(1.0, 1.0, datetime!(2024-06-01 10:00:42 UTC));
        assert_eq!(a.seconds_between(&b), 42.0);
        assert_eq!(b.seconds_between(&a), 42.0);
    }

    #[test]
    fn test_with_speed_sets_kmh() {
        let s = Sample::new(1.0, 1.0, datetime!(2024-06-01 10:00:00 UTC)).with_speed(10.0);
        assert_eq!(s.speed, 10.0);
        assert!((s.speed_kmh - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_discard_reason_derived_when_missing() {
        let t = datetime!(2024-06-01 10:00:00 UTC);
        let bad_fix = ClassifiedSample::new(
            Sample::new(1.0, 1.0, t).with_fix(FixType::TwoDimensional),
            Category::PoorQuality,
        );
        assert_eq!(DiscardedSample::from(bad_fix).reason, DiscardReason::BadFix);

        let bad_dop =
            ClassifiedSample::new(Sample::new(1.0, 1.0, t).with_hdop(9.0), Category::PoorQuality);
        assert_eq!(DiscardedSample::from(bad_dop).reason, DiscardReason::PoorDop);

        let glitch = ClassifiedSample::poor_quality(Sample::new(1.0, 1.0, t), DiscardReason::Glitch);
        assert_eq!(DiscardedSample::from(glitch).reason, DiscardReason::Glitch);
    }
}
