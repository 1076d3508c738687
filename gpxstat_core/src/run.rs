use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    formatting::{format_seconds, format_utc_date},
    geometry::{speed_kmh, Bounds},
    model::Sample,
    transportation::TransportationGuess,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStyle {
    /// Real, continuous movement.
    Track,
    /// A synthetic bridge across a gap in the samples.
    Virtual,
}

impl fmt::Display for RunStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStyle::Track => write!(f, "track"),
            RunStyle::Virtual => write!(f, "virtual"),
        }
    }
}

/// A sample as it sits within a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPoint {
    pub sample: Sample,
    /// Bearing from the previous point, 0 for the first point.
    pub bearing: i32,
    pub kilometers_from_last: f64,
    pub kilometers_into_run: f64,
    pub seconds_into_run: f64,
    /// Speed calculated from the previous point.
    pub calculated_speed_kmh: f64,
    /// Mean reported speed of the last few points, filled in when the run's
    /// transportation is assigned.
    pub smoothed_speed_kmh: f64,
}

/// A stretch of movement. The aggregates are maintained by [`Run::add`] and
/// are always consistent with `points`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub style: RunStyle,
    pub points: Vec<RunPoint>,
    /// None until the first point is added.
    pub bounds: Option<Bounds>,
    /// Path distance, the sum of the point to point distances.
    pub kilometers: f64,
    /// Seconds from the first point to the last.
    pub seconds: f64,
    pub track_offset_seconds: f64,
    pub track_offset_kilometers: f64,
    /// Up to three guesses, most likely first.
    pub transportation: Vec<TransportationGuess>,
}

impl Run {
    pub fn new(style: RunStyle) -> Self {
        Self {
            style,
            points: Vec::new(),
            bounds: None,
            kilometers: 0.0,
            seconds: 0.0,
            track_offset_seconds: 0.0,
            track_offset_kilometers: 0.0,
            transportation: Vec::new(),
        }
    }

    /// Appends a sample and updates the aggregates.
    pub fn add(&mut self, sample: Sample) {
        let (km, seconds, bearing, calculated_speed_kmh) = match (self.first(), self.last()) {
            (Some(first), Some(last)) => {
                let km = last.distance_km(&sample);
                (
                    km,
                    first.seconds_between(&sample),
                    last.bearing_to(&sample),
                    speed_kmh(km, last.seconds_between(&sample)),
                )
            }
            _ => (0.0, 0.0, 0, 0.0),
        };

        self.kilometers += km;
        self.seconds = seconds;

        match self.bounds.as_mut() {
            Some(b) => b.extend(sample.lat, sample.lon),
            None => self.bounds = Some(Bounds::from_point(sample.lat, sample.lon)),
        }

        self.points.push(RunPoint {
            sample,
            bearing,
            kilometers_from_last: km,
            kilometers_into_run: self.kilometers,
            seconds_into_run: seconds,
            calculated_speed_kmh,
            smoothed_speed_kmh: 0.0,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.points.first().map(|p| &p.sample)
    }

    pub fn last(&self) -> Option<&Sample> {
        self.points.last().map(|p| &p.sample)
    }

    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.first().map(|s| s.time)
    }

    pub fn end_time(&self) -> Option<OffsetDateTime> {
        self.last().map(|s| s.time)
    }

    pub fn average_speed_kmh(&self) -> f64 {
        speed_kmh(self.kilometers, self.seconds)
    }

    /// Seconds between the end of this run and the start of `next`.
    pub fn seconds_until(&self, next: &Run) -> Option<f64> {
        Some(self.last()?.seconds_between(next.first()?))
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start_time()
            .map(|t| format_utc_date(&t))
            .unwrap_or_default();

        write!(
            f,
            "{}: {} points, from {} for {} and {:.0} metres",
            self.style,
            self.len(),
            start,
            format_seconds(self.seconds),
            self.kilometers * 1000.0
        )
    }
}
