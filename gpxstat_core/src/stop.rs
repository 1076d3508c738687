use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    formatting::{format_seconds, format_utc_date},
    geometry::Bounds,
    model::Sample,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopStyle {
    /// A short rest.
    Paused,
    /// A rest of at least the minimum stop duration.
    Stopped,
}

impl StopStyle {
    pub fn for_duration(duration_seconds: f64, min_stop_duration_seconds: f64) -> Self {
        if duration_seconds < min_stop_duration_seconds {
            StopStyle::Paused
        } else {
            StopStyle::Stopped
        }
    }
}

impl fmt::Display for StopStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopStyle::Paused => write!(f, "paused"),
            StopStyle::Stopped => write!(f, "stopped"),
        }
    }
}

/// A period of rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub style: StopStyle,
    /// The centre of the stop. For a stop built from samples this is the
    /// average of their coordinates; for a merged stop it is the middle of
    /// the merged bounds.
    pub lat: f64,
    pub lon: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub duration_seconds: f64,
    pub bounds: Bounds,
    /// Path distance covered while stopped (GPS wander).
    pub distance_km: f64,
    pub point_count: usize,
}

impl Stop {
    /// Builds a stop from its samples, or None if there are none.
    pub fn from_samples(samples: &[Sample], min_stop_duration_seconds: f64) -> Option<Self> {
        let first = samples.first()?;
        let last = samples.last()?;

        let mut bounds = Bounds::from_point(first.lat, first.lon);
        for s in samples {
            bounds.extend(s.lat, s.lon);
        }

        let count = samples.len() as f64;
        let lat = samples.iter().map(|s| s.lat).sum::<f64>() / count;
        let lon = samples.iter().map(|s| s.lon).sum::<f64>() / count;
        let duration_seconds = first.seconds_between(last);
        let distance_km = samples.windows(2).map(|w| w[0].distance_km(&w[1])).sum();

        Some(Self {
            style: StopStyle::for_duration(duration_seconds, min_stop_duration_seconds),
            lat,
            lon,
            start_time: first.time,
            end_time: last.time,
            duration_seconds,
            bounds,
            distance_km,
            point_count: samples.len(),
        })
    }

    /// Combines two stops into one covering both. The style is recalculated
    /// from the combined duration.
    pub fn merge(&self, other: &Stop, min_stop_duration_seconds: f64) -> Stop {
        let start_time = self.start_time.min(other.start_time);
        let end_time = self.end_time.max(other.end_time);
        let duration_seconds = (end_time - start_time).as_seconds_f64();
        let bounds = self.bounds.union(&other.bounds);
        let (lat, lon) = bounds.center();

        Stop {
            style: StopStyle::for_duration(duration_seconds, min_stop_duration_seconds),
            lat,
            lon,
            start_time,
            end_time,
            duration_seconds,
            bounds,
            distance_km: self.distance_km + other.distance_km,
            point_count: self.point_count + other.point_count,
        }
    }

    /// True if the time range of `other` lies within this one (inclusive).
    pub fn contains(&self, other: &Stop) -> bool {
        self.start_time <= other.start_time && other.end_time <= self.end_time
    }

    /// Seconds between the nearer edges of the two time ranges; 0 if they
    /// overlap.
    pub fn gap_seconds(&self, other: &Stop) -> f64 {
        let later_start = self.start_time.max(other.start_time);
        let earlier_end = self.end_time.min(other.end_time);
        (later_start - earlier_end).as_seconds_f64().max(0.0)
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{:.6}, {:.6} for {}, starting at {}",
            self.style,
            self.lat,
            self.lon,
            format_seconds(self.duration_seconds),
            format_utc_date(&self.start_time)
        )
    }
}
