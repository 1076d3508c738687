use serde::Serialize;

use crate::{
    geometry::{speed_kmh, union_bounds, Bounds},
    model::DiscardedSample,
    run::Run,
    stop::Stop,
};

/// The version of the serialized summary format.
pub const SCHEMA_VERSION: u32 = 1;

/// The consolidated result for one track.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub runs: Vec<Run>,
    pub stops: Vec<Stop>,
    pub discarded: Vec<DiscardedSample>,
    /// Totals over the runs.
    pub kilometers: f64,
    pub seconds: f64,
    pub average_speed_kmh: f64,
    /// The box around all the runs, None if there are none.
    pub bounds: Option<Bounds>,
    pub time_zone: Option<String>,
}

impl TrackSummary {
    pub fn new(
        runs: Vec<Run>,
        stops: Vec<Stop>,
        discarded: Vec<DiscardedSample>,
        time_zone: Option<String>,
    ) -> Self {
        let kilometers = runs.iter().map(|r| r.kilometers).sum();
        let seconds = runs.iter().map(|r| r.seconds).sum();
        let bounds = runs.iter().fold(None, |acc, r| union_bounds(acc, r.bounds));

        Self {
            average_speed_kmh: speed_kmh(kilometers, seconds),
            runs,
            stops,
            discarded,
            kilometers,
            seconds,
            bounds,
            time_zone,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() && self.stops.is_empty()
    }
}

/// Everything derived from one input file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub schema_version: u32,
    pub tracks: Vec<TrackSummary>,
    pub bounds: Option<Bounds>,
}

impl ActivitySummary {
    pub fn new(tracks: Vec<TrackSummary>) -> Self {
        let bounds = tracks.iter().fold(None, |acc, t| union_bounds(acc, t.bounds));

        Self {
            schema_version: SCHEMA_VERSION,
            tracks,
            bounds,
        }
    }

    pub fn kilometers(&self) -> f64 {
        self.tracks.iter().map(|t| t.kilometers).sum()
    }

    pub fn seconds(&self) -> f64 {
        self.tracks.iter().map(|t| t.seconds).sum()
    }
}
