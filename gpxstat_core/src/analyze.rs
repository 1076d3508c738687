use log::{debug, info};
use logging_timer::time;

use crate::{
    builder::{build, SegmentResult},
    classify::{classify, link_samples},
    consolidate::{consolidate_runs, consolidate_stops},
    model::{DiscardedSample, Sample},
    parameters::AnalysisParameters,
    summary::{ActivitySummary, TrackSummary},
    vector::reduce_noise,
};

/// Analyzes every track of an input. Each track is a list of segments,
/// each segment a time-ordered list of samples. Tracks that end up with no
/// runs and no stops are left out of the result.
#[time]
pub fn analyze(
    tracks: &[Vec<Vec<Sample>>],
    time_zone: Option<&str>,
    params: &AnalysisParameters,
) -> ActivitySummary {
    let mut summaries = Vec::with_capacity(tracks.len());

    for (idx, segments) in tracks.iter().enumerate() {
        let track = analyze_track(segments, time_zone, params);
        if track.is_empty() {
            debug!("Removed track {idx}, it has no runs or stops");
            continue;
        }

        info!(
            "Track {idx}: {} runs, {} stops, {} discarded samples, {:.2} km",
            track.runs.len(),
            track.stops.len(),
            track.discarded.len(),
            track.kilometers
        );
        summaries.push(track);
    }

    ActivitySummary::new(summaries)
}

/// Builds each segment separately, then consolidates them together.
pub fn analyze_track(
    segments: &[Vec<Sample>],
    time_zone: Option<&str>,
    params: &AnalysisParameters,
) -> TrackSummary {
    let mut combined = SegmentResult::default();
    for samples in segments {
        combined.append(analyze_segment(samples, params));
    }

    let runs = consolidate_runs(combined.runs);
    let stops = consolidate_stops(combined.stops, params);
    TrackSummary::new(runs, stops, combined.discarded, time_zone.map(String::from))
}

/// Classifies, cleans and builds a single segment.
pub fn analyze_segment(samples: &[Sample], params: &AnalysisParameters) -> SegmentResult {
    let (poor, mut good): (Vec<_>, Vec<_>) = classify(samples, params)
        .into_iter()
        .partition(|cs| cs.is_poor_quality());

    link_samples(&mut good);
    let cleaned = reduce_noise(good);

    let mut result = build(cleaned, params);
    let mut discarded: Vec<DiscardedSample> = poor.into_iter().map(DiscardedSample::from).collect();
    discarded.append(&mut result.discarded);
    result.discarded = discarded;
    result
}
