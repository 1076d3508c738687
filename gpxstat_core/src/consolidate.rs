//! The second pass over the runs and stops of a whole track, after the
//! results of all its segments have been concatenated.

use log::debug;
use logging_timer::time;

use crate::{
    geometry::within,
    parameters::AnalysisParameters,
    run::{Run, RunStyle},
    stop::Stop,
    transportation::assign_transportation,
};

/// Adjacent runs of the same style closer than this are merged.
pub const RUN_MERGE_GAP_SECONDS: f64 = 5.0;

/// Track runs shorter than this are dropped.
pub const MIN_RUN_SECONDS: f64 = 20.0;

/// Track runs covering less distance than this are dropped.
pub const MIN_RUN_KM: f64 = 0.020;

/// Merges close runs, drops short track runs and trailing virtual runs,
/// then fills in each run's offset into the track and its transportation.
#[time]
pub fn consolidate_runs(runs: Vec<Run>) -> Vec<Run> {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|r| !r.is_empty()) {
        if let Some(prev) = merged.last_mut() {
            let close = prev
                .seconds_until(&run)
                .is_some_and(|gap| gap < RUN_MERGE_GAP_SECONDS);

            if prev.style == run.style && close {
                // Re-add so the aggregates are rebuilt from the points.
                for point in run.points {
                    prev.add(point.sample);
                }
                continue;
            }
        }

        merged.push(run);
    }

    let mut runs: Vec<Run> = merged
        .into_iter()
        .filter(|r| {
            let keep = r.style != RunStyle::Track
                || (r.seconds >= MIN_RUN_SECONDS && r.kilometers >= MIN_RUN_KM);
            if !keep {
                debug!("Dropping short run: {r}");
            }
            keep
        })
        .collect();

    while runs.last().is_some_and(|r| r.style != RunStyle::Track) {
        if let Some(r) = runs.pop() {
            debug!("Removing trailing {r}");
        }
    }

    let Some(track_start) = runs.first().and_then(|r| r.first()).cloned() else {
        return runs;
    };

    let mut offset_km = 0.0;
    for run in &mut runs {
        run.track_offset_seconds = run
            .first()
            .map(|s| track_start.seconds_between(s))
            .unwrap_or_default();
        run.track_offset_kilometers = offset_km;
        offset_km += run.kilometers;
        assign_transportation(run);
    }

    runs
}

/// Repeatedly merges pairs of stops that overlap in time or are close
/// together, as long as they are not too far apart in time, until no pair
/// can be merged. Each pass merges at most one pair, so the number of
/// stops strictly decreases until the loop ends.
#[time]
pub fn consolidate_stops(mut stops: Vec<Stop>, params: &AnalysisParameters) -> Vec<Stop> {
    while let Some((keep, absorb)) = find_mergeable(&stops, params) {
        let merged = stops[keep].merge(&stops[absorb], params.min_stop_duration_seconds);
        debug!("Merging stop {} into {}", stops[absorb], stops[keep]);
        stops[keep] = merged;
        stops.remove(absorb);
    }

    stops
}

/// Scans from the last stop backwards, comparing each against every
/// earlier stop. Returns (earlier, later) for the first match.
fn find_mergeable(stops: &[Stop], params: &AnalysisParameters) -> Option<(usize, usize)> {
    for later in (1..stops.len()).rev() {
        for earlier in 0..later {
            if can_merge(&stops[earlier], &stops[later], params) {
                return Some((earlier, later));
            }
        }
    }

    None
}

fn can_merge(a: &Stop, b: &Stop, params: &AnalysisParameters) -> bool {
    let related = a.contains(b)
        || b.contains(a)
        || within(params.stop_merge_metres, &a.bounds, &b.bounds);

    related && a.gap_seconds(b) < params.max_stop_merge_gap_seconds
}
