//! The first pass over a segment: flags every sample as poor quality,
//! moving or stopped.
//!
//! Poor quality is either a bad fix / DOP reported by the device, or a
//! "glitch": a sample whose position implies a speed wildly different from
//! the speed the device itself reported (typically when coming out of a
//! tunnel). Glitches are excised as a block, up to the point where the
//! track comes back to the position before the jump. A jump that never
//! comes back is a real change of position and is kept.

use log::debug;
use logging_timer::time;

use crate::{
    formatting::format_utc_date,
    model::{Category, ClassifiedSample, DiscardReason, Sample},
    parameters::AnalysisParameters,
};

/// A glitch is only considered if either speed is above this.
pub const GLITCH_MIN_SPEED_KMH: f64 = 10.0;

/// The ratio between calculated and reported speed that marks a glitch.
pub const GLITCH_SPEED_RATIO: f64 = 20.0;

/// Position jumps shorter than this are never glitches.
pub const GLITCH_MIN_KM: f64 = 0.040;

/// The track has recovered from a glitch when it comes back this close
/// to the last good sample.
pub const GLITCH_RECOVERY_KM: f64 = 0.020;

/// How far ahead of a jump to look for the recovery point.
pub const GLITCH_LOOKAHEAD_SECONDS: f64 = 40.0;

/// Floor for the lower speed in the ratio, avoids dividing by zero.
const MIN_RATIO_SPEED_KMH: f64 = 0.1;

/// Classifies each sample, returning one ClassifiedSample per input sample
/// in the same order. Relative fields (delta distance, delta time and
/// calculated speed) are measured from the immediately preceding sample
/// that was kept. Samples dropped for a bad fix or DOP are skipped over,
/// so running the classifier again over its own good output sees the same
/// predecessors and finds no new glitches.
///
/// Bearings are not calculated here, see [`link_samples`].
#[time]
pub fn classify(samples: &[Sample], params: &AnalysisParameters) -> Vec<ClassifiedSample> {
    let mut classified = Vec::with_capacity(samples.len());
    let mut prev_kept: Option<usize> = None;
    let mut idx = 0;

    while idx < samples.len() {
        let sample = &samples[idx];

        if !sample.has_good_fix() {
            classified.push(ClassifiedSample::poor_quality(
                sample.clone(),
                DiscardReason::BadFix,
            ));
            idx += 1;
            continue;
        }

        if !sample.has_good_dop(params.max_dop) {
            classified.push(ClassifiedSample::poor_quality(
                sample.clone(),
                DiscardReason::PoorDop,
            ));
            idx += 1;
            continue;
        }

        let average_speed = trailing_average_speed(samples, idx, params.moving_window_seconds);
        let category = match average_speed {
            Some(avg) if avg < params.min_moving_speed_mps => Category::Stopped,
            // Not enough history to tell; assume we are moving.
            _ => Category::Moving,
        };

        let mut cs = ClassifiedSample::new(sample.clone(), category);
        cs.average_speed = average_speed;

        let Some(prev_idx) = prev_kept else {
            classified.push(cs);
            prev_kept = Some(idx);
            idx += 1;
            continue;
        };

        let prev = &samples[prev_idx];
        cs.delta_km = sample.distance_km(prev);
        cs.delta_seconds = sample.seconds_between(prev);
        cs.calculated_speed_kmh = sample.speed_kmh_between(prev);

        let recovery = if is_glitch(&cs) {
            find_recovery(samples, prev_idx, idx, params.max_dop)
        } else {
            None
        };

        let Some(recovery_idx) = recovery else {
            classified.push(cs);
            prev_kept = Some(idx);
            idx += 1;
            continue;
        };

        let last_bad = recovery_idx - 1;
        debug!(
            "Glitch at {} ({:.0}m jump, {:.1} km/h calculated vs {:.1} km/h reported), excising {} samples",
            format_utc_date(&sample.time),
            cs.delta_km * 1000.0,
            cs.calculated_speed_kmh,
            sample.speed_kmh,
            last_bad - idx + 1
        );

        cs.category = Category::PoorQuality;
        cs.discard_reason = Some(DiscardReason::Glitch);
        classified.push(cs);

        for bad in &samples[idx + 1..=last_bad] {
            let reason = if !bad.has_good_fix() {
                DiscardReason::BadFix
            } else if !bad.has_good_dop(params.max_dop) {
                DiscardReason::PoorDop
            } else {
                DiscardReason::Glitch
            };
            classified.push(ClassifiedSample::poor_quality(bad.clone(), reason));
        }

        idx = last_bad + 1;
    }

    assert_eq!(classified.len(), samples.len());
    classified
}

/// Fills in bearing, delta distance and delta time of each sample relative
/// to its predecessor in `samples`. Call this after poor quality samples
/// have been removed. The first sample borrows the bearing of the second.
pub fn link_samples(samples: &mut [ClassifiedSample]) {
    for idx in 1..samples.len() {
        let (before, after) = samples.split_at_mut(idx);
        let prev = &before[idx - 1].sample;
        let cur = &mut after[0];
        cur.bearing = prev.bearing_to(&cur.sample);
        cur.delta_km = cur.sample.distance_km(prev);
        cur.delta_seconds = cur.sample.seconds_between(prev);
        cur.calculated_speed_kmh = cur.sample.speed_kmh_between(prev);
    }

    if samples.len() > 1 {
        samples[0].bearing = samples[1].bearing;
        samples[0].delta_km = 0.0;
        samples[0].delta_seconds = 0.0;
        samples[0].calculated_speed_kmh = 0.0;
    }
}

/// Compares the calculated speed with the reported speed.
fn is_glitch(cs: &ClassifiedSample) -> bool {
    let calculated = cs.calculated_speed_kmh;
    let reported = cs.sample.speed_kmh;

    if calculated <= GLITCH_MIN_SPEED_KMH && reported <= GLITCH_MIN_SPEED_KMH {
        return false;
    }

    if cs.delta_km <= GLITCH_MIN_KM {
        return false;
    }

    let lower = calculated.min(reported).max(MIN_RATIO_SPEED_KMH);
    let higher = calculated.max(reported);
    higher / lower > GLITCH_SPEED_RATIO
}

/// Scans forward from the first bad sample for the first good quality
/// sample that is back near the sample before the jump. Returns None if the
/// track does not come back within the lookahead, which is measured in
/// seconds from the first bad sample.
fn find_recovery(
    samples: &[Sample],
    anchor_idx: usize,
    first_bad_idx: usize,
    max_dop: f64,
) -> Option<usize> {
    let anchor = &samples[anchor_idx];
    let first_bad = &samples[first_bad_idx];

    samples
        .iter()
        .enumerate()
        .skip(first_bad_idx + 1)
        .take_while(|(_, s)| first_bad.seconds_between(s) <= GLITCH_LOOKAHEAD_SECONDS)
        .filter(|(_, s)| s.has_good_fix() && s.has_good_dop(max_dop))
        .find(|(_, s)| s.distance_km(anchor) < GLITCH_RECOVERY_KM)
        .map(|(idx, _)| idx)
}

/// Calculates the mean reported speed from `idx` back over the window.
/// Returns None if there are not enough samples to fill the window.
fn trailing_average_speed(samples: &[Sample], idx: usize, window_seconds: f64) -> Option<f64> {
    let current = &samples[idx];
    let mut sum = 0.0;
    let mut count = 0;

    for s in samples[..=idx].iter().rev() {
        sum += s.speed;
        count += 1;
        if current.seconds_between(s) >= window_seconds {
            return Some(sum / count as f64);
        }
    }

    None
}
