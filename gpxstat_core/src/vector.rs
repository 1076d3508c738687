//! Suppresses bearing noise that the point by point classifier cannot see.
//!
//! The cleaned samples of a segment are cut into "vectors", stretches of
//! roughly constant bearing. Adjacent vectors that line up are merged back
//! together, then interior vectors that do not fit with their neighbours
//! are scored and removed one at a time.

use std::fmt;

use log::debug;
use logging_timer::time;

use crate::{
    formatting::format_utc_date,
    geometry::{bearing_delta, speed_kmh},
    model::{Category, ClassifiedSample, Sample},
};

/// A new vector is started when the bearing changes by more than this.
pub const MAX_VECTOR_ANGLE: i32 = 45;

/// Adjacent vectors closer than this in time may be merged.
pub const MAX_MERGE_SECONDS: f64 = 10.0;

/// Adjacent vectors closer than this in distance may be merged.
pub const MAX_MERGE_METRES: f64 = 10.0;

/// Interior vectors scoring above this are removed.
pub const REMOVE_VECTOR_SCORE_THRESHOLD: i32 = 150;

/// Vectors shorter than this are dropped at the end.
pub const MIN_VECTOR_KM: f64 = 0.001;

/// A stretch of samples sharing a roughly constant bearing. Never empty.
#[derive(Debug, Clone)]
pub struct Vector {
    pub samples: Vec<ClassifiedSample>,
    /// Bearing from the first sample to the last.
    pub bearing: i32,
    /// Sum of the distances between consecutive samples.
    pub distance_km: f64,
    pub seconds: f64,
    pub speed_kmh: f64,

    // Scratch state for the reduction pass.
    pub score: i32,
    pub prev_score: i32,
    pub cur_score: i32,
    pub next_score: i32,
}

impl Vector {
    fn new(samples: Vec<ClassifiedSample>) -> Self {
        assert!(!samples.is_empty(), "a vector needs at least one sample");

        let first = &samples[0].sample;
        let last = &samples[samples.len() - 1].sample;
        let bearing = first.bearing_to(last);
        let seconds = first.seconds_between(last);
        let distance_km = samples
            .windows(2)
            .map(|w| w[0].sample.distance_km(&w[1].sample))
            .sum();

        Self {
            bearing,
            seconds,
            distance_km,
            speed_kmh: speed_kmh(distance_km, seconds),
            score: 0,
            prev_score: 0,
            cur_score: 0,
            next_score: 0,
            samples,
        }
    }

    fn first(&self) -> &Sample {
        &self.samples[0].sample
    }

    fn last(&self) -> &Sample {
        &self.samples[self.samples.len() - 1].sample
    }

    /// Appends the samples of `other`, recalculating everything.
    fn join(self, other: Vector) -> Vector {
        let mut samples = self.samples;
        samples.extend(other.samples);
        Vector::new(samples)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} points, {} degrees, {:.0} seconds, {:.0} metres, starting at {}",
            self.samples.len(),
            self.bearing,
            self.seconds,
            self.distance_km * 1000.0,
            format_utc_date(&self.first().time)
        )
    }
}

/// Runs the vector analysis over each stretch of moving samples and
/// flattens the surviving vectors back into a single sample sequence, in
/// order. Stopped samples are passed through untouched; their bearings are
/// jitter.
pub fn reduce_noise(samples: Vec<ClassifiedSample>) -> Vec<ClassifiedSample> {
    let mut output = Vec::with_capacity(samples.len());
    let mut moving: Vec<ClassifiedSample> = Vec::new();

    for cs in samples {
        if cs.category == Category::Moving {
            moving.push(cs);
            continue;
        }

        if !moving.is_empty() {
            output.extend(flatten(calculate_vectors(std::mem::take(&mut moving))));
        }
        output.push(cs);
    }

    if !moving.is_empty() {
        output.extend(flatten(calculate_vectors(moving)));
    }

    output
}

fn flatten(vectors: Vec<Vector>) -> impl Iterator<Item = ClassifiedSample> {
    vectors.into_iter().flat_map(|v| v.samples)
}

/// Splits the samples into vectors, merges adjacent ones that line up,
/// removes the noisy ones and filters out the tiny ones. The bearings of
/// the samples must already be linked.
#[time]
pub fn calculate_vectors(samples: Vec<ClassifiedSample>) -> Vec<Vector> {
    let vectors = segment(samples);
    let segmented_count = vectors.len();

    let mut vectors = merge_adjacent(vectors);
    let merged_count = vectors.len();

    remove_noisy(&mut vectors);
    let reduced_count = vectors.len();

    // A lone vector is passed through untouched.
    if vectors.len() > 1 {
        vectors.retain(|v| v.distance_km > MIN_VECTOR_KM);
    }

    debug!(
        "Segmented into {segmented_count} vectors, merged to {merged_count}, reduced to {reduced_count} and filtered to {}",
        vectors.len()
    );

    vectors
}

/// Cuts the samples wherever the bearing jumps by more than the maximum
/// angle. Single-sample vectors in the middle are dropped; the trailing one
/// is always kept.
fn segment(samples: Vec<ClassifiedSample>) -> Vec<Vector> {
    let mut vectors = Vec::new();
    let mut current: Vec<ClassifiedSample> = Vec::new();

    for cs in samples {
        if let Some(last) = current.last() {
            if bearing_delta(cs.bearing, last.bearing) > MAX_VECTOR_ANGLE {
                if current.len() >= 2 {
                    vectors.push(Vector::new(std::mem::take(&mut current)));
                } else {
                    current.clear();
                }
            }
        }

        current.push(cs);
    }

    if !current.is_empty() {
        vectors.push(Vector::new(current));
    }

    vectors
}

fn merge_adjacent(vectors: Vec<Vector>) -> Vec<Vector> {
    let mut merged: Vec<Vector> = Vec::with_capacity(vectors.len());

    for cur in vectors {
        let Some(prev) = merged.last() else {
            merged.push(cur);
            continue;
        };

        let delta_bearing = bearing_delta(prev.bearing, cur.bearing);
        let delta_seconds = prev.last().seconds_between(cur.first());
        let delta_metres = (prev.last().distance_km(cur.first()) * 1000.0).trunc();

        if delta_bearing < MAX_VECTOR_ANGLE
            && delta_seconds < MAX_MERGE_SECONDS
            && delta_metres < MAX_MERGE_METRES
        {
            if let Some(prev) = merged.pop() {
                merged.push(prev.join(cur));
            }
        } else {
            merged.push(cur);
        }
    }

    merged
}

/// Scores every interior vector and removes the worst one, until nothing
/// scores above the threshold. The first and last vectors always survive,
/// and every iteration either removes a vector or stops.
fn remove_noisy(vectors: &mut Vec<Vector>) {
    while vectors.len() >= 3 {
        for idx in 1..vectors.len() - 1 {
            let (prev, cur_score, next) = score(&vectors[idx - 1], &vectors[idx], &vectors[idx + 1]);
            let v = &mut vectors[idx];
            v.prev_score = (10.0 * prev) as i32;
            v.cur_score = (10.0 * cur_score) as i32;
            v.next_score = (10.0 * next) as i32;
            v.score = (10.0 * (prev + cur_score + next)) as i32;
        }

        let mut worst = 1;
        for idx in 2..vectors.len() - 1 {
            if vectors[idx].score > vectors[worst].score {
                worst = idx;
            }
        }

        if vectors[worst].score <= REMOVE_VECTOR_SCORE_THRESHOLD {
            break;
        }

        let removed = vectors.remove(worst);
        debug!(
            "Removed vector scoring {} [{} - {} - {}]: {}",
            removed.score, removed.prev_score, removed.cur_score, removed.next_score, removed
        );
    }
}

/// Returns the (previous, current, next) components of the score of `cur`.
fn score(prev: &Vector, cur: &Vector, next: &Vector) -> (f64, f64, f64) {
    let count = cur.samples.len();
    let mut cur_score = cur.seconds / count as f64 * 2.0;
    if count < 4 {
        cur_score += ((5 - count) * 5) as f64;
    }

    (gap_score(prev, cur), cur_score, gap_score(cur, next))
}

/// Penalises a change in bearing over 60 degrees, and time and distance
/// gaps over 3 seconds / 3 metres, between the end of `from` and the start
/// of `to`.
fn gap_score(from: &Vector, to: &Vector) -> f64 {
    let delta_bearing = bearing_delta(from.bearing, to.bearing);
    let delta_seconds = from.last().seconds_between(to.first()).trunc();
    let delta_metres = (from.last().distance_km(to.first()) * 1000.0).trunc();

    (f64::from(delta_bearing - 60) / 60.0).max(0.0) * 4.0
        + (5.0 * (delta_seconds - 3.0) / 3.0).max(0.0)
        + (5.0 * (delta_metres - 3.0) / 3.0).max(0.0)
}
