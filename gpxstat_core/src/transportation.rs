//! Guesses how a run was travelled from its speed.
//!
//! Each transportation type has a nominal speed range where it is certain,
//! and an absolute range outside which it is impossible. In between the
//! probability falls off linearly. The ranges overlap, so one speed usually
//! gives more than one candidate.

use std::fmt;

use serde::Serialize;

use crate::run::Run;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportationType {
    Unknown,
    Foot,
    Bicycle,
    Car,
    Train,
    Plane,
}

impl fmt::Display for TransportationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportationType::Unknown => "unknown",
            TransportationType::Foot => "foot",
            TransportationType::Bicycle => "bicycle",
            TransportationType::Car => "car",
            TransportationType::Train => "train",
            TransportationType::Plane => "plane",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportationGuess {
    /// In the range (0, 1].
    pub probability: f64,
    pub transportation: TransportationType,
}

impl TransportationGuess {
    pub fn new(probability: f64, transportation: TransportationType) -> Self {
        Self {
            probability,
            transportation,
        }
    }
}

impl fmt::Display for TransportationGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.0}%)", self.transportation, self.probability * 100.0)
    }
}

/// Speeds in km/h.
#[derive(Debug, Clone, Copy)]
struct SpeedProfile {
    absolute_min: f64,
    nominal_min: f64,
    nominal_max: f64,
    absolute_max: f64,
    transportation: TransportationType,
}

const SPEED_PROFILES: [SpeedProfile; 5] = [
    SpeedProfile {
        absolute_min: 0.0,
        nominal_min: 1.0,
        nominal_max: 6.4,
        absolute_max: 7.4,
        transportation: TransportationType::Foot,
    },
    SpeedProfile {
        absolute_min: 6.4,
        nominal_min: 12.0,
        nominal_max: 34.0,
        absolute_max: 41.0,
        transportation: TransportationType::Bicycle,
    },
    SpeedProfile {
        absolute_min: 16.0,
        nominal_min: 25.0,
        nominal_max: 128.0,
        absolute_max: 160.0,
        transportation: TransportationType::Car,
    },
    SpeedProfile {
        absolute_min: 90.0,
        nominal_min: 100.0,
        nominal_max: 200.0,
        absolute_max: 300.0,
        transportation: TransportationType::Train,
    },
    SpeedProfile {
        absolute_min: 100.0,
        nominal_min: 160.0,
        nominal_max: 800.0,
        absolute_max: 1000.0,
        transportation: TransportationType::Plane,
    },
];

/// The lowest probability given to a speed inside the absolute range.
pub const MIN_PROBABILITY: f64 = 0.01;

/// How many guesses a single speed gives.
pub const MAX_SPEED_GUESSES: usize = 2;

/// How many guesses a run keeps.
pub const MAX_RUN_GUESSES: usize = 3;

/// The smoothed speed of a point is the mean reported speed of this many
/// points, ending at the point.
pub const SMOOTHING_POINTS: usize = 4;

impl SpeedProfile {
    fn probability(&self, speed_kmh: f64) -> Option<f64> {
        if speed_kmh >= self.nominal_min && speed_kmh <= self.nominal_max {
            Some(1.0)
        } else if speed_kmh >= self.absolute_min && speed_kmh < self.nominal_min {
            Some(falloff(speed_kmh, self.absolute_min, self.nominal_min))
        } else if speed_kmh > self.nominal_max && speed_kmh <= self.absolute_max {
            Some(falloff(speed_kmh, self.absolute_max, self.nominal_max))
        } else {
            None
        }
    }
}

fn falloff(speed_kmh: f64, absolute: f64, nominal: f64) -> f64 {
    ((speed_kmh - absolute) / (nominal - absolute)).max(MIN_PROBABILITY)
}

/// Returns the one or two most likely transportation types for a speed,
/// most likely first. A speed that fits no profile is `unknown`.
pub fn classify_speed(speed_kmh: f64) -> Vec<TransportationGuess> {
    let mut guesses: Vec<TransportationGuess> = SPEED_PROFILES
        .iter()
        .filter_map(|p| {
            p.probability(speed_kmh)
                .filter(|&prob| prob > 0.0)
                .map(|prob| TransportationGuess::new(prob, p.transportation))
        })
        .collect();

    if guesses.is_empty() {
        return vec![TransportationGuess::new(1.0, TransportationType::Unknown)];
    }

    sort_guesses(&mut guesses);
    guesses.truncate(MAX_SPEED_GUESSES);
    guesses
}

/// Fills in the smoothed speed of every point and the transportation
/// guesses of the run. The candidates of every point (from its reported
/// speed) are averaged over the whole run; the top three are kept.
pub fn assign_transportation(run: &mut Run) {
    let count = run.points.len();
    if count == 0 {
        run.transportation.clear();
        return;
    }

    // Kept in first seen order; the sort is stable.
    let mut totals: Vec<(TransportationType, f64)> = Vec::new();

    for idx in 0..count {
        let window = &run.points[idx.saturating_sub(SMOOTHING_POINTS - 1)..=idx];
        let mean_kmh = window.iter().map(|p| p.sample.speed_kmh).sum::<f64>() / window.len() as f64;
        run.points[idx].smoothed_speed_kmh = mean_kmh;

        for guess in classify_speed(run.points[idx].sample.speed_kmh) {
            match totals.iter_mut().find(|(t, _)| *t == guess.transportation) {
                Some((_, total)) => *total += guess.probability,
                None => totals.push((guess.transportation, guess.probability)),
            }
        }
    }

    let mut guesses: Vec<TransportationGuess> = totals
        .into_iter()
        .map(|(t, total)| TransportationGuess::new(total / count as f64, t))
        .collect();

    sort_guesses(&mut guesses);
    guesses.truncate(MAX_RUN_GUESSES);
    run.transportation = guesses;
}

/// Most likely first. The sort is stable.
fn sort_guesses(guesses: &mut [TransportationGuess]) {
    guesses.sort_by(|a, b| b.probability.total_cmp(&a.probability));
}
