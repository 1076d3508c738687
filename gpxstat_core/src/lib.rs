//! Segments GPS tracks into runs and stops and guesses how each run was
//! travelled.
//!
//! The pipeline for each segment of a track is: [`classify::classify`] ->
//! [`vector::reduce_noise`] -> [`builder::build`]. The segments of a track
//! are then joined and consolidated. [`analyze::analyze`] does all of it.

pub mod analyze;
pub mod builder;
pub mod classify;
pub mod consolidate;
pub mod formatting;
pub mod geometry;
pub mod model;
pub mod parameters;
pub mod run;
pub mod stop;
pub mod summary;
pub mod transportation;
pub mod vector;

#[cfg(test)]
mod test_support;

pub use analyze::analyze;
pub use classify::classify;
pub use model::{Category, ClassifiedSample, DiscardReason, DiscardedSample, FixType, Sample};
pub use parameters::AnalysisParameters;
pub use run::{Run, RunPoint, RunStyle};
pub use stop::{Stop, StopStyle};
pub use summary::{ActivitySummary, TrackSummary};
pub use transportation::{TransportationGuess, TransportationType};
