//! The tunable part of the analysis. Everything else is a named constant
//! in the module that uses it.

/// Samples with an hdop or pdop above this are poor quality.
pub const MAX_DOP: f64 = 3.0;

/// Length of the trailing window used to average reported speed.
pub const MOVING_WINDOW_SECONDS: f64 = 5.0;

/// Below about 1.5 km/h the trace is most likely at a stop point.
pub const MIN_MOVING_SPEED_MPS: f64 = 0.417;

/// A gap longer than this between two moving samples splits the run
/// and is bridged by a virtual run.
pub const RUN_GAP_SECONDS: f64 = 10.0;

/// Stops shorter than this are 'paused', longer ones are 'stopped'.
pub const MIN_STOP_DURATION_SECONDS: f64 = 8.0 * 60.0;

/// Stops whose boxes come within this many metres of each other may merge.
pub const STOP_MERGE_METRES: f64 = 5.0;

/// Stops further apart in time than this never merge.
pub const MAX_STOP_MERGE_GAP_SECONDS: f64 = 60.0 * 60.0;

/// These are the parameters that control the classification and
/// segmentation of a track.
#[derive(Debug, Clone)]
pub struct AnalysisParameters {
    /// A sample is poor quality if its hdop or pdop is above this.
    pub max_dop: f64,

    /// How far back, in seconds, to look when averaging the reported
    /// speed of a sample.
    pub moving_window_seconds: f64,

    /// You are considered "Moving" if the averaged speed is at least this.
    pub min_moving_speed_mps: f64,

    /// Moving samples further apart than this are joined by a virtual run.
    pub run_gap_seconds: f64,

    /// The shortest rest that counts as 'stopped' rather than 'paused'.
    pub min_stop_duration_seconds: f64,

    /// Proximity, in metres, at which two stops are considered the same place.
    pub stop_merge_metres: f64,

    /// Stops separated by more than this are never merged.
    pub max_stop_merge_gap_seconds: f64,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            max_dop: MAX_DOP,
            moving_window_seconds: MOVING_WINDOW_SECONDS,
            min_moving_speed_mps: MIN_MOVING_SPEED_MPS,
            run_gap_seconds: RUN_GAP_SECONDS,
            min_stop_duration_seconds: MIN_STOP_DURATION_SECONDS,
            stop_merge_metres: STOP_MERGE_METRES,
            max_stop_merge_gap_seconds: MAX_STOP_MERGE_GAP_SECONDS,
        }
    }
}
