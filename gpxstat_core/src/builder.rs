//! Turns the cleaned, categorised samples of one segment into runs and
//! stops.

use log::{debug, warn};
use logging_timer::time;

use crate::{
    model::{Category, ClassifiedSample, DiscardedSample, Sample},
    parameters::AnalysisParameters,
    run::{Run, RunStyle},
    stop::Stop,
};

/// Stopped groups this short may be folded back into the preceding run.
pub const SHORT_STOP_SECONDS: f64 = 15.0;

/// ...provided they start this soon after the end of that run.
pub const SHORT_STOP_FOLLOW_SECONDS: f64 = 5.0;

/// The runs, stops and discarded samples of one segment, in time order.
#[derive(Debug, Clone, Default)]
pub struct SegmentResult {
    pub runs: Vec<Run>,
    pub stops: Vec<Stop>,
    pub discarded: Vec<DiscardedSample>,
}

impl SegmentResult {
    /// Appends the results of a later segment.
    pub fn append(&mut self, other: SegmentResult) {
        self.runs.extend(other.runs);
        self.stops.extend(other.stops);
        self.discarded.extend(other.discarded);
    }
}

/// Groups consecutive samples of the same category. Moving groups become
/// runs, with a virtual run bridging every gap longer than the run gap.
/// Stopped groups become stops, unless they are very short and follow a
/// run closely, in which case they are folded into that run. Any poor
/// quality sample still present is moved to the discarded list.
#[time]
pub fn build(samples: Vec<ClassifiedSample>, params: &AnalysisParameters) -> SegmentResult {
    let mut builder = Builder {
        params,
        result: SegmentResult::default(),
    };

    let mut group: Vec<Sample> = Vec::new();
    let mut group_category = Category::Moving;

    for cs in samples {
        if cs.is_poor_quality() {
            builder.result.discarded.push(cs.into());
            continue;
        }

        if !group.is_empty() && cs.category != group_category {
            builder.process_group(group_category, std::mem::take(&mut group));
        }

        group_category = cs.category;
        group.push(cs.sample);
    }

    builder.process_group(group_category, group);
    builder.result
}

struct Builder<'a> {
    params: &'a AnalysisParameters,
    result: SegmentResult,
}

impl Builder<'_> {
    fn process_group(&mut self, category: Category, group: Vec<Sample>) {
        if group.is_empty() {
            return;
        }

        match category {
            Category::Moving => self.process_moving(group),
            Category::Stopped => self.process_stopped(group),
            Category::PoorQuality => {
                warn!("{} poor quality samples reached the run builder", group.len());
            }
        }
    }

    fn process_moving(&mut self, group: Vec<Sample>) {
        let mut run = Run::new(RunStyle::Track);

        for sample in group {
            if let Some(prev) = run.last() {
                if prev.seconds_between(&sample) > self.params.run_gap_seconds {
                    let mut bridge = Run::new(RunStyle::Virtual);
                    bridge.add(prev.clone());
                    bridge.add(sample.clone());

                    let closed = std::mem::replace(&mut run, Run::new(RunStyle::Track));
                    self.result.runs.push(closed);
                    self.result.runs.push(bridge);
                }
            }

            run.add(sample);
        }

        self.result.runs.push(run);
    }

    fn process_stopped(&mut self, group: Vec<Sample>) {
        let duration = group[0].seconds_between(&group[group.len() - 1]);

        if duration <= SHORT_STOP_SECONDS {
            if let Some(last_run) = self.result.runs.last_mut() {
                let follows_closely = last_run
                    .last()
                    .is_some_and(|s| s.seconds_between(&group[0]) < SHORT_STOP_FOLLOW_SECONDS);

                if follows_closely {
                    debug!("Folding a {duration:.0} second stop into the preceding run");
                    for sample in group {
                        last_run.add(sample);
                    }
                    return;
                }
            }
        }

        if let Some(stop) = Stop::from_samples(&group, self.params.min_stop_duration_seconds) {
            self.result.stops.push(stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::DiscardReason,
        stop::StopStyle,
        test_support::{sample_at, walk},
    };

    fn categorised(samples: Vec<Sample>, category: Category) -> Vec<ClassifiedSample> {
        samples
            .into_iter()
            .map(|s| ClassifiedSample::new(s, category))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let result = build(Vec::new(), &AnalysisParameters::default());
        assert!(result.runs.is_empty());
        assert!(result.stops.is_empty());
        assert!(result.discarded.is_empty());
    }

    #[test]
    fn test_continuous_movement_is_one_run() {
        let samples = categorised(walk(0.0, 0.0, 5.0, 1.0, 10), Category::Moving);
        let result = build(samples, &AnalysisParameters::default());
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.runs[0].style, RunStyle::Track);
        assert_eq!(result.runs[0].len(), 10);
    }

    #[test]
    fn test_gap_is_bridged_by_virtual_run() {
        let mut samples = walk(0.0, 0.0, 5.0, 1.0, 5);
        samples.extend(walk(60.0, 60.0, 5.0, 1.0, 5));
        let result = build(categorised(samples, Category::Moving), &AnalysisParameters::default());

        let styles: Vec<RunStyle> = result.runs.iter().map(|r| r.style).collect();
        assert_eq!(styles, vec![RunStyle::Track, RunStyle::Virtual, RunStyle::Track]);
        assert_eq!(result.runs[0].len(), 5);
        assert_eq!(result.runs[2].len(), 5);

        // The bridge spans exactly the two samples either side of the gap.
        let bridge = &result.runs[1];
        assert_eq!(bridge.len(), 2);
        assert_eq!(bridge.first(), result.runs[0].last());
        assert_eq!(bridge.last(), result.runs[2].first());
        assert_eq!(bridge.seconds, 40.0);
    }

    #[test]
    fn test_short_stop_is_folded_into_run() {
        let mut samples = categorised(walk(0.0, 0.0, 1.0, 1.0, 10), Category::Moving);
        samples.extend(categorised(walk(10.0, 10.0, 1.0, 0.0, 10), Category::Stopped));
        samples.extend(categorised(walk(20.0, 10.0, 1.0, 1.0, 10), Category::Moving));

        let result = build(samples, &AnalysisParameters::default());
        assert!(result.stops.is_empty());
        // The folded samples extend the first run; the next moving group
        // starts a run of its own.
        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.runs[0].len(), 20);
        assert_eq!(result.runs[1].len(), 10);
    }

    #[test]
    fn test_short_stop_without_preceding_run_is_a_stop() {
        let samples = categorised(walk(0.0, 0.0, 1.0, 0.0, 10), Category::Stopped);
        let result = build(samples, &AnalysisParameters::default());
        assert!(result.runs.is_empty());
        assert_eq!(result.stops.len(), 1);
        assert_eq!(result.stops[0].style, StopStyle::Paused);
    }

    #[test]
    fn test_long_stop() {
        let mut samples = categorised(walk(0.0, 0.0, 5.0, 1.0, 10), Category::Moving);
        samples.extend(categorised(walk(50.0, 45.0, 5.0, 0.0, 121), Category::Stopped));
        samples.extend(categorised(walk(655.0, 45.0, 5.0, 1.0, 10), Category::Moving));

        let result = build(samples, &AnalysisParameters::default());
        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.stops.len(), 1);
        assert_eq!(result.stops[0].duration_seconds, 600.0);
        assert_eq!(result.stops[0].style, StopStyle::Stopped);
        assert_eq!(result.stops[0].point_count, 121);
    }

    #[test]
    fn test_poor_quality_samples_are_discarded() {
        let mut samples = categorised(walk(0.0, 0.0, 1.0, 1.0, 3), Category::Moving);
        samples.insert(
            1,
            ClassifiedSample::poor_quality(sample_at(0.5, 0.5, 1.0).with_hdop(9.0), DiscardReason::PoorDop),
        );

        let result = build(samples, &AnalysisParameters::default());
        assert_eq!(result.discarded.len(), 1);
        assert_eq!(result.discarded[0].reason, DiscardReason::PoorDop);
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.runs[0].len(), 3);
    }
}
