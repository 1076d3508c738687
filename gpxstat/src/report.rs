use std::path::Path;

use gpxstat_core::{formatting::format_seconds, ActivitySummary};
use log::info;

/// Logs a human readable summary of the analysis of one file.
pub fn log_report(input_file: &Path, summary: &ActivitySummary) {
    for line in report_lines(summary) {
        info!("{:?}: {line}", input_file);
    }
}

fn report_lines(summary: &ActivitySummary) -> Vec<String> {
    let mut lines = Vec::new();

    for (idx, track) in summary.tracks.iter().enumerate() {
        lines.push(format!(
            "Track {idx}: {} runs, {} stops and {} discarded points",
            track.runs.len(),
            track.stops.len(),
            track.discarded.len()
        ));

        for run in &track.runs {
            let guess = run
                .transportation
                .first()
                .map(|g| g.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("  Run {run}, {:.1} km/h, {guess}", run.average_speed_kmh()));
        }

        for stop in &track.stops {
            lines.push(format!("  Stop {stop}"));
        }
    }

    lines.push(format!(
        "Total {:.2} km in {} over {} tracks",
        summary.kilometers(),
        format_seconds(summary.seconds()),
        summary.tracks.len()
    ));

    lines
}
