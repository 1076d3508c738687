use std::path::Path;

use gpxstat_core::{
    formatting::{format_seconds, format_utc_date},
    Sample,
};
use log::info;

use crate::read::Track;

/// Logs the point counts, extent and largest steps of every track and
/// segment in a file. No analysis is done.
pub fn log_info(input_file: &Path, tracks: &[Track]) {
    for line in info_lines(tracks) {
        info!("{:?}: {line}", input_file);
    }
}

/// Raw figures for one segment, measured point to point.
#[derive(Debug)]
struct SegmentInfo<'a> {
    seconds: f64,
    kilometers: f64,
    /// The highest speed reported by the receiver.
    max_speed_kmh: f64,
    /// The longest distance between consecutive points, and the point it ends at.
    longest_step: Option<(f64, &'a Sample)>,
    /// The highest speed needed to cover a step, and the point it ends at.
    fastest_step: Option<(f64, &'a Sample)>,
}

impl<'a> SegmentInfo<'a> {
    fn new(points: &'a [Sample]) -> Self {
        let seconds = match (points.first(), points.last()) {
            (Some(first), Some(last)) => first.seconds_between(last),
            _ => 0.0,
        };

        let mut info = SegmentInfo {
            seconds,
            kilometers: 0.0,
            max_speed_kmh: points.iter().map(|p| p.speed_kmh).fold(0.0, f64::max),
            longest_step: None,
            fastest_step: None,
        };

        for pair in points.windows(2) {
            let (prev, p) = (&pair[0], &pair[1]);
            let km = prev.distance_km(p);
            let kmh = prev.speed_kmh_between(p);
            info.kilometers += km;

            if info.longest_step.map_or(true, |(max, _)| km > max) {
                info.longest_step = Some((km, p));
            }
            if info.fastest_step.map_or(true, |(max, _)| kmh > max) {
                info.fastest_step = Some((kmh, p));
            }
        }

        info
    }
}

fn info_lines(tracks: &[Track]) -> Vec<String> {
    if tracks.is_empty() {
        return vec!["No tracks were found".to_string()];
    }

    let mut lines = Vec::new();

    for (idx, track) in tracks.iter().enumerate() {
        let point_count: usize = track.iter().map(Vec::len).sum();
        lines.push(format!(
            "Track {idx}: {} segments and {point_count} points",
            track.len()
        ));

        for (seg_idx, segment) in track.iter().enumerate() {
            let si = SegmentInfo::new(segment);
            let mut line = format!(
                "  Segment {seg_idx}: {} points, {}, {:.3} km, {:.1} km/h max",
                segment.len(),
                format_seconds(si.seconds),
                si.kilometers,
                si.max_speed_kmh
            );
            if let Some((km, p)) = si.longest_step {
                line.push_str(&format!(
                    ", longest step {:.0} m ending at {}",
                    km * 1000.0,
                    format_utc_date(&p.time)
                ));
            }
            if let Some((kmh, p)) = si.fastest_step {
                line.push_str(&format!(
                    ", fastest step {kmh:.1} km/h ending at {}",
                    format_utc_date(&p.time)
                ));
            }
            lines.push(line);

            if let Some(first) = segment.first() {
                lines.push(format!("    First point {}", describe_point(first)));
            }
            if let (true, Some(last)) = (segment.len() > 1, segment.last()) {
                lines.push(format!("    Last point {}", describe_point(last)));
            }
        }
    }

    lines
}

fn describe_point(p: &Sample) -> String {
    let mut s = format!(
        "{}: {:.6}, {:.6}, speed {:.2} m/s ({:.1} km/h), elevation {:.1} m, course {:.0}",
        format_utc_date(&p.time),
        p.lat,
        p.lon,
        p.speed,
        p.speed_kmh,
        p.ele,
        p.course
    );

    if let Some(fix) = p.fix {
        s.push_str(&format!(", fix {fix}"));
    }
    if let Some(hdop) = p.hdop {
        s.push_str(&format!(", hdop {hdop}"));
    }
    if let Some(pdop) = p.pdop {
        s.push_str(&format!(", pdop {pdop}"));
    }
    if let Some(vdop) = p.vdop {
        s.push_str(&format!(", vdop {vdop}"));
    }

    s
}
