use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use gpxstat_core::{formatting::format_utc_date, ActivitySummary, Sample};
use log::info;
use logging_timer::time;

use crate::PROGRAM_NAME;

/// The summary of 'ride.gpx' is written to 'ride.stats.json'.
pub fn output_filename(input_file: &Path) -> PathBuf {
    input_file.with_extension("stats.json")
}

#[time]
pub fn write_summary_to_file<P: AsRef<Path>>(output_file: P, summary: &ActivitySummary) -> Result<()> {
    let output_file = output_file.as_ref();
    info!("Writing summary to {:?}", output_file);

    let file = File::create(output_file)
        .with_context(|| format!("Could not create {:?}", output_file))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    Ok(())
}

/// Writes the points as a single track with a single segment, in GPX 1.0
/// so the speed and course elements are valid.
pub fn write_gpx_to_file<P: AsRef<Path>>(output_file: P, points: &[Sample]) -> Result<()> {
    let output_file = output_file.as_ref();
    info!("Writing {} points to {:?}", points.len(), output_file);

    let file = File::create(output_file)
        .with_context(|| format!("Could not create {:?}", output_file))?;
    let mut writer = BufWriter::new(file);
    write_gpx_to_writer(&mut writer, points)
}

pub fn write_gpx_to_writer<W: Write>(w: &mut W, points: &[Sample]) -> Result<()> {
    writeln!(w, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(
        w,
        "<gpx version=\"1.0\" creator=\"{PROGRAM_NAME}\" xmlns=\"http://www.topografix.com/GPX/1/0\">"
    )?;
    writeln!(w, "  <trk>")?;
    writeln!(w, "    <trkseg>")?;
    for p in points {
        write_trackpoint(w, p).with_context(|| format!("Failed to write track point {p}"))?;
    }
    writeln!(w, "    </trkseg>")?;
    writeln!(w, "  </trk>")?;
    writeln!(w, "</gpx>")?;

    w.flush()?;
    Ok(())
}

fn write_trackpoint<W: Write>(w: &mut W, point: &Sample) -> Result<()> {
    writeln!(
        w,
        "      <trkpt lat=\"{:.6}\" lon=\"{:.6}\">",
        point.lat, point.lon
    )?;
    writeln!(w, "        <ele>{:.1}</ele>", point.ele)?;
    writeln!(w, "        <time>{}</time>", format_utc_date(&point.time))?;
    writeln!(w, "        <course>{:.1}</course>", point.course)?;
    writeln!(w, "        <speed>{:.2}</speed>", point.speed)?;

    if let Some(fix) = point.fix {
        writeln!(w, "        <fix>{fix}</fix>")?;
    }
    if let Some(hdop) = point.hdop {
        writeln!(w, "        <hdop>{hdop}</hdop>")?;
    }
    if let Some(vdop) = point.vdop {
        writeln!(w, "        <vdop>{vdop}</vdop>")?;
    }
    if let Some(pdop) = point.pdop {
        writeln!(w, "        <pdop>{pdop}</pdop>")?;
    }

    writeln!(w, "      </trkpt>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use gpxstat_core::FixType;
    use time::macros::datetime;

    use crate::read::read_gpx_from_slice;

    use super::*;

    #[test]
    fn test_written_gpx_can_be_read_back() {
        let points = vec![
            Sample::new(51.5, -0.12, datetime!(2024-06-01 09:00:00 UTC))
                .with_elevation(12.5)
                .with_course(90.0)
                .with_speed(1.25)
                .with_fix(FixType::ThreeDimensional)
                .with_hdop(0.9),
            Sample::new(51.5001, -0.12, datetime!(2024-06-01 09:00:05 UTC)),
        ];

        let mut buf = Vec::new();
        write_gpx_to_writer(&mut buf, &points).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("<time>2024-06-01T09:00:00Z</time>"));
        assert!(text.contains("<fix>3d</fix>"));

        let tracks = read_gpx_from_slice(&buf).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].len(), 1);
        assert_eq!(tracks[0][0], points);
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename(Path::new("/tmp/ride.gpx")),
            PathBuf::from("/tmp/ride.stats.json")
        );
        assert_eq!(output_filename(Path::new("walk.GPX")), PathBuf::from("walk.stats.json"));
    }
}
