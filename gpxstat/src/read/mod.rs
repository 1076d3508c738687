#![allow(clippy::single_match)]

//! A streaming GPX reader that keeps only what the analysis needs: the
//! track points, grouped into tracks and segments. Waypoints, routes,
//! metadata and extensions are skipped.

use std::{borrow::Cow, path::Path, str::FromStr};

use anyhow::{bail, Context, Result};
use gpxstat_core::Sample;
use log::info;
use logging_timer::time;
use quick_xml::{events::Event, Reader};
use time::{format_description::well_known, OffsetDateTime, UtcOffset};
use track::parse_track;

mod attributes;
mod track;
mod track_point;
mod track_segment;

/// The samples of one track segment.
pub type Segment = Vec<Sample>;

/// The segments of one track.
pub type Track = Vec<Segment>;

/// The XSD, which defines the format of a GPX file, is at https://www.topografix.com/GPX/1/1/gpx.xsd
#[time]
pub fn read_gpx_from_file<P: AsRef<Path>>(input_file: P) -> Result<Vec<Track>> {
    let input_file = input_file.as_ref();
    info!("Reading GPX file {:?}", input_file);
    let contents = std::fs::read(input_file)
        .with_context(|| format!("Could not read {:?}", input_file))?;
    read_gpx_from_slice(&contents).with_context(|| format!("Could not parse {:?}", input_file))
}

pub fn read_gpx_from_slice(data: &[u8]) -> Result<Vec<Track>> {
    let mut xml_reader = Reader::from_reader(data);
    let mut tracks: Option<Vec<Track>> = None;

    loop {
        match xml_reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"gpx" => {
                    tracks = Some(parse_gpx(&mut xml_reader)?);
                }
                e => bail!("Unexpected Start element {:?}", xml_reader.bytes_to_cow(e)),
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"gpx" => {
                    tracks = Some(Vec::new());
                }
                e => bail!("Unexpected Empty element {:?}", xml_reader.bytes_to_cow(e)),
            },
            Ok(Event::Eof) => {
                // The closing 'gpx' tag was consumed by parse_gpx(), so
                // the next thing is EOF.
                return tracks.context("Did not find the 'gpx' element");
            }
            Err(e) => bail!("Error at position {}: {:?}", xml_reader.error_position(), e),
            _ => (),
        }
    }
}

fn parse_gpx(xml_reader: &mut Reader<&[u8]>) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"trk" => {
                    tracks.push(parse_track(xml_reader)?);
                }
                _ => {
                    xml_reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"trk" => {
                    tracks.push(Vec::new());
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"gpx" => {
                    return Ok(tracks);
                }
                _ => {}
            },
            Ok(Event::Eof) => bail!("Unexpected end of file inside the 'gpx' element"),
            Err(e) => bail!("Error at position {}: {:?}", xml_reader.error_position(), e),
            _ => (),
        }
    }
}

pub(crate) trait XmlReaderConversions {
    fn bytes_to_cow<'a, 'b>(&'a self, bytes: &'b [u8]) -> Result<Cow<'b, str>>;
    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String>;
    fn cow_to_string(&self, bytes: Cow<'_, [u8]>) -> Result<String>;
}

impl<R> XmlReaderConversions for Reader<R> {
    #[inline]
    fn bytes_to_cow<'a, 'b>(&'a self, bytes: &'b [u8]) -> Result<Cow<'b, str>> {
        Ok(self.decoder().decode(bytes)?)
    }

    #[inline]
    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String> {
        Ok(self.bytes_to_cow(bytes)?.into())
    }

    #[inline]
    fn cow_to_string(&self, bytes: Cow<'_, [u8]>) -> Result<String> {
        match bytes {
            Cow::Borrowed(slice) => self.bytes_to_string(slice),
            Cow::Owned(vec) => self.bytes_to_string(&vec),
        }
    }
}

pub(crate) trait XmlReaderExtensions {
    fn read_inner_as_string(&mut self) -> Result<String>;
    fn read_inner_as_time(&mut self) -> Result<OffsetDateTime>;
    fn read_inner_as<T: FromStr>(&mut self) -> Result<T>;
}

impl XmlReaderExtensions for Reader<&[u8]> {
    #[inline]
    fn read_inner_as_string(&mut self) -> Result<String> {
        match self.read_event() {
            Ok(Event::Text(text)) => Ok(self.bytes_to_string(&text)?.trim().to_string()),
            e => bail!(
                "Got unexpected XML element {:?} (was expecting Event::Text), this is either a bug or the document is corrupt",
                e
            ),
        }
    }

    /// Times are normalised to UTC.
    #[inline]
    fn read_inner_as_time(&mut self) -> Result<OffsetDateTime> {
        let t = self.read_inner_as_string()?;
        let parsed = OffsetDateTime::parse(&t, &well_known::Rfc3339)
            .with_context(|| format!("Could not parse '{t}' as an RFC 3339 time"))?;
        Ok(parsed.to_offset(UtcOffset::UTC))
    }

    #[inline]
    fn read_inner_as<T: FromStr>(&mut self) -> Result<T> {
        let t = self.read_inner_as_string()?;

        match t.parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => bail!("Could not parse {} into {}", t, std::any::type_name::<T>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use gpxstat_core::FixType;
    use time::macros::datetime;

    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.0" creator="test" xmlns="http://www.topografix.com/GPX/1/0">
  <metadata><name>Morning</name></metadata>
  <wpt lat="51.0" lon="-0.1"><name>Ignored</name></wpt>
  <trk>
    <name>First</name>
    <trkseg>
      <trkpt lat="51.5" lon="-0.12">
        <ele>12.5</ele>
        <time>2024-06-01T09:00:00Z</time>
        <course>90.0</course>
        <speed>1.5</speed>
        <fix>3d</fix>
        <sat>9</sat>
        <hdop>0.9</hdop>
        <vdop>1.4</vdop>
        <pdop>1.2</pdop>
      </trkpt>
      <trkpt lat="51.5001" lon="-0.12">
        <time>2024-06-01T10:00:01+01:00</time>
        <extensions><gpxtpx:TrackPointExtension><gpxtpx:hr>120</gpxtpx:hr></gpxtpx:TrackPointExtension></extensions>
      </trkpt>
    </trkseg>
    <trkseg/>
    <trkseg>
      <trkpt lat="51.6" lon="-0.2"><time>2024-06-01T11:00:00Z</time><fix>2d</fix></trkpt>
    </trkseg>
  </trk>
  <trk>
    <trkseg>
      <trkpt lat="52.0" lon="0.5"><time>2024-06-02T08:00:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_reads_tracks_and_segments() {
        let tracks = read_gpx_from_slice(DOC.as_bytes()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].len(), 3);
        assert_eq!(tracks[0][0].len(), 2);
        assert!(tracks[0][1].is_empty());
        assert_eq!(tracks[0][2].len(), 1);
        assert_eq!(tracks[1].len(), 1);
        assert_eq!(tracks[1][0][0].lat, 52.0);
    }

    #[test]
    fn test_reads_point_fields() {
        let tracks = read_gpx_from_slice(DOC.as_bytes()).unwrap();
        let p = &tracks[0][0][0];
        assert_eq!(p.lat, 51.5);
        assert_eq!(p.lon, -0.12);
        assert_eq!(p.ele, 12.5);
        assert_eq!(p.time, datetime!(2024-06-01 09:00:00 UTC));
        assert_eq!(p.course, 90.0);
        assert_eq!(p.speed, 1.5);
        assert!((p.speed_kmh - 5.4).abs() < 1e-9);
        assert_eq!(p.fix, Some(FixType::ThreeDimensional));
        assert_eq!(p.hdop, Some(0.9));
        assert_eq!(p.vdop, Some(1.4));
        assert_eq!(p.pdop, Some(1.2));

        assert_eq!(tracks[0][2][0].fix, Some(FixType::TwoDimensional));
        assert!(!tracks[0][2][0].has_good_fix());
    }

    #[test]
    fn test_missing_fields_default() {
        let tracks = read_gpx_from_slice(DOC.as_bytes()).unwrap();
        let p = &tracks[0][0][1];
        assert_eq!(p.ele, 0.0);
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.fix, None);
        assert_eq!(p.hdop, None);
        assert_eq!(p.pdop, None);
        // Normalised to UTC.
        assert_eq!(p.time, datetime!(2024-06-01 09:00:01 UTC));
        assert!(p.time.offset().is_utc());
    }

    #[test]
    fn test_point_without_time_is_an_error() {
        let doc = r#"<gpx><trk><trkseg><trkpt lat="1" lon="2"><ele>3</ele></trkpt></trkseg></trk></gpx>"#;
        assert!(read_gpx_from_slice(doc.as_bytes()).is_err());

        let doc = r#"<gpx><trk><trkseg><trkpt lat="1" lon="2"/></trkseg></trk></gpx>"#;
        assert!(read_gpx_from_slice(doc.as_bytes()).is_err());
    }

    #[test]
    fn test_point_without_lat_is_an_error() {
        let doc = r#"<gpx><trk><trkseg><trkpt lon="2"><time>2024-06-01T09:00:00Z</time></trkpt></trkseg></trk></gpx>"#;
        assert!(read_gpx_from_slice(doc.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_time_is_an_error() {
        let doc = r#"<gpx><trk><trkseg><trkpt lat="1" lon="2"><time>yesterday</time></trkpt></trkseg></trk></gpx>"#;
        assert!(read_gpx_from_slice(doc.as_bytes()).is_err());
    }

    #[test]
    fn test_not_gpx_is_an_error() {
        assert!(read_gpx_from_slice(b"<kml></kml>").is_err());
        assert!(read_gpx_from_slice(b"").is_err());
    }

    #[test]
    fn test_gpx_without_tracks() {
        assert!(read_gpx_from_slice(b"<gpx/>").unwrap().is_empty());
        assert!(read_gpx_from_slice(b"<gpx><rte><rtept lat=\"1\" lon=\"2\"/></rte></gpx>")
            .unwrap()
            .is_empty());
    }
}
