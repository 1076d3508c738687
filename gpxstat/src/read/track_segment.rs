use anyhow::{bail, Result};
use quick_xml::{events::Event, Reader};

use super::{attributes::Attributes, track_point::parse_track_point, Segment};

pub(crate) fn parse_track_segment(xml_reader: &mut Reader<&[u8]>) -> Result<Segment> {
    let mut segment = Segment::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"trkpt" => {
                    let attributes = Attributes::new(&e, xml_reader)?;
                    segment.push(parse_track_point(attributes, xml_reader)?);
                }
                _ => {
                    xml_reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"trkpt" => bail!(
                    "Track point {} of a segment has no 'time' element",
                    segment.len() + 1
                ),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"trkseg" => {
                    return Ok(segment);
                }
                _ => {}
            },
            Ok(Event::Eof) => bail!("Unexpected end of file inside a 'trkseg' element"),
            Err(e) => bail!("Error at position {}: {:?}", xml_reader.error_position(), e),
            _ => (),
        }
    }
}
