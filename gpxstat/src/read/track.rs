use anyhow::{bail, Result};
use quick_xml::{events::Event, Reader};

use super::{track_segment::parse_track_segment, Track};

pub(crate) fn parse_track(xml_reader: &mut Reader<&[u8]>) -> Result<Track> {
    let mut track = Track::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"trkseg" => {
                    track.push(parse_track_segment(xml_reader)?);
                }
                // name, desc, link, extensions and so on.
                _ => {
                    xml_reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"trkseg" => {
                    track.push(Vec::new());
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"trk" => {
                    return Ok(track);
                }
                _ => {}
            },
            Ok(Event::Eof) => bail!("Unexpected end of file inside a 'trk' element"),
            Err(e) => bail!("Error at position {}: {:?}", xml_reader.error_position(), e),
            _ => (),
        }
    }
}
