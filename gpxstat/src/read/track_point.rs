use anyhow::{bail, Context, Result};
use gpxstat_core::{FixType, Sample};
use quick_xml::{events::Event, Reader};

use super::{attributes::Attributes, XmlReaderExtensions};

/// Reads the children of a 'trkpt' element. Anything the analysis does not
/// use, such as 'sat', 'name' or 'extensions', is skipped.
pub(crate) fn parse_track_point(
    mut attributes: Attributes,
    xml_reader: &mut Reader<&[u8]>,
) -> Result<Sample> {
    let lat: f64 = attributes.get("lat")?;
    let lon: f64 = attributes.get("lon")?;

    let mut ele = None;
    let mut time = None;
    let mut course = None;
    let mut speed = None;
    let mut fix = None;
    let mut hdop = None;
    let mut vdop = None;
    let mut pdop = None;

    loop {
        match xml_reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"ele" => ele = Some(xml_reader.read_inner_as::<f64>()?),
                b"time" => time = Some(xml_reader.read_inner_as_time()?),
                b"course" => course = Some(xml_reader.read_inner_as::<f64>()?),
                b"speed" => speed = Some(xml_reader.read_inner_as::<f64>()?),
                b"fix" => fix = Some(xml_reader.read_inner_as::<FixType>()?),
                b"hdop" => hdop = Some(xml_reader.read_inner_as::<f64>()?),
                b"vdop" => vdop = Some(xml_reader.read_inner_as::<f64>()?),
                b"pdop" => pdop = Some(xml_reader.read_inner_as::<f64>()?),
                _ => {
                    xml_reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"trkpt" => break,
                _ => {}
            },
            Ok(Event::Eof) => bail!("Unexpected end of file inside a 'trkpt' element"),
            Err(e) => bail!("Error at position {}: {:?}", xml_reader.error_position(), e),
            _ => (),
        }
    }

    let time = time.with_context(|| format!("Track point at {lat},{lon} has no 'time' element"))?;

    let mut sample = Sample::new(lat, lon, time)
        .with_elevation(ele.unwrap_or_default())
        .with_course(course.unwrap_or_default())
        .with_speed(speed.unwrap_or_default());
    sample.fix = fix;
    sample.hdop = hdop;
    sample.vdop = vdop;
    sample.pdop = pdop;

    Ok(sample)
}
