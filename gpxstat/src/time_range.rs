use anyhow::{Context, Result};
use gpxstat_core::Sample;
use time::{macros::format_description, Time, UtcOffset};

use crate::read::Track;

/// Parses a UTC time of day given as HH:MM:SS.
pub fn parse_time_of_day(s: &str) -> Result<Time> {
    Time::parse(s, format_description!("[hour]:[minute]:[second]"))
        .with_context(|| format!("Unable to parse '{s}' as HH:MM:SS"))
}

/// The points of every track and segment whose UTC time of day is within
/// `start..=end`, in file order. The date is ignored.
pub fn points_between(tracks: &[Track], start: Time, end: Time) -> Vec<Sample> {
    tracks
        .iter()
        .flatten()
        .flatten()
        .filter(|p| (start..=end).contains(&p.time.to_offset(UtcOffset::UTC).time()))
        .cloned()
        .collect()
}
