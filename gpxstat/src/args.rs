use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gpxstat_core::{
    parameters::{
        MAX_DOP, MAX_STOP_MERGE_GAP_SECONDS, MIN_MOVING_SPEED_MPS, MIN_STOP_DURATION_SECONDS,
        MOVING_WINDOW_SECONDS, RUN_GAP_SECONDS, STOP_MERGE_METRES,
    },
    AnalysisParameters,
};
use time::Time;

use crate::time_range::parse_time_of_day;

/*
 [--force] [--time-zone=LABEL] \
   [--max-dop] [--moving-window] [--moving-speed] [--run-gap] \
   [--min-stop-time] [--stop-merge-distance] [--max-stop-merge-gap] \
   FILES
 info FILES
 time -i INPUT -o OUTPUT -s HH:MM:SS -e HH:MM:SS [--force]
*/

/// Returns the parsed command line options. Uses the 'wild' crate to do glob
/// expansion on Windows. so that Windows and Linux behave identically.
pub fn parse_args() -> Args {
    Args::parse_from(wild::args())
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(
        short,
        long,
        default_value = "false",
        help = "Overwrite output files even if they already exist"
    )]
    pub force: bool,

    #[arg(
        short = 'z',
        long,
        help = "A time zone label, such as 'Europe/London', copied into every track of the output"
    )]
    pub time_zone: Option<String>,

    #[arg(
        long,
        default_value_t = MAX_DOP,
        help = "Track points with an hdop or pdop above this are discarded"
    )]
    pub max_dop: f64,

    #[arg(
        long,
        default_value_t = MOVING_WINDOW_SECONDS,
        help = "The length, in seconds, of the window used to average the reported speed"
    )]
    pub moving_window: f64,

    #[arg(
        long,
        default_value_t = MIN_MOVING_SPEED_MPS,
        help = "The averaged speed, in m/s, at or above which you are considered to be moving"
    )]
    pub moving_speed: f64,

    #[arg(
        long,
        default_value_t = RUN_GAP_SECONDS,
        help = "A gap, in seconds, between moving track points longer than this splits the run"
    )]
    pub run_gap: f64,

    #[arg(
        long,
        default_value_t = MIN_STOP_DURATION_SECONDS / 60.0,
        help = "Minimum length of a stop, in minutes, for it to be 'stopped' rather than 'paused'"
    )]
    pub min_stop_time: f64,

    #[arg(
        long,
        default_value_t = STOP_MERGE_METRES,
        help = "Stops this close together, in metres, are merged into one"
    )]
    pub stop_merge_distance: f64,

    #[arg(
        long,
        default_value_t = MAX_STOP_MERGE_GAP_SECONDS / 60.0,
        help = "Stops further apart in time than this, in minutes, are never merged"
    )]
    pub max_stop_merge_gap: f64,

    #[arg(
        help = "List of files to process. Any file that does not have a 'gpx' extension will be ignored."
    )]
    pub files: Vec<PathBuf>,
}

/// Commands that look at a GPX file without analysing it. With no command
/// the files are analysed.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log the point counts, extent and largest steps of each track and segment
    Info {
        #[arg(help = "List of files to show. Any file that does not have a 'gpx' extension will be ignored.")]
        files: Vec<PathBuf>,
    },

    /// Write the points recorded between two UTC times of day to a new GPX file
    Time {
        #[arg(short, long, help = "The GPX file to take the points from")]
        input: PathBuf,

        #[arg(short, long, help = "The GPX file to write, which must not be the input file")]
        output: PathBuf,

        #[arg(short, long, value_parser = parse_time_of_day, help = "The start time, as HH:MM:SS")]
        start: Time,

        #[arg(short, long, value_parser = parse_time_of_day, help = "The end time, as HH:MM:SS")]
        end: Time,

        #[arg(short, long, default_value = "false", help = "Overwrite the output file if it already exists")]
        force: bool,
    },
}

/// The files that have a 'gpx' extension, in any case.
pub fn gpx_files(files: &[PathBuf]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|f| {
            f.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"))
        })
        .cloned()
        .collect()
}

impl Args {
    pub fn files(&self) -> Vec<PathBuf> {
        gpx_files(&self.files)
    }

    pub fn params(&self) -> AnalysisParameters {
        AnalysisParameters {
            max_dop: self.max_dop,
            moving_window_seconds: self.moving_window,
            min_moving_speed_mps: self.moving_speed,
            run_gap_seconds: self.run_gap,
            min_stop_duration_seconds: self.min_stop_time * 60.0,
            stop_merge_metres: self.stop_merge_distance,
            max_stop_merge_gap_seconds: self.max_stop_merge_gap * 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_library() {
        let args = Args::parse_from(["gpxstat", "a.gpx"]);
        let params = args.params();
        let defaults = AnalysisParameters::default();

        assert!(!args.force);
        assert_eq!(args.time_zone, None);
        assert_eq!(params.max_dop, defaults.max_dop);
        assert_eq!(params.moving_window_seconds, defaults.moving_window_seconds);
        assert_eq!(params.min_moving_speed_mps, defaults.min_moving_speed_mps);
        assert_eq!(params.run_gap_seconds, defaults.run_gap_seconds);
        assert_eq!(params.min_stop_duration_seconds, defaults.min_stop_duration_seconds);
        assert_eq!(params.stop_merge_metres, defaults.stop_merge_metres);
        assert_eq!(params.max_stop_merge_gap_seconds, defaults.max_stop_merge_gap_seconds);
    }

    #[test]
    fn test_options() {
        let args = Args::parse_from([
            "gpxstat",
            "--force",
            "-z",
            "Europe/Paris",
            "--min-stop-time",
            "2",
            "--run-gap",
            "30",
            "a.gpx",
        ]);

        assert!(args.force);
        assert_eq!(args.time_zone.as_deref(), Some("Europe/Paris"));
        assert_eq!(args.params().min_stop_duration_seconds, 120.0);
        assert_eq!(args.params().run_gap_seconds, 30.0);
    }

    #[test]
    fn test_no_command_analyses() {
        let args = Args::parse_from(["gpxstat", "a.gpx", "b.gpx"]);
        assert!(args.command.is_none());
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn test_info_command() {
        let args = Args::parse_from(["gpxstat", "info", "a.gpx", "notes.txt"]);
        match args.command {
            Some(Command::Info { files }) => {
                assert_eq!(gpx_files(&files), vec![PathBuf::from("a.gpx")]);
            }
            other => panic!("Expected the info command, got {other:?}"),
        }
        assert!(args.files.is_empty());
    }

    #[test]
    fn test_time_command() {
        let args = Args::parse_from([
            "gpxstat", "time", "-i", "in.gpx", "-o", "out.gpx", "-s", "09:00:00", "-e", "10:30:00",
        ]);
        match args.command {
            Some(Command::Time { input, output, start, end, force }) => {
                assert_eq!(input, PathBuf::from("in.gpx"));
                assert_eq!(output, PathBuf::from("out.gpx"));
                assert_eq!(start, time::macros::time!(09:00:00));
                assert_eq!(end, time::macros::time!(10:30:00));
                assert!(!force);
            }
            other => panic!("Expected the time command, got {other:?}"),
        }
    }

    #[test]
    fn test_time_command_rejects_a_bad_time() {
        let result = Args::try_parse_from([
            "gpxstat", "time", "-i", "in.gpx", "-o", "out.gpx", "-s", "9am", "-e", "10:30:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_only_gpx_files_are_processed() {
        let args = Args::parse_from(["gpxstat", "a.gpx", "b.GPX", "c.txt", "d"]);
        assert_eq!(
            args.files(),
            vec![PathBuf::from("a.gpx"), PathBuf::from("b.GPX")]
        );
    }
}
