use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use args::{gpx_files, parse_args, Args, Command};
use clap::builder::styling::{AnsiColor, Style};
use env_logger::{Builder, Env};
use file_info::log_info;
use gpxstat_core::{analyze, AnalysisParameters};
use log::{debug, error, info, warn, Level};
use logging_timer::time;
use rayon::prelude::*;
use read::read_gpx_from_file;
use report::log_report;
use time::Time;
use time_range::points_between;
use write::{output_filename, write_gpx_to_file, write_summary_to_file};

mod args;
mod file_info;
mod read;
mod report;
mod time_range;
mod write;

pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

#[time]
fn main() -> Result<()> {
    configure_logging();
    info!("Starting {PROGRAM_NAME}");

    let args = parse_args();
    debug!("{:?}", &args);

    match &args.command {
        None => analyze_files(&args),
        Some(Command::Info { files }) => show_info(files),
        Some(Command::Time {
            input,
            output,
            start,
            end,
            force,
        }) => extract_time_range(input, output, *start, *end, *force),
    }
}

fn analyze_files(args: &Args) -> Result<()> {
    if args.force {
        info!("'--force' specified, all existing output files will be overwritten");
    }

    let input_files = args.files();
    if input_files.is_empty() {
        warn!("No .gpx files specified, exiting");
        return Ok(());
    }

    let params = args.params();
    debug!("{:?}", &params);

    // Each file is independent, so they can be analysed in parallel.
    let failures = input_files
        .par_iter()
        .filter(|f| match process_file(f, args, &params) {
            Ok(()) => false,
            Err(e) => {
                error!("Failed to process {:?}: {e:#}", f);
                true
            }
        })
        .count();

    if failures > 0 {
        bail!("{failures} of {} files could not be processed", input_files.len());
    }

    Ok(())
}

fn process_file(input_file: &Path, args: &Args, params: &AnalysisParameters) -> Result<()> {
    let output_file = output_filename(input_file);
    if output_file.exists() && !args.force {
        info!(
            "Summary file {:?} already exists and --force not specified, skipping",
            output_file
        );
        return Ok(());
    }

    let tracks = read_gpx_from_file(input_file)?;
    let summary = analyze(&tracks, args.time_zone.as_deref(), params);
    log_report(input_file, &summary);
    write_summary_to_file(&output_file, &summary)
}

fn show_info(files: &[PathBuf]) -> Result<()> {
    let input_files = gpx_files(files);
    if input_files.is_empty() {
        warn!("No .gpx files specified, exiting");
        return Ok(());
    }

    for input_file in &input_files {
        let tracks = read_gpx_from_file(input_file)?;
        log_info(input_file, &tracks);
    }

    Ok(())
}

fn extract_time_range(input: &Path, output: &Path, start: Time, end: Time, force: bool) -> Result<()> {
    if input == output {
        bail!("The output file must be different from the input file");
    }
    if end < start {
        bail!("The end time {end} is before the start time {start}");
    }
    if output.exists() && !force {
        bail!("{:?} already exists and --force not specified", output);
    }

    let tracks = read_gpx_from_file(input)?;
    let points = points_between(&tracks, start, end);
    write_gpx_to_file(output, &points)?;
    info!(
        "Saved {} points between {start} and {end} to {:?}",
        points.len(),
        output
    );

    Ok(())
}

/// Log lines look like "[2024-06-01T09:00:00Z INFO  read/mod.rs:31] message".
/// RUST_LOG overrides the default level of 'info'.
fn configure_logging() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let level = record.level();
            let level_style = Style::new().fg_color(Some(level_colour(level).into()));
            let location_style = Style::new().fg_color(Some(AnsiColor::Cyan.into()));

            write!(buf, "[{} {level_style}{level:<5}{level_style:#}", buf.timestamp())?;
            if let Some(location) = source_location(record.file(), record.line()) {
                write!(buf, " {location_style}{location}{location_style:#}")?;
            }
            writeln!(buf, "] {}", record.args())
        })
        .init();
}

fn level_colour(level: Level) -> AnsiColor {
    match level {
        Level::Error => AnsiColor::Red,
        Level::Warn => AnsiColor::Yellow,
        Level::Info => AnsiColor::Green,
        Level::Debug => AnsiColor::Blue,
        Level::Trace => AnsiColor::Magenta,
    }
}

/// Trims a source path to the part below 'src', so that
/// 'gpxstat/src/read/mod.rs' becomes 'read/mod.rs'.
fn source_location(file: Option<&str>, line: Option<u32>) -> Option<String> {
    let file = file?;
    let file = file
        .rsplit_once("src/")
        .or_else(|| file.rsplit_once("src\\"))
        .map_or(file, |(_, rest)| rest);

    Some(match line {
        Some(line) => format!("{file}:{line}"),
        None => file.to_string(),
    })
}
