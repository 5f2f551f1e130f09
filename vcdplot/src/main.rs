// Copyright 2023-2024 The Regents of the University of California
// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use vcdplot::{LoadOptions, RenderOptions, DEFAULT_STYLESHEET};

#[derive(Parser, Debug)]
#[command(name = "vcdplot")]
#[command(author = "Kevin Laeufer <laeufer@berkeley.edu>")]
#[command(version)]
#[command(about = "Renders the value changes of a VCD file as an SVG waveform diagram.", long_about = None)]
struct Args {
    #[arg(value_name = "VCDFILE", index = 1)]
    input: PathBuf,
    #[arg(value_name = "SVGFILE", index = 2)]
    output: PathBuf,
    #[arg(long, value_name = "CSS", default_value = DEFAULT_STYLESHEET)]
    stylesheet: PathBuf,
    #[arg(long, help = "copy the stylesheet into the SVG instead of linking to it")]
    embed_stylesheet: bool,
    #[arg(long, value_name = "PX")]
    lane_pitch: Option<f64>,
    #[arg(long, value_name = "PX")]
    level_height: Option<f64>,
    #[arg(long, value_name = "PX", help = "horizontal pixels per time unit")]
    time_scale: Option<f64>,
    #[arg(long, value_name = "N", help = "stop parsing after N lines")]
    max_lines: Option<usize>,
    #[arg(long)]
    single_thread: bool,
    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    use log::LevelFilter;
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let load_opts = LoadOptions {
        max_lines: args.max_lines,
    };
    let defaults = RenderOptions::default();
    let render_opts = RenderOptions {
        stylesheet: args.stylesheet,
        embed_stylesheet: args.embed_stylesheet,
        level_height: args.level_height.unwrap_or(defaults.level_height),
        lane_pitch: args.lane_pitch.unwrap_or(defaults.lane_pitch),
        time_scale: args.time_scale.unwrap_or(defaults.time_scale),
        multi_thread: !args.single_thread,
        ..defaults
    };

    let start = std::time::Instant::now();
    let parsed = vcdplot::simple::plot(&args.input, &args.output, &load_opts, &render_opts)
        .with_context(|| format!("failed to plot {:?}", args.input))?;
    log::info!(
        "Plotted {} signals with {} value changes in {:?}.",
        parsed.timeline.len(),
        parsed.timeline.datapoint_count(),
        start.elapsed()
    );
    if !parsed.diagnostics.is_empty() {
        log::warn!("Skipped {} malformed lines.", parsed.diagnostics.len());
    }
    if !args.quiet {
        println!("SVG written to \"{}\".", args.output.display());
    }
    Ok(())
}
