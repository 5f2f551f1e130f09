// Copyright 2024 The Regents of the University of California
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@berkeley.edu>

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gtkw-mangle")]
#[command(author = "Kevin Laeufer <laeufer@berkeley.edu>")]
#[command(version)]
#[command(about = "Removes folder names from the dump and save file paths in GTKWave save files.", long_about = None)]
struct Args {
    #[arg(
        value_name = "PATH",
        index = 1,
        help = "save file or folder to search, defaults to the current directory"
    )]
    path: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
    let args = Args::parse();
    let path = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let stats = gtkw::mangle_recursive(&path)
        .with_context(|| format!("failed to mangle save files in {path:?}"))?;
    println!(
        "Done. Changed {} of {} save files.",
        stats.changed, stats.files
    );
    Ok(())
}
