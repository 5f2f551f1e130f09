// Copyright 2023-2024 The Regents of the University of California
// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//
// Parse a dump and turn it into an SVG with a single call.

use crate::{compose, parse_str, LoadOptions, Parsed, RenderOptions, Result};
use std::io::Read;

/// Read a dump file with the default options.
pub fn read<P: AsRef<std::path::Path>>(filename: P) -> Result<Parsed> {
    read_with_options(filename, &LoadOptions::default())
}

/// Read a dump file. The whole file is read before parsing, thus a file that cannot be read
/// never results in a partial timeline.
pub fn read_with_options<P: AsRef<std::path::Path>>(
    filename: P,
    options: &LoadOptions,
) -> Result<Parsed> {
    let filename = filename.as_ref();
    log::info!("Importing VCD from file {filename:?}...");
    let content = std::fs::read_to_string(filename)?;
    parse_str(&content, options)
}

/// Read from something that is not a file.
pub fn read_from_reader<R: Read>(mut input: R, options: &LoadOptions) -> Result<Parsed> {
    let mut content = String::new();
    input.read_to_string(&mut content)?;
    parse_str(&content, options)
}

/// Parses `input` and writes the rendered waveforms to `output`.
/// Returns the parse result so that callers can inspect the diagnostics.
pub fn plot<P: AsRef<std::path::Path>, Q: AsRef<std::path::Path>>(
    input: P,
    output: Q,
    load_options: &LoadOptions,
    render_options: &RenderOptions,
) -> Result<Parsed> {
    let parsed = read_with_options(input, load_options)?;
    let document = compose(&parsed.timeline, render_options)?;
    document.save(output)?;
    Ok(parsed)
}
