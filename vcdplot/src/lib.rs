// Copyright 2023-2024 The Regents of the University of California
// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod render;
pub mod simple;
mod svg;
mod timeline;
mod vcd;

use std::path::PathBuf;

/// Cargo.toml version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Stop parsing after this many lines. Inputs are otherwise read until the end.
    pub max_lines: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Stylesheet that classifies the waveform paths. Needs to exist at render time.
    pub stylesheet: PathBuf,
    /// Copy the stylesheet into the document instead of referencing it.
    pub embed_stylesheet: bool,
    /// Vertical distance between a low and a high level.
    pub level_height: f64,
    /// Vertical distance between the baselines of two neighboring lanes.
    pub lane_pitch: f64,
    /// Horizontal pixels per simulation time unit.
    pub time_scale: f64,
    /// Space around the drawn region.
    pub margin: f64,
    /// Indicates that lanes should be rendered with multiple threads.
    pub multi_thread: bool,
}

pub const DEFAULT_STYLESHEET: &str = "style.css";

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            stylesheet: PathBuf::from(DEFAULT_STYLESHEET),
            embed_stylesheet: false,
            level_height: 10.0,
            lane_pitch: 20.0,
            time_scale: 1.0,
            margin: 10.0,
            multi_thread: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VcdPlotError {
    #[error("[vcd] failed to parse time stamp `{token}` on line {line}")]
    InvalidTimestamp { line: usize, token: String },
    #[error("stylesheet {0:?} not found")]
    MissingStylesheet(PathBuf),
    #[error("io error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VcdPlotError>;

pub use crate::render::{render_signal, Lane, PathCmd, WavePath};
pub use crate::svg::{compose, AxisLine, Document, LanePath, AXIS_CLASS, WAVEFORM_CLASS};
pub use crate::timeline::{Datapoint, Signal, Time, Timeline, Value, SINGLE_BIT_RANGE};
pub use crate::vcd::{parse_declaration, parse_str, Diagnostic, DiagnosticKind, Parsed};
