// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//
// Turns the history of a single signal into a step waveform.

use crate::timeline::{Datapoint, Time};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
}

impl PathCmd {
    pub fn point(&self) -> (f64, f64) {
        match *self {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => (x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WavePath {
    cmds: Vec<PathCmd>,
}

impl WavePath {
    pub fn commands(&self) -> &[PathCmd] {
        &self.cmds
    }

    /// Content of the `d` attribute of an SVG path.
    pub fn to_path_data(&self) -> String {
        let mut out = String::with_capacity(self.cmds.len() * 12);
        for (ii, cmd) in self.cmds.iter().enumerate() {
            if ii > 0 {
                out.push(' ');
            }
            // writing to a String cannot fail
            let _ = match cmd {
                PathCmd::MoveTo(x, y) => write!(out, "M{x},{y}"),
                PathCmd::LineTo(x, y) => write!(out, "L{x},{y}"),
            };
        }
        out
    }
}

/// Vertical placement of a waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lane {
    /// y coordinate of logic level 0
    pub offset: f64,
    /// Added to the offset for every logic level. Negative values draw high levels above the baseline.
    pub scale: f64,
    /// Horizontal pixels per time unit.
    pub time_scale: f64,
}

impl Lane {
    #[inline]
    fn y(&self, level: u8) -> f64 {
        level as f64 * self.scale + self.offset
    }

    #[inline]
    fn x(&self, time: Time) -> f64 {
        time as f64 * self.time_scale
    }
}

/// Draws `history` as a step function that is extended until `max_time`.
/// Returns `None` for signals that never change.
///
/// Levels are derived with [`crate::Value::level`], which means that multi-bit values are
/// always drawn as a low line.
pub fn render_signal(history: &[Datapoint], lane: &Lane, max_time: Time) -> Option<WavePath> {
    let (first, rest) = history.split_first()?;
    debug_assert!(history.last().map(|d| d.time <= max_time).unwrap_or(true));
    // one move, two lines per change and the final extension
    let mut cmds = Vec::with_capacity(2 + rest.len() * 2);

    let mut y = lane.y(first.value.level());
    cmds.push(PathCmd::MoveTo(lane.x(first.time), y));
    for datapoint in rest {
        let x = lane.x(datapoint.time);
        cmds.push(PathCmd::LineTo(x, y));
        y = lane.y(datapoint.value.level());
        cmds.push(PathCmd::LineTo(x, y));
    }
    cmds.push(PathCmd::LineTo(lane.x(max_time), y));

    Some(WavePath { cmds })
}
