// Copyright 2023-2024 The Regents of the University of California
// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//
// In-memory model of a parsed value change dump.

use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};

pub type Time = u64;

/// Range reported for single bit signals.
pub const SINGLE_BIT_RANGE: &str = "[0:0]";

/// The value a signal takes on at a certain point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A single state character, e.g., `0`, `1`, `z` or `x`.
    Scalar(char),
    /// The bits of a `b` value change, without the leading `b`.
    Vector(String),
}

impl Value {
    /// Logic level used for drawing.
    ///
    /// Only the scalar `1` is considered high. Every other state and every vector value,
    /// independent of its content, is drawn at level 0. Multi-bit signals are thus not
    /// faithfully represented in the rendered waveform.
    #[inline]
    pub fn level(&self) -> u8 {
        match self {
            Value::Scalar('1') => 1,
            _ => 0,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(c) => write!(f, "{c}"),
            Value::Vector(bits) => write!(f, "b{bits}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Datapoint {
    pub time: Time,
    pub value: Value,
}

impl Datapoint {
    pub fn new(time: Time, value: Value) -> Self {
        Self { time, value }
    }
}

/// A declared variable and all of its value changes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    kind: String,
    bitwidth: u32,
    symbol: String,
    label: String,
    range: String,
    history: Vec<Datapoint>,
}

impl Signal {
    pub(crate) fn new(
        kind: String,
        bitwidth: u32,
        symbol: String,
        label: String,
        range: String,
    ) -> Self {
        debug_assert!(bitwidth >= 1);
        Self {
            kind,
            bitwidth,
            symbol,
            label,
            range,
            history: Vec::new(),
        }
    }

    /// The declared type, e.g., `wire` or `reg`. Not interpreted.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn bitwidth(&self) -> u32 {
        self.bitwidth
    }

    /// Identifier used by value changes to refer to this signal.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    pub fn history(&self) -> &[Datapoint] {
        &self.history
    }

    pub fn last_time(&self) -> Option<Time> {
        self.history.last().map(|d| d.time)
    }

    /// Changes are kept in the order in which they appear in the dump.
    #[inline]
    fn push(&mut self, datapoint: Datapoint) {
        self.history.push(datapoint);
    }
}

/// All signals of a dump in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeline {
    signals: Vec<Signal>,
}

impl Timeline {
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signal> {
        self.signals.iter()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Returns the first signal that was declared with `symbol`.
    pub fn signal_by_symbol(&self, symbol: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.symbol == symbol)
    }

    /// Latest time at which any signal changes. Zero if there are no changes at all.
    pub fn max_time(&self) -> Time {
        self.signals
            .iter()
            .map(|s| s.last_time().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    pub fn datapoint_count(&self) -> usize {
        self.signals.iter().map(|s| s.history.len()).sum()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Signal;
    type IntoIter = std::slice::Iter<'a, Signal>;

    fn into_iter(self) -> Self::IntoIter {
        self.signals.iter()
    }
}

/// Index of a signal inside the timeline under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SignalIdx(usize);

/// The only way to mutate a timeline. Consumed once parsing is done.
#[derive(Debug, Default)]
pub(crate) struct TimelineBuilder {
    signals: Vec<Signal>,
    /// maps every symbol to the first signal that declared it
    symbols: FxHashMap<String, SignalIdx>,
}

impl TimelineBuilder {
    pub fn add_signal(&mut self, signal: Signal) -> SignalIdx {
        let idx = SignalIdx(self.signals.len());
        // aliased symbols keep pointing to the first declaration
        self.symbols.entry(signal.symbol.clone()).or_insert(idx);
        self.signals.push(signal);
        idx
    }

    pub fn lookup(&self, symbol: &str) -> Option<SignalIdx> {
        self.symbols.get(symbol).copied()
    }

    pub fn signal(&self, idx: SignalIdx) -> &Signal {
        &self.signals[idx.0]
    }

    pub fn add_datapoint(&mut self, idx: SignalIdx, datapoint: Datapoint) {
        self.signals[idx.0].push(datapoint);
    }

    pub fn finish(self) -> Timeline {
        Timeline {
            signals: self.signals,
        }
    }
}
