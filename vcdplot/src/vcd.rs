// Copyright 2023-2024 The Regents of the University of California
// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//
// Line based parser for the subset of VCD that we are able to plot.

use crate::timeline::{
    Datapoint, Signal, Time, Timeline, TimelineBuilder, Value, SINGLE_BIT_RANGE,
};
use crate::{LoadOptions, Result, VcdPlotError};
use std::fmt::{Display, Formatter};

const VCD_VAR: &str = "$var";
const VCD_END: &str = "$end";
const VCD_VAR_PREFIX: &str = "$var ";
const VCD_KEYWORD_START: char = '$';
const VCD_TIME_START: char = '#';
const VCD_VECTOR_START: char = 'b';
/// raw value dumps are indented with a tab, we do not model them
const VCD_RAW_DUMP_START: char = '\t';

/// Problems that only affect a single line. The parser reports them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DiagnosticKind {
    #[error("[vcd] attempt to parse variable declaration from incompatible line")]
    NotADeclaration,
    #[error("[vcd] expected at least 5 tokens in variable declaration, found {0}")]
    TooFewTokens(usize),
    #[error("[vcd] failed to parse variable bitwidth: `{0}`")]
    InvalidBitwidth(String),
    #[error("[vcd] missing bit range for {0}-bit variable")]
    MissingRange(u32),
    #[error("[vcd] expected `$end` token after variable declaration, found `{0}`")]
    MissingEnd(String),
    #[error("[vcd] unexpected extra tokens: {0}")]
    ExtraTokens(String),
    #[error("[vcd] expected a value and an id in vector value change: `{0}`")]
    TruncatedVectorChange(String),
    #[error("[vcd] expected an id for a value change, but did not find one: `{0}`")]
    TruncatedScalarChange(String),
    #[error("[vcd] value change for undeclared id `{0}`")]
    UnknownSymbol(String),
    #[error("[vcd] unexpected token in VCD body: `{0}`")]
    UnrecognizedLine(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Result of a successful parse: the timeline and everything that was skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub timeline: Timeline,
    pub diagnostics: Vec<Diagnostic>,
}

/// Syntactic category of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Declaration(&'a str),
    /// header sections and dump commands, e.g., `$scope` or `$dumpvars`
    Keyword,
    RawDump,
    Timestamp(&'a str),
    /// everything after the leading `b`
    VectorChange(&'a str),
    /// complete line, starting with the value character
    ScalarChange(&'a str),
    Unrecognized(&'a str),
}

#[inline]
fn is_scalar_value(c: char) -> bool {
    matches!(
        c,
        '0' | '1'
            | 'z'
            | 'Z'
            | 'x'
            | 'X'
            | 'h'
            | 'H'
            | 'u'
            | 'U'
            | 'w'
            | 'W'
            | 'l'
            | 'L'
            | '-'
    )
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.starts_with(VCD_VAR_PREFIX) {
        return Line::Declaration(line);
    }
    let first = line.chars().next().unwrap_or(' ');
    match first {
        VCD_KEYWORD_START => Line::Keyword,
        VCD_RAW_DUMP_START => Line::RawDump,
        VCD_TIME_START => Line::Timestamp(&line[1..]),
        VCD_VECTOR_START => Line::VectorChange(&line[1..]),
        c if is_scalar_value(c) => Line::ScalarChange(line),
        _ => Line::Unrecognized(line),
    }
}

/// Parses a `$var <kind> <bitwidth> <symbol> <label> [<range>] $end` line.
/// Returns the declared signal, if any, and all problems found.
/// Problems with the `$end` token or extra tokens do not invalidate the declaration.
pub fn parse_declaration(line: &str) -> (Option<Signal>, Vec<DiagnosticKind>) {
    let mut problems = Vec::new();
    // split on single spaces, consecutive spaces result in empty tokens
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens[0] != VCD_VAR {
        problems.push(DiagnosticKind::NotADeclaration);
        return (None, problems);
    }
    if tokens.len() < 5 {
        problems.push(DiagnosticKind::TooFewTokens(tokens.len()));
        return (None, problems);
    }

    let kind = tokens[1];
    let bitwidth = match tokens[2].parse::<u32>() {
        Ok(width) if width > 0 => width,
        _ => {
            problems.push(DiagnosticKind::InvalidBitwidth(tokens[2].to_string()));
            return (None, problems);
        }
    };
    let symbol = tokens[3];
    let label = tokens[4];

    let (range, end_index) = if bitwidth == 1 {
        (SINGLE_BIT_RANGE.to_string(), 5)
    } else {
        match tokens.get(5).filter(|t| **t != VCD_END) {
            Some(range) => (range.to_string(), 6),
            None => {
                problems.push(DiagnosticKind::MissingRange(bitwidth));
                (format!("[{}:0]", bitwidth - 1), 5)
            }
        }
    };

    match tokens.get(end_index) {
        Some(&VCD_END) => {}
        other => problems.push(DiagnosticKind::MissingEnd(
            other.map(|t| t.to_string()).unwrap_or_default(),
        )),
    }

    if tokens.len() > end_index + 1 {
        problems.push(DiagnosticKind::ExtraTokens(tokens[end_index + 1..].join(" ")));
    }

    let signal = Signal::new(
        kind.to_string(),
        bitwidth,
        symbol.to_string(),
        label.to_string(),
        range,
    );
    (Some(signal), problems)
}

/// Accepts integers as well as decimals with an all zero fraction, as some generators emit `#10.0`.
fn parse_time(token: &str) -> Option<Time> {
    let integer = match token.split_once('.') {
        Some((integer, fraction)) if fraction.bytes().all(|b| b == b'0') => integer,
        Some(_) => return None,
        None => token,
    };
    // u64::from_str would accept a leading `+`
    if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    integer.parse::<u64>().ok()
}

/// State that is carried from one line to the next.
#[derive(Debug, Default)]
struct ParserState {
    time: Time,
    line: usize,
    builder: TimelineBuilder,
    diagnostics: Vec<Diagnostic>,
}

impl ParserState {
    fn report(&mut self, kind: DiagnosticKind) {
        log::warn!("line {}: {}", self.line, kind);
        self.diagnostics.push(Diagnostic {
            line: self.line,
            kind,
        });
    }

    fn apply(&mut self, line: Line<'_>) -> Result<()> {
        match line {
            Line::Blank | Line::Keyword | Line::RawDump => {}
            Line::Declaration(text) => {
                let (signal, problems) = parse_declaration(text);
                for problem in problems {
                    self.report(problem);
                }
                if let Some(signal) = signal {
                    log::debug!(
                        "Found signal declaration on line {}: {}",
                        self.line,
                        signal.label()
                    );
                    self.builder.add_signal(signal);
                }
            }
            Line::Timestamp(token) => match parse_time(token.trim_end()) {
                Some(time) => self.time = time,
                None => {
                    return Err(VcdPlotError::InvalidTimestamp {
                        line: self.line,
                        token: token.to_string(),
                    })
                }
            },
            Line::VectorChange(rest) => {
                let tokens: Vec<&str> = rest.split_whitespace().collect();
                if tokens.len() < 2 {
                    self.report(DiagnosticKind::TruncatedVectorChange(format!("b{rest}")));
                    return Ok(());
                }
                if tokens.len() > 2 {
                    self.report(DiagnosticKind::ExtraTokens(tokens[2..].join(" ")));
                }
                self.value_change(Value::Vector(tokens[0].to_string()), tokens[1]);
            }
            Line::ScalarChange(text) => {
                let text = text.trim_end();
                let mut chars = text.chars();
                match chars.next() {
                    Some(value) if !chars.as_str().is_empty() => {
                        self.value_change(Value::Scalar(value), chars.as_str());
                    }
                    _ => self.report(DiagnosticKind::TruncatedScalarChange(text.to_string())),
                }
            }
            Line::Unrecognized(text) => {
                self.report(DiagnosticKind::UnrecognizedLine(text.to_string()));
            }
        }
        Ok(())
    }

    fn value_change(&mut self, value: Value, symbol: &str) {
        match self.builder.lookup(symbol) {
            Some(idx) => {
                debug_assert_eq!(self.builder.signal(idx).symbol(), symbol);
                self.builder
                    .add_datapoint(idx, Datapoint::new(self.time, value));
            }
            None => self.report(DiagnosticKind::UnknownSymbol(symbol.to_string())),
        }
    }

    fn finish(self) -> Parsed {
        Parsed {
            timeline: self.builder.finish(),
            diagnostics: self.diagnostics,
        }
    }
}

/// Parses a complete dump. Only malformed time stamps abort the parse,
/// all other problems are recorded in [`Parsed::diagnostics`].
pub fn parse_str(input: &str, options: &LoadOptions) -> Result<Parsed> {
    let limit = options.max_lines.unwrap_or(usize::MAX);
    let state = input.lines().enumerate().take(limit).try_fold(
        ParserState::default(),
        |mut state, (ii, line)| {
            state.line = ii + 1;
            state.apply(classify(line))?;
            Ok::<_, VcdPlotError>(state)
        },
    )?;
    if let Some(max_lines) = options.max_lines {
        if input.lines().nth(max_lines).is_some() {
            log::info!("Stopped parsing after {max_lines} lines.");
        }
    }
    log::info!("Finished importing {} lines.", state.line);
    Ok(state.finish())
}
