//! Streaming reader for the recorder's trace text.
//!
//! The format is strictly line-oriented: an `[EVENTS]` block, an
//! `[INTERVALS]` block, then zero or more `[PROGRESS <run>]` blocks each
//! followed by a JSON summary object, every block terminated by a blank
//! line. The reader is a single-pass state machine fed one line at a
//! time, so it can consume a non-seekable stream and be tested without a
//! real file.

use std::collections::BTreeMap;
use std::path::Path;

use crate::{
    ProgressSample, RunSummary, RunTrace, Trace, TraceEvent, TraceInterval, WasmperfError,
    WasmperfResult,
};

const EVENTS_HEADER: &str = "[EVENTS]";
const INTERVALS_HEADER: &str = "[INTERVALS]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    EventsHeader,
    IntervalsHeader,
    ProgressHeader(&'a str),
    Data(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    if line.is_empty() {
        return LineKind::Blank;
    }
    if line == EVENTS_HEADER {
        return LineKind::EventsHeader;
    }
    if line == INTERVALS_HEADER {
        return LineKind::IntervalsHeader;
    }
    if let Some(run_id) = line
        .strip_prefix("[PROGRESS ")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        if !run_id.is_empty() {
            return LineKind::ProgressHeader(run_id);
        }
    }
    LineKind::Data(line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    ExpectEvents,
    InEvents,
    ExpectIntervals,
    InIntervals,
    ExpectProgressHeaderOrEnd,
    InProgress,
    InSummary,
}

/// Incremental trace parser. Feed lines with [`push_line`](Self::push_line)
/// and close the stream with [`finish`](Self::finish).
#[derive(Debug)]
pub struct TraceReader {
    state: ReaderState,
    line_no: usize,
    events: Vec<TraceEvent>,
    intervals: Vec<TraceInterval>,
    runs: BTreeMap<String, RunTrace>,
    current_run: String,
    current_progress: Vec<ProgressSample>,
    summary_buf: String,
}

impl Default for TraceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::ExpectEvents,
            line_no: 0,
            events: Vec::new(),
            intervals: Vec::new(),
            runs: BTreeMap::new(),
            current_run: String::new(),
            current_progress: Vec::new(),
            summary_buf: String::new(),
        }
    }

    pub fn push_line(&mut self, raw: &str) -> WasmperfResult<()> {
        self.line_no += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        match (self.state, classify(line)) {
            (ReaderState::ExpectEvents, LineKind::EventsHeader) => {
                self.state = ReaderState::InEvents;
                Ok(())
            }
            (ReaderState::ExpectEvents, _) => Err(self.malformed("the [EVENTS] header", line)),

            (ReaderState::InEvents, LineKind::Blank) => {
                self.state = ReaderState::ExpectIntervals;
                Ok(())
            }
            (ReaderState::InEvents, LineKind::Data(data)) => {
                let event = self.parse_event(data)?;
                self.events.push(event);
                Ok(())
            }
            (ReaderState::InEvents, _) => {
                Err(self.malformed("an event line or a blank terminator", line))
            }

            (ReaderState::ExpectIntervals, LineKind::IntervalsHeader) => {
                self.state = ReaderState::InIntervals;
                Ok(())
            }
            (ReaderState::ExpectIntervals, _) => {
                Err(self.malformed("the [INTERVALS] header", line))
            }

            (ReaderState::InIntervals, LineKind::Blank) => {
                self.state = ReaderState::ExpectProgressHeaderOrEnd;
                Ok(())
            }
            (ReaderState::InIntervals, LineKind::Data(data)) => {
                let interval = self.parse_interval(data)?;
                self.intervals.push(interval);
                Ok(())
            }
            (ReaderState::InIntervals, _) => {
                Err(self.malformed("an interval line or a blank terminator", line))
            }

            (ReaderState::ExpectProgressHeaderOrEnd, LineKind::ProgressHeader(run_id)) => {
                self.current_run = run_id.to_string();
                self.current_progress = Vec::new();
                self.state = ReaderState::InProgress;
                Ok(())
            }
            (ReaderState::ExpectProgressHeaderOrEnd, _) => {
                Err(self.malformed("a [PROGRESS <run>] header", line))
            }

            (ReaderState::InProgress, LineKind::Blank) => {
                self.summary_buf.clear();
                self.state = ReaderState::InSummary;
                Ok(())
            }
            (ReaderState::InProgress, LineKind::Data(data)) => {
                let sample = self.parse_sample(data)?;
                self.current_progress.push(sample);
                Ok(())
            }
            (ReaderState::InProgress, _) => {
                Err(self.malformed("a progress sample line or a blank terminator", line))
            }

            (ReaderState::InSummary, LineKind::Blank) => {
                if self.summary_buf.is_empty() {
                    return Err(self.malformed("the JSON summary object", line));
                }
                self.finalize_run()?;
                self.state = ReaderState::ExpectProgressHeaderOrEnd;
                Ok(())
            }
            // Any non-blank line is part of the summary object, even one
            // that would classify as a header elsewhere.
            (ReaderState::InSummary, _) => {
                self.summary_buf.push_str(line);
                Ok(())
            }
        }
    }

    /// Closes the stream. A summary block cut off by end-of-stream is
    /// accepted if its JSON is complete; the recorder ends a trace after
    /// the last `}` without a trailing blank line.
    pub fn finish(mut self) -> WasmperfResult<Trace> {
        match self.state {
            ReaderState::ExpectProgressHeaderOrEnd => {}
            ReaderState::InSummary if !self.summary_buf.is_empty() => {
                self.finalize_run()?;
            }
            _ => {
                return Err(WasmperfError::TruncatedTrace {
                    section: self.open_section(),
                });
            }
        }
        Ok(Trace {
            events: self.events,
            intervals: self.intervals,
            runs: self.runs,
        })
    }

    fn finalize_run(&mut self) -> WasmperfResult<()> {
        let value: serde_json::Value = serde_json::from_str(&self.summary_buf)?;
        let summary = RunSummary::from_json_value(&self.current_run, &value)?;
        let run_id = std::mem::take(&mut self.current_run);
        let progress = std::mem::take(&mut self.current_progress);
        self.runs.insert(run_id, RunTrace { progress, summary });
        self.summary_buf.clear();
        Ok(())
    }

    fn parse_event(&self, line: &str) -> WasmperfResult<TraceEvent> {
        let fields = split_limited(line, 2);
        if fields.len() != 2 {
            return Err(self.malformed("an event line (time and event id)", line));
        }
        Ok(TraceEvent {
            time_ms: self.parse_ms(fields[0], "an integer event time", line)?,
            event_id: fields[1].to_string(),
        })
    }

    fn parse_interval(&self, line: &str) -> WasmperfResult<TraceInterval> {
        let fields = split_limited(line, 4);
        if fields.len() != 4 {
            return Err(self.malformed(
                "an interval line (begin, end, interval id, numeric id)",
                line,
            ));
        }
        let begin_ms = self.parse_ms(fields[0], "an integer interval begin time", line)?;
        let end_ms = self.parse_ms(fields[1], "an integer interval end time", line)?;
        if begin_ms > end_ms {
            return Err(self.malformed("an interval with begin_time <= end_time", line));
        }
        Ok(TraceInterval {
            begin_ms,
            end_ms,
            interval_id: fields[2].to_string(),
            numeric_id: self.parse_ms(fields[3], "an integer interval numeric id", line)?,
        })
    }

    fn parse_sample(&self, line: &str) -> WasmperfResult<ProgressSample> {
        let fields = split_limited(line, 2);
        if fields.len() != 2 {
            return Err(self.malformed("a progress sample line (time and work)", line));
        }
        let work: f64 = fields[1]
            .parse()
            .map_err(|_| self.malformed("a real cumulative-work value", line))?;
        Ok(ProgressSample {
            time_ms: self.parse_ms(fields[0], "an integer sample time", line)?,
            work,
            performance: None,
        })
    }

    fn parse_ms(&self, field: &str, expected: &str, line: &str) -> WasmperfResult<u64> {
        field.parse().map_err(|_| self.malformed(expected, line))
    }

    fn malformed(&self, expected: &str, line: &str) -> WasmperfError {
        WasmperfError::MalformedTrace {
            line: self.line_no,
            expected: expected.to_string(),
            content: line.to_string(),
        }
    }

    fn open_section(&self) -> String {
        match self.state {
            ReaderState::ExpectEvents => "the [EVENTS] header".to_string(),
            ReaderState::InEvents => "the [EVENTS] block".to_string(),
            ReaderState::ExpectIntervals => "the [INTERVALS] header".to_string(),
            ReaderState::InIntervals => "the [INTERVALS] block".to_string(),
            ReaderState::InProgress => format!("the [PROGRESS {}] block", self.current_run),
            ReaderState::InSummary => {
                format!("the summary block of [PROGRESS {}]", self.current_run)
            }
            ReaderState::ExpectProgressHeaderOrEnd => "the trace".to_string(),
        }
    }
}

impl Trace {
    pub fn parse_str(text: &str) -> WasmperfResult<Self> {
        let mut reader = TraceReader::new();
        for line in text.lines() {
            reader.push_line(line)?;
        }
        reader.finish()
    }

    pub fn read_file(path: &Path) -> WasmperfResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_str(&text)
    }
}

/// Splits on whitespace runs into at most `limit` fields; the final field
/// keeps its embedded whitespace. Event ids may contain spaces.
fn split_limited(line: &str, limit: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(limit);
    let mut rest = line.trim_start();
    while fields.len() + 1 < limit && !rest.is_empty() {
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                fields.push(&rest[..idx]);
                rest = rest[idx..].trim_start();
            }
            None => {
                fields.push(rest);
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        fields.push(rest);
    }
    fields
}
