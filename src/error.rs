//! Crate-wide error types.

use thiserror::Error;

pub type WasmperfResult<T> = Result<T, WasmperfError>;

#[derive(Debug, Error)]
pub enum WasmperfError {
    #[error("malformed trace at line {line}: expected {expected}, got {content:?}")]
    MalformedTrace {
        line: usize,
        expected: String,
        content: String,
    },

    #[error("truncated trace: stream ended inside {section}")]
    TruncatedTrace { section: String },

    #[error("incomplete summary for run {run:?}: missing or non-numeric key {key:?}")]
    IncompleteSummary { run: String, key: String },

    #[error(
        "degenerate sample in run {run:?}: time {time} at index {index} does not advance past {previous}"
    )]
    DegenerateSample {
        run: String,
        index: usize,
        previous: u64,
        time: u64,
    },

    #[error("run {run:?} has {count} progress samples; performance derivation needs at least 2")]
    EmptyProgress { run: String, count: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("report error: {0}")]
    Report(String),
}
