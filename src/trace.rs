//! Typed records for the recorder's trace text format.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use crate::{WasmperfError, WasmperfResult};

/// One point event, in emission order (not necessarily sorted by time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub time_ms: u64,
    pub event_id: String,
}

/// One closed interval. `begin_ms <= end_ms` is checked at the parse boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInterval {
    pub begin_ms: u64,
    pub end_ms: u64,
    pub interval_id: String,
    pub numeric_id: u64,
}

/// One cumulative-work sample. `performance` is derived after parsing,
/// never read from the trace text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub time_ms: u64,
    pub work: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
}

/// The recorder's summary statistics for one run. All six keys are
/// required; times are integer milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub start_up_time: u64,
    pub warm_up_time: u64,
    pub effective_start_up_time: u64,
    pub duration: u64,
    pub initial_performance: f64,
    pub peak_performance: f64,
}

impl RunSummary {
    pub fn from_json_value(run_id: &str, value: &serde_json::Value) -> WasmperfResult<Self> {
        Ok(Self {
            start_up_time: require_ms(run_id, value, "start_up_time")?,
            warm_up_time: require_ms(run_id, value, "warm_up_time")?,
            effective_start_up_time: require_ms(run_id, value, "effective_start_up_time")?,
            duration: require_ms(run_id, value, "duration")?,
            initial_performance: require_real(run_id, value, "initial_performance")?,
            peak_performance: require_real(run_id, value, "peak_performance")?,
        })
    }
}

/// One named run's progress block and summary.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTrace {
    pub progress: Vec<ProgressSample>,
    pub summary: RunSummary,
}

/// One fully parsed trace file: a shared events/intervals prologue plus
/// zero or more named runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub events: Vec<TraceEvent>,
    pub intervals: Vec<TraceInterval>,
    pub runs: BTreeMap<String, RunTrace>,
}

fn require_ms(run_id: &str, value: &serde_json::Value, key: &str) -> WasmperfResult<u64> {
    let field = value.get(key).ok_or_else(|| incomplete(run_id, key))?;
    field
        .as_u64()
        .or_else(|| {
            field
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
        .ok_or_else(|| incomplete(run_id, key))
}

fn require_real(run_id: &str, value: &serde_json::Value, key: &str) -> WasmperfResult<f64> {
    value
        .get(key)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| incomplete(run_id, key))
}

fn incomplete(run_id: &str, key: &str) -> WasmperfError {
    WasmperfError::IncompleteSummary {
        run: run_id.to_string(),
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_extraction_requires_every_key() {
        let value = serde_json::json!({
            "start_up_time": 120,
            "warm_up_time": 480,
            "effective_start_up_time": 300,
            "duration": 5000,
            "initial_performance": 0.4,
            "peak_performance": 2.5
        });
        let summary = RunSummary::from_json_value("runs", &value).expect("summary");
        assert_eq!(summary.start_up_time, 120);
        assert_eq!(summary.duration, 5000);
        assert_eq!(summary.peak_performance, 2.5);

        for key in [
            "start_up_time",
            "warm_up_time",
            "effective_start_up_time",
            "duration",
            "initial_performance",
            "peak_performance",
        ] {
            let mut pruned = value.clone();
            pruned.as_object_mut().expect("object").remove(key);
            match RunSummary::from_json_value("runs", &pruned) {
                Err(WasmperfError::IncompleteSummary { run, key: missing }) => {
                    assert_eq!(run, "runs");
                    assert_eq!(missing, key);
                }
                other => panic!("expected IncompleteSummary for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn summary_extraction_rejects_non_numeric_values() {
        let value = serde_json::json!({
            "start_up_time": "soon",
            "warm_up_time": 480,
            "effective_start_up_time": 300,
            "duration": 5000,
            "initial_performance": 0.4,
            "peak_performance": 2.5
        });
        match RunSummary::from_json_value("runs", &value) {
            Err(WasmperfError::IncompleteSummary { key, .. }) => {
                assert_eq!(key, "start_up_time");
            }
            other => panic!("expected IncompleteSummary, got {other:?}"),
        }
    }
}
