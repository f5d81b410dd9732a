//! Self-describing JSON artifacts written by the analyze step.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use std::path::Path;

use crate::{ComparativeReport, Curve, WasmperfResult};

pub const CURVES_SCHEMA_VERSION: &str = "wasmperf.curves.v1";
pub const REPORT_SCHEMA_VERSION: &str = "wasmperf.report.v1";
pub const OVERVIEW_SCHEMA_VERSION: &str = "wasmperf.overview.v1";

/// Per-profile plot dataset: one dashed/solid curve pair per environment,
/// normalized by the profile scale.
#[derive(Debug, Clone, Serialize)]
pub struct CurvesArtifact {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    pub benchmark: String,
    pub profile: String,
    pub scale: f64,
    pub series: Vec<CurveSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurveSeries {
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    pub ideal: Curve,
    pub observed: Curve,
}

/// Benchmark-wide comparative dataset feeding the stacked bar charts.
#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifact {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    pub benchmark: String,
    pub baseline: String,
    #[serde(flatten)]
    pub report: ComparativeReport,
}

/// Index of one analyze invocation: inputs (content-addressed), outputs,
/// and anything skipped or suspicious along the way.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewArtifact {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    #[serde(rename = "reportId")]
    pub report_id: Uuid,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub benchmark: String,
    pub sources: Vec<TraceSource>,
    pub artifacts: Vec<String>,
    pub skipped: Vec<SkippedTrace>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceSource {
    pub path: String,
    pub profile: String,
    pub environment: String,
    pub digest: String,
    pub runs: Vec<String>,
    #[serde(rename = "eventCount")]
    pub event_count: usize,
    #[serde(rename = "intervalCount")]
    pub interval_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTrace {
    pub path: String,
    pub error: String,
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> WasmperfResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn trace_digest(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

pub fn timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
