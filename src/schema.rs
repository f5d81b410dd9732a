//! Trace-format and artifact introspection for automation and authoring.

use serde::Serialize;

use crate::{
    CURVES_SCHEMA_VERSION, ENVIRONMENT_COLORS, OVERVIEW_SCHEMA_VERSION, REPORT_SCHEMA_VERSION,
};

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDoc {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    /// Trace text sections, in the order they must appear.
    pub sections: Vec<SectionDoc>,
    #[serde(rename = "summaryKeys")]
    pub summary_keys: Vec<&'static str>,
    #[serde(rename = "artifactKinds")]
    pub artifact_kinds: Vec<ArtifactKind>,
    pub environments: Vec<EnvironmentDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDoc {
    pub header: &'static str,
    pub fields: Vec<&'static str>,
    pub terminator: &'static str,
    pub repeats: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactKind {
    pub name: &'static str,
    #[serde(rename = "schemaVersion")]
    pub schema_version: &'static str,
    pub file: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentDoc {
    pub name: &'static str,
    pub color: &'static str,
}

pub fn schema_doc() -> SchemaDoc {
    SchemaDoc {
        schema_version: "wasmperf.schema_doc.v1".to_string(),
        sections: vec![
            SectionDoc {
                header: "[EVENTS]",
                fields: vec!["time_ms", "event_id"],
                terminator: "blank line",
                repeats: false,
            },
            SectionDoc {
                header: "[INTERVALS]",
                fields: vec!["begin_ms", "end_ms", "interval_id", "numeric_id"],
                terminator: "blank line",
                repeats: false,
            },
            SectionDoc {
                header: "[PROGRESS <run>]",
                fields: vec!["time_ms", "work"],
                terminator: "blank line, then a JSON summary object and a blank line",
                repeats: true,
            },
        ],
        summary_keys: vec![
            "start_up_time",
            "warm_up_time",
            "effective_start_up_time",
            "duration",
            "initial_performance",
            "peak_performance",
        ],
        artifact_kinds: vec![
            ArtifactKind {
                name: "curves",
                schema_version: CURVES_SCHEMA_VERSION,
                file: "<profile>.curves.json",
            },
            ArtifactKind {
                name: "report",
                schema_version: REPORT_SCHEMA_VERSION,
                file: "report.json",
            },
            ArtifactKind {
                name: "overview",
                schema_version: OVERVIEW_SCHEMA_VERSION,
                file: "overview.json",
            },
        ],
        environments: ENVIRONMENT_COLORS
            .iter()
            .map(|&(name, color)| EnvironmentDoc { name, color })
            .collect(),
    }
}
