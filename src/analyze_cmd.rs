//! CLI analyze command (`wasmperf analyze ...`).

use clap::Args;
use uuid::Uuid;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{
    CURVES_SCHEMA_VERSION, Config, CurveSeries, CurvesArtifact, OVERVIEW_SCHEMA_VERSION,
    OverviewArtifact, ProfileRun, REPORT_SCHEMA_VERSION, ReportArtifact, ReportBuilder,
    RunAnalysis, SkippedTrace, Trace, TraceSource, WasmperfError, WasmperfResult,
    environment_color, find_trace_files, fit_ramp, refit_deviation, split_trace_stem,
    timestamp_rfc3339, trace_digest, write_json,
};

/// Recorded peak performance further than this from a refit of the
/// samples gets flagged in the overview.
const PEAK_REFIT_TOLERANCE: f64 = 0.10;

#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    /// Benchmark name; traces are read from `<out_dir>/<name>` unless
    /// --dir is given.
    pub benchmark: String,

    /// Directory containing `<profile>_<environment>.txt` trace files.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Baseline environment overriding the configured one.
    #[arg(long)]
    pub baseline: Option<String>,

    /// Glob pattern(s) selecting trace file names.
    #[arg(long = "select")]
    pub select: Vec<String>,

    /// Output directory for report artifacts (defaults to the trace
    /// directory).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug)]
struct ParsedTrace {
    environment: String,
    analysis: RunAnalysis,
}

pub fn analyze_command(config: &Config, cmd: &AnalyzeCommand) -> WasmperfResult<serde_json::Value> {
    let dir = cmd
        .dir
        .clone()
        .unwrap_or_else(|| config.benchmark_dir(&cmd.benchmark));
    let baseline = cmd.baseline.as_deref().unwrap_or(&config.baseline);
    let out_dir = cmd.out.clone().unwrap_or_else(|| dir.clone());

    let paths = find_trace_files(&dir, &cmd.select)?;
    if paths.is_empty() {
        return Err(WasmperfError::Report(format!(
            "no trace files found under {}",
            dir.display()
        )));
    }

    let mut profiles: BTreeMap<String, Vec<ParsedTrace>> = BTreeMap::new();
    let mut sources = Vec::new();
    let mut skipped = Vec::new();
    let mut warnings = Vec::new();

    for path in &paths {
        let disp = path.display().to_string();
        let Some((profile, environment)) = split_trace_stem(path) else {
            tracing::warn!("{} does not match <profile>_<environment>.txt; skipping", disp);
            skipped.push(SkippedTrace {
                path: disp,
                error: "file name does not match <profile>_<environment>.txt".to_string(),
            });
            continue;
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("failed to read {}: {err}", disp);
                skipped.push(SkippedTrace {
                    path: disp,
                    error: err.to_string(),
                });
                continue;
            }
        };
        // One environment's bad trace must not take down the others.
        let analysis = match Trace::parse_str(&text).and_then(RunAnalysis::new) {
            Ok(analysis) => analysis,
            Err(err) => {
                tracing::warn!("failed to analyze {}: {err}", disp);
                skipped.push(SkippedTrace {
                    path: disp,
                    error: err.to_string(),
                });
                continue;
            }
        };

        let run_ids: Vec<String> = analysis.run_ids().map(str::to_string).collect();
        for run_id in &run_ids {
            let (Some(summary), Some(progress)) =
                (analysis.summary(run_id), analysis.progress(run_id))
            else {
                continue;
            };
            match fit_ramp(run_id, progress) {
                Ok(fit) => {
                    let deviation = refit_deviation(summary, &fit);
                    if deviation > PEAK_REFIT_TOLERANCE {
                        let message = format!(
                            "{disp}: recorded peak performance for run {run_id:?} is {:.1}% away from a refit of its samples",
                            deviation * 100.0
                        );
                        tracing::warn!("{message}");
                        warnings.push(message);
                    }
                }
                Err(err) => {
                    warnings.push(format!("{disp}: refit failed for run {run_id:?}: {err}"));
                }
            }
        }

        sources.push(TraceSource {
            path: disp,
            profile: profile.clone(),
            environment: environment.clone(),
            digest: trace_digest(&text),
            runs: run_ids,
            event_count: analysis.events().len(),
            interval_count: analysis.intervals().len(),
        });
        profiles.entry(profile).or_default().push(ParsedTrace {
            environment,
            analysis,
        });
    }

    let mut builder = ReportBuilder::new();
    let mut artifacts = Vec::new();
    for (profile, parsed) in &profiles {
        let mut ordered: Vec<&ParsedTrace> = parsed.iter().collect();
        ordered.sort_by(|a, b| {
            (a.environment != *baseline)
                .cmp(&(b.environment != *baseline))
                .then_with(|| a.environment.cmp(&b.environment))
        });
        let runs: Vec<ProfileRun<'_>> = ordered
            .iter()
            .map(|parsed| ProfileRun {
                environment: parsed.environment.clone(),
                analysis: &parsed.analysis,
            })
            .collect();

        let scale = ReportBuilder::profile_scale(profile, baseline, &runs);
        let mut series = Vec::new();
        for run in &runs {
            match run.analysis.projection(profile, scale) {
                Ok(projection) => series.push(CurveSeries {
                    environment: run.environment.clone(),
                    color: environment_color(&run.environment),
                    ideal: projection.ideal,
                    observed: projection.observed,
                }),
                Err(err) => {
                    let message = format!(
                        "no curves for environment {:?} in profile {profile:?}: {err}",
                        run.environment
                    );
                    tracing::warn!("{message}");
                    warnings.push(message);
                }
            }
        }
        builder.push_profile(profile, baseline, &runs);

        let curves = CurvesArtifact {
            schema_version: CURVES_SCHEMA_VERSION.to_string(),
            benchmark: cmd.benchmark.clone(),
            profile: profile.clone(),
            scale,
            series,
        };
        let curves_path = out_dir.join(format!("{profile}.curves.json"));
        write_json(&curves_path, &curves)?;
        artifacts.push(curves_path.display().to_string());
    }

    let report = ReportArtifact {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        benchmark: cmd.benchmark.clone(),
        baseline: baseline.to_string(),
        report: builder.finish(),
    };
    let report_path = out_dir.join("report.json");
    write_json(&report_path, &report)?;
    artifacts.push(report_path.display().to_string());

    let overview = OverviewArtifact {
        schema_version: OVERVIEW_SCHEMA_VERSION.to_string(),
        report_id: Uuid::new_v4(),
        generated_at: timestamp_rfc3339(),
        benchmark: cmd.benchmark.clone(),
        sources,
        artifacts,
        skipped,
        warnings,
    };
    let overview_path = out_dir.join("overview.json");
    write_json(&overview_path, &overview)?;

    Ok(serde_json::json!({
        "schemaVersion": "wasmperf.analyze_result.v1",
        "benchmark": cmd.benchmark,
        "baseline": baseline,
        "profiles": profiles.keys().cloned().collect::<Vec<_>>(),
        "sources": overview.sources.len(),
        "skipped": overview.skipped.len(),
        "warnings": overview.warnings.len(),
        "artifacts": overview.artifacts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wasmperf-analyze-{name}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    fn trace_text(work_per_100ms: f64) -> String {
        let peak = work_per_100ms / 100.0;
        let progress: String = (0..=4)
            .map(|i| format!("{}\t{}\n", i * 100, work_per_100ms * i as f64))
            .collect();
        format!(
            "[EVENTS]\n0\tmain entered\n\n[INTERVALS]\n0\t40\tcompile\t1\n\n\
             [PROGRESS runs]\n{progress}\n\
             {{\"start_up_time\": 0, \"warm_up_time\": 0, \"effective_start_up_time\": 0, \
             \"duration\": 400, \"initial_performance\": {peak}, \"peak_performance\": {peak}}}\n\n"
        )
    }

    #[test]
    fn analyze_writes_report_curves_and_overview() {
        let dir = temp_dir("full");
        std::fs::write(dir.join("runs_native.txt"), trace_text(10.0)).expect("write native");
        std::fs::write(dir.join("runs_d8.txt"), trace_text(5.0)).expect("write d8");
        std::fs::write(dir.join("runs_mozjs.txt"), "not a trace\n").expect("write bad");

        let config = Config::default();
        let cmd = AnalyzeCommand {
            benchmark: "zlib".to_string(),
            dir: Some(dir.clone()),
            baseline: None,
            select: Vec::new(),
            out: None,
        };
        let result = analyze_command(&config, &cmd).expect("analyze");
        assert_eq!(result["benchmark"], "zlib");
        assert_eq!(result["baseline"], "native");
        assert_eq!(result["sources"], 2);
        assert_eq!(result["skipped"], 1);

        let report: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.join("report.json")).expect("report written"),
        )
        .expect("report json");
        assert_eq!(report["schemaVersion"], "wasmperf.report.v1");
        let bars = report["bars"].as_array().expect("bars");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0]["environment"], "native");
        assert_eq!(bars[0]["basePerformance"], 1.0);
        assert_eq!(bars[1]["environment"], "d8");
        assert_eq!(bars[1]["basePerformance"], 0.5);
        assert_eq!(report["ticks"][0]["position"], 0.5);
        assert!(report["legend"].get("mozjs").is_none());

        let curves: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.join("runs.curves.json")).expect("curves written"),
        )
        .expect("curves json");
        assert_eq!(curves["profile"], "runs");
        assert_eq!(curves["series"].as_array().expect("series").len(), 2);
        assert_eq!(curves["series"][0]["ideal"]["style"], "dashed");
        assert_eq!(curves["series"][0]["observed"]["style"], "solid");

        let overview: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.join("overview.json")).expect("overview written"),
        )
        .expect("overview json");
        assert_eq!(overview["benchmark"], "zlib");
        assert_eq!(overview["sources"].as_array().expect("sources").len(), 2);
        assert_eq!(overview["skipped"].as_array().expect("skipped").len(), 1);
        assert_eq!(overview["sources"][0]["eventCount"], 1);
        assert_eq!(overview["sources"][0]["intervalCount"], 1);
        assert_eq!(
            overview["sources"][0]["digest"],
            crate::trace_digest(&trace_text(5.0))
        );
    }

    #[test]
    fn analyze_without_traces_is_a_report_error() {
        let dir = temp_dir("empty");
        let config = Config::default();
        let cmd = AnalyzeCommand {
            benchmark: "zlib".to_string(),
            dir: Some(dir),
            baseline: None,
            select: Vec::new(),
            out: None,
        };
        assert!(matches!(
            analyze_command(&config, &cmd),
            Err(WasmperfError::Report(_))
        ));
    }

    #[test]
    fn select_narrows_the_analyzed_traces() {
        let dir = temp_dir("select");
        std::fs::write(dir.join("runs_native.txt"), trace_text(10.0)).expect("write native");
        std::fs::write(dir.join("runs_d8.txt"), trace_text(5.0)).expect("write d8");

        let config = Config::default();
        let cmd = AnalyzeCommand {
            benchmark: "zlib".to_string(),
            dir: Some(dir.clone()),
            baseline: None,
            select: vec!["*_native.txt".to_string()],
            out: None,
        };
        let result = analyze_command(&config, &cmd).expect("analyze");
        assert_eq!(result["sources"], 1);

        let report: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.join("report.json")).expect("report written"),
        )
        .expect("report json");
        assert_eq!(report["bars"].as_array().expect("bars").len(), 1);
    }
}
