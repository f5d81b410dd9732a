//! Per-trace analysis: derived performance and normalized plot projections.

use serde::Serialize;

use crate::{
    ProgressSample, RunSummary, Trace, TraceEvent, TraceInterval, WasmperfError, WasmperfResult,
    instantaneous_performance,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Dashed,
    Solid,
}

/// One plot curve: `(seconds, normalized performance)` points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub style: LineStyle,
    pub points: Vec<(f64, f64)>,
}

/// Plot-ready projection of one run: the dashed idealized ramp from the
/// summary and the solid observed curve from the derived samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotProjection {
    pub run: String,
    pub scale: f64,
    pub ideal: Curve,
    pub observed: Curve,
}

/// Owns one parsed trace. Performance is derived once for every run at
/// construction and cached into the samples; the analysis is read-only
/// afterwards and safe to share across report consumers.
#[derive(Debug)]
pub struct RunAnalysis {
    trace: Trace,
}

impl RunAnalysis {
    pub fn new(mut trace: Trace) -> WasmperfResult<Self> {
        for (run_id, run) in &mut trace.runs {
            let derived = instantaneous_performance(run_id, &run.progress)?;
            for (sample, value) in run.progress.iter_mut().zip(derived) {
                sample.performance = Some(value);
            }
        }
        Ok(Self { trace })
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.trace.events
    }

    pub fn intervals(&self) -> &[TraceInterval] {
        &self.trace.intervals
    }

    pub fn run_ids(&self) -> impl Iterator<Item = &str> {
        self.trace.runs.keys().map(String::as_str)
    }

    pub fn summary(&self, run_id: &str) -> Option<&RunSummary> {
        self.trace.runs.get(run_id).map(|run| &run.summary)
    }

    pub fn progress(&self, run_id: &str) -> Option<&[ProgressSample]> {
        self.trace.runs.get(run_id).map(|run| run.progress.as_slice())
    }

    /// Projects one run onto plot coordinates: milliseconds become
    /// seconds and performance is divided by `scale` (a reference peak
    /// performance; passing the run's own peak puts its plateau at 1.0).
    pub fn projection(&self, run_id: &str, scale: f64) -> WasmperfResult<PlotProjection> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(WasmperfError::InvalidArgument(format!(
                "scale must be a positive number, got {scale}"
            )));
        }
        let run = self.trace.runs.get(run_id).ok_or_else(|| {
            WasmperfError::Report(format!("no run {run_id:?} in trace"))
        })?;
        let summary = &run.summary;
        let plateau = summary.peak_performance / scale;
        let ideal = Curve {
            style: LineStyle::Dashed,
            points: vec![
                (0.0, 0.0),
                (summary.start_up_time as f64 / 1000.0, 0.0),
                (
                    (summary.start_up_time + summary.warm_up_time) as f64 / 1000.0,
                    plateau,
                ),
                (summary.duration as f64 / 1000.0, plateau),
            ],
        };
        let observed = Curve {
            style: LineStyle::Solid,
            points: run
                .progress
                .iter()
                .map(|sample| {
                    (
                        sample.time_ms as f64 / 1000.0,
                        sample.performance.unwrap_or(0.0) / scale,
                    )
                })
                .collect(),
        };
        Ok(PlotProjection {
            run: run_id.to_string(),
            scale,
            ideal,
            observed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunTrace;

    fn single_run_trace(run_id: &str, points: &[(u64, f64)], summary: RunSummary) -> Trace {
        let mut trace = Trace::default();
        trace.runs.insert(
            run_id.to_string(),
            RunTrace {
                progress: points
                    .iter()
                    .map(|&(time_ms, work)| ProgressSample {
                        time_ms,
                        work,
                        performance: None,
                    })
                    .collect(),
                summary,
            },
        );
        trace
    }

    fn summary() -> RunSummary {
        RunSummary {
            start_up_time: 500,
            warm_up_time: 1500,
            effective_start_up_time: 1000,
            duration: 3000,
            initial_performance: 10.0,
            peak_performance: 20.0,
        }
    }

    #[test]
    fn construction_caches_derived_performance() {
        let trace = single_run_trace("runs", &[(0, 0.0), (1, 10.0), (2, 25.0), (3, 40.0)], summary());
        let analysis = RunAnalysis::new(trace).expect("analysis");
        let derived: Vec<f64> = analysis
            .progress("runs")
            .expect("progress")
            .iter()
            .map(|s| s.performance.expect("derived"))
            .collect();
        assert_eq!(derived, vec![10.0, 12.5, 15.0, 15.0]);
    }

    #[test]
    fn single_sample_run_fails_construction() {
        let trace = single_run_trace("runs", &[(10, 5.0)], summary());
        match RunAnalysis::new(trace) {
            Err(WasmperfError::EmptyProgress { run, count }) => {
                assert_eq!(run, "runs");
                assert_eq!(count, 1);
            }
            other => panic!("expected EmptyProgress, got {other:?}"),
        }
    }

    #[test]
    fn projection_builds_the_ideal_ramp_in_seconds() {
        let trace = single_run_trace("runs", &[(0, 0.0), (1000, 10.0), (2000, 30.0)], summary());
        let analysis = RunAnalysis::new(trace).expect("analysis");
        let projection = analysis.projection("runs", 10.0).expect("projection");
        assert_eq!(projection.ideal.style, LineStyle::Dashed);
        assert_eq!(
            projection.ideal.points,
            vec![(0.0, 0.0), (0.5, 0.0), (2.0, 2.0), (3.0, 2.0)]
        );
        assert_eq!(projection.observed.style, LineStyle::Solid);
        assert_eq!(projection.observed.points.len(), 3);
        let (x, y) = projection.observed.points[0];
        assert_eq!(x, 0.0);
        assert!((y - 0.001).abs() < 1e-12);
    }

    #[test]
    fn normalizing_by_own_peak_puts_the_plateau_at_one() {
        let trace = single_run_trace("runs", &[(0, 0.0), (1000, 10.0), (2000, 30.0)], summary());
        let analysis = RunAnalysis::new(trace).expect("analysis");
        let projection = analysis
            .projection("runs", summary().peak_performance)
            .expect("projection");
        assert_eq!(projection.ideal.points[2].1, 1.0);
        assert_eq!(projection.ideal.points[3].1, 1.0);
    }

    #[test]
    fn unknown_run_and_bad_scale_are_rejected() {
        let trace = single_run_trace("runs", &[(0, 0.0), (1000, 10.0)], summary());
        let analysis = RunAnalysis::new(trace).expect("analysis");
        assert!(matches!(
            analysis.projection("other", 1.0),
            Err(WasmperfError::Report(_))
        ));
        assert!(matches!(
            analysis.projection("runs", 0.0),
            Err(WasmperfError::InvalidArgument(_))
        ));
    }
}
