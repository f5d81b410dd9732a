//! Comparative stacked-bar report across execution environments.

use serde::Serialize;

use std::collections::BTreeMap;

use crate::{RunAnalysis, RunSummary};

/// Fixed display colors, matching the established report palette.
pub const ENVIRONMENT_COLORS: &[(&str, &str)] = &[
    ("native", "gray"),
    ("d8", "cornflowerblue"),
    ("chrome", "lightsteelblue"),
    ("node", "darkorange"),
    ("mozjs", "coral"),
    ("firefox", "crimson"),
];

pub fn environment_color(environment: &str) -> Option<&'static str> {
    ENVIRONMENT_COLORS
        .iter()
        .find(|(env, _)| *env == environment)
        .map(|(_, color)| *color)
}

/// One environment's bar in both stacked charts: the performance stack
/// (`base_performance` topped by `additional_performance`) and the timing
/// stack (`start_up_s` topped by `warm_up_s`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportBar {
    pub profile: String,
    pub environment: String,
    pub position: usize,
    #[serde(rename = "basePerformance")]
    pub base_performance: f64,
    #[serde(rename = "additionalPerformance")]
    pub additional_performance: f64,
    #[serde(rename = "startUpS")]
    pub start_up_s: f64,
    #[serde(rename = "warmUpS")]
    pub warm_up_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

/// Axis tick at one profile's midpoint, carrying the scale its bars were
/// normalized by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileTick {
    pub profile: String,
    pub position: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeReport {
    pub bars: Vec<ReportBar>,
    pub ticks: Vec<ProfileTick>,
    /// environment → color, for environments with a known color only.
    pub legend: BTreeMap<String, String>,
}

/// One environment's analyzed trace contributing to a profile group.
pub struct ProfileRun<'a> {
    pub environment: String,
    pub analysis: &'a RunAnalysis,
}

/// Accumulates profile groups into one [`ComparativeReport`]. Bars are
/// positioned contiguously within a profile with a one-slot gap between
/// profiles.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    bars: Vec<ReportBar>,
    ticks: Vec<ProfileTick>,
    legend: BTreeMap<String, String>,
    position: usize,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalization scale for one profile: the baseline environment's
    /// peak performance, or 1 if the baseline is absent or unusable.
    pub fn profile_scale(profile: &str, baseline: &str, runs: &[ProfileRun<'_>]) -> f64 {
        let peak = runs
            .iter()
            .find(|run| run.environment == baseline)
            .and_then(|run| run.analysis.summary(profile))
            .map(|summary| summary.peak_performance);
        match peak {
            Some(peak) if peak.is_finite() && peak > 0.0 => peak,
            Some(peak) => {
                tracing::warn!(
                    "baseline {baseline:?} for profile {profile:?} has unusable peak performance {peak}; scaling by 1"
                );
                1.0
            }
            None => 1.0,
        }
    }

    /// Adds one profile's environments, baseline first. Environments
    /// whose trace has no run named after the profile are omitted with a
    /// warning rather than failing the report.
    pub fn push_profile(&mut self, profile: &str, baseline: &str, runs: &[ProfileRun<'_>]) {
        let scale = Self::profile_scale(profile, baseline, runs);
        let start = self.position;
        let ordered = runs
            .iter()
            .filter(|run| run.environment == baseline)
            .chain(runs.iter().filter(|run| run.environment != baseline));
        for run in ordered {
            let Some(summary) = run.analysis.summary(profile) else {
                tracing::warn!(
                    "trace for environment {:?} has no run {profile:?}; omitting from report",
                    run.environment
                );
                continue;
            };
            self.bars
                .push(make_bar(profile, &run.environment, self.position, summary, scale));
            if let Some(color) = environment_color(&run.environment) {
                self.legend.insert(run.environment.clone(), color.to_string());
            }
            self.position += 1;
        }
        if self.position == start {
            tracing::warn!("profile {profile:?} has no usable runs; omitting from report");
            return;
        }
        self.ticks.push(ProfileTick {
            profile: profile.to_string(),
            position: (start + self.position - 1) as f64 / 2.0,
            scale,
        });
        self.position += 1;
    }

    pub fn finish(self) -> ComparativeReport {
        ComparativeReport {
            bars: self.bars,
            ticks: self.ticks,
            legend: self.legend,
        }
    }
}

fn make_bar(
    profile: &str,
    environment: &str,
    position: usize,
    summary: &RunSummary,
    scale: f64,
) -> ReportBar {
    let start_up_share = if summary.duration == 0 {
        0.0
    } else {
        summary.effective_start_up_time as f64 / summary.duration as f64
    };
    let base_performance = summary.peak_performance * (1.0 - start_up_share) / scale;
    ReportBar {
        profile: profile.to_string(),
        environment: environment.to_string(),
        position,
        base_performance,
        additional_performance: summary.peak_performance / scale - base_performance,
        start_up_s: summary.start_up_time as f64 / 1000.0,
        warm_up_s: summary.warm_up_time as f64 / 1000.0,
        color: environment_color(environment),
    }
}
