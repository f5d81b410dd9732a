//! Ramp refit: recovering summary statistics from a cumulative-work series.
//!
//! The recorder fits an idealized start-up → warm-up → steady-state ramp
//! to its own samples before printing the summary block. Refitting the
//! parsed samples lets the analyze step cross-check a recorder's output.

use serde::Serialize;

use crate::{ProgressSample, RunSummary, WasmperfError, WasmperfResult, derive};

/// Ramp parameters recovered from `(time, work)` samples. Field meanings
/// match [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RampFit {
    pub start_up_time: u64,
    pub warm_up_time: u64,
    pub effective_start_up_time: u64,
    pub duration: u64,
    pub initial_performance: f64,
    pub peak_performance: f64,
}

pub fn fit_ramp(run_id: &str, samples: &[ProgressSample]) -> WasmperfResult<RampFit> {
    let n = samples.len();
    if n < 2 {
        return Err(WasmperfError::EmptyProgress {
            run: run_id.to_string(),
            count: n,
        });
    }
    derive::ensure_strictly_increasing(run_id, samples)?;

    let initial_performance = samples[1].work / samples[1].time_ms as f64;
    let last = &samples[n - 1];

    if n < 4 {
        // Too short to fit a ramp: steady state is the final pair's slope.
        let prev = &samples[n - 2];
        let slope = (last.work - prev.work) / (last.time_ms - prev.time_ms) as f64;
        return Ok(RampFit {
            start_up_time: prev.time_ms,
            warm_up_time: 0,
            effective_start_up_time: prev.time_ms,
            duration: last.time_ms,
            initial_performance,
            peak_performance: slope,
        });
    }

    // Start-up ends at the sample preceding the first positive-work sample.
    let first_positive = samples.iter().position(|s| s.work > 0.0).unwrap_or(n);
    let start_idx = first_positive.saturating_sub(1).min(n - 1);
    let start_up_time = samples[start_idx].time_ms;

    let mut fit = RampFit {
        start_up_time,
        warm_up_time: 0,
        effective_start_up_time: 0,
        duration: last.time_ms,
        initial_performance,
        peak_performance: 0.0,
    };

    // Scan warm-up candidates from the front. Peak performance is the
    // secant slope to the second-to-last sample (the last one may contain
    // clean-up time); keep the candidate minimizing mean squared error
    // over the tail and stop at the first error increase.
    let last_reliable = n - 2;
    let mut previous_error = f64::MAX;
    for warm_idx in 0..last_reliable {
        let anchor = &samples[last_reliable];
        let candidate = &samples[warm_idx];
        let performance =
            (anchor.work - candidate.work) / (anchor.time_ms - candidate.time_ms) as f64;
        if performance <= 0.0 {
            continue;
        }
        let effective = candidate.time_ms as f64 - candidate.work / performance;
        let mut error = 0.0;
        for sample in &samples[warm_idx..n - 1] {
            let delta = sample.work - performance * (sample.time_ms as f64 - effective);
            error += delta * delta;
        }
        error /= (n - 1 - warm_idx) as f64;
        if error < previous_error {
            let ramp =
                anchor.time_ms as f64 - start_up_time as f64 - anchor.work / performance;
            fit.warm_up_time = (2.0 * ramp).max(0.0) as u64;
            fit.effective_start_up_time = effective.max(0.0) as u64;
            fit.peak_performance = performance;
            previous_error = error;
        } else {
            break;
        }
    }

    Ok(fit)
}

/// Relative deviation of the recorded peak performance from the refit.
pub fn refit_deviation(recorded: &RunSummary, fit: &RampFit) -> f64 {
    if recorded.peak_performance.abs() < f64::EPSILON {
        if fit.peak_performance.abs() < f64::EPSILON {
            return 0.0;
        }
        return f64::INFINITY;
    }
    ((fit.peak_performance - recorded.peak_performance) / recorded.peak_performance).abs()
}
