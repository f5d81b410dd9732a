//! Instantaneous performance from cumulative-work samples.

use crate::{ProgressSample, WasmperfError, WasmperfResult};

/// Derives one performance value per sample from a strictly
/// time-increasing cumulative-work series:
///
/// - index 0: average rate from the origin to the *second* sample
///   (`work[1] / time[1]`), a one-sided extension rather than an
///   adjacent-pair slope;
/// - interior: centered difference over the two neighbors;
/// - last index: backward difference over the final pair.
///
/// Downstream curve comparisons depend on this exact shape near warm-up.
pub fn instantaneous_performance(
    run_id: &str,
    samples: &[ProgressSample],
) -> WasmperfResult<Vec<f64>> {
    if samples.len() < 2 {
        return Err(WasmperfError::EmptyProgress {
            run: run_id.to_string(),
            count: samples.len(),
        });
    }
    ensure_strictly_increasing(run_id, samples)?;

    let n = samples.len();
    let mut out = Vec::with_capacity(n);
    for index in 0..n {
        let value = if index == 0 {
            samples[1].work / samples[1].time_ms as f64
        } else if index < n - 1 {
            (samples[index + 1].work - samples[index - 1].work)
                / (samples[index + 1].time_ms - samples[index - 1].time_ms) as f64
        } else {
            (samples[index].work - samples[index - 1].work)
                / (samples[index].time_ms - samples[index - 1].time_ms) as f64
        };
        out.push(value);
    }
    Ok(out)
}

/// Finite differences divide by time deltas; a repeated or reordered
/// timestamp is unrecoverable for the run.
pub(crate) fn ensure_strictly_increasing(
    run_id: &str,
    samples: &[ProgressSample],
) -> WasmperfResult<()> {
    for (index, pair) in samples.windows(2).enumerate() {
        if pair[1].time_ms <= pair[0].time_ms {
            return Err(WasmperfError::DegenerateSample {
                run: run_id.to_string(),
                index: index + 1,
                previous: pair[0].time_ms,
                time: pair[1].time_ms,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(u64, f64)]) -> Vec<ProgressSample> {
        points
            .iter()
            .map(|&(time_ms, work)| ProgressSample {
                time_ms,
                work,
                performance: None,
            })
            .collect()
    }

    #[test]
    fn boundary_rules_match_the_reference_series() {
        let series = samples(&[(0, 0.0), (1, 10.0), (2, 25.0), (3, 40.0)]);
        let derived = instantaneous_performance("runs", &series).expect("derive");
        assert_eq!(derived, vec![10.0, 12.5, 15.0, 15.0]);
    }

    #[test]
    fn two_samples_use_the_one_sided_and_backward_rules() {
        let series = samples(&[(0, 0.0), (4, 10.0)]);
        let derived = instantaneous_performance("runs", &series).expect("derive");
        assert_eq!(derived, vec![2.5, 2.5]);
    }

    #[test]
    fn fewer_than_two_samples_is_empty_progress() {
        for series in [samples(&[]), samples(&[(10, 5.0)])] {
            match instantaneous_performance("runs", &series) {
                Err(WasmperfError::EmptyProgress { run, count }) => {
                    assert_eq!(run, "runs");
                    assert_eq!(count, series.len());
                }
                other => panic!("expected EmptyProgress, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_increasing_time_is_degenerate() {
        let series = samples(&[(0, 0.0), (10, 5.0), (10, 6.0)]);
        match instantaneous_performance("runs", &series) {
            Err(WasmperfError::DegenerateSample {
                index,
                previous,
                time,
                ..
            }) => {
                assert_eq!(index, 2);
                assert_eq!(previous, 10);
                assert_eq!(time, 10);
            }
            other => panic!("expected DegenerateSample, got {other:?}"),
        }
    }
}
