//! Per-mechanism scores and the probabilities derived from them.

use crate::grid::MechanismGrid;
use crate::math::stats::StatsHelper;
use crate::prelude::SourceResult;
use crate::processing::binding::DataBinding;
use crate::processing::buffer_pool::StackPool;
use rayon::prelude::*;
use serde::Serialize;

/// Value substituted for centroid components that end up undefined.
pub const CENTROID_FALLBACK: f64 = 1e-11;

/// Raw match of one mechanism against the bound data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MechanismScore {
    pub rms: f64,
    pub xcorr: f64,
    /// `Σ (optimal − stack)²`.
    pub misfit: f64,
}

/// Highest-probability grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestSolution {
    pub index: usize,
    /// `(strike, dip, rake)`, degrees.
    pub mechanism: [f64; 3],
    pub tensor: [f64; 6],
    pub probability: f64,
}

/// Probability-weighted mean of the most likely tensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub tensor: [f64; 6],
    pub probability: f64,
}

/// Outcome of one scan, indexed like the mechanism grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub rms: Vec<f64>,
    pub xcorr: Vec<f64>,
    /// `P(d|Mt)`.
    pub likelihood: Vec<f64>,
    /// `P(Mt)`, identical for every cell.
    pub prior: f64,
    /// `P(d)` after clamping.
    pub evidence: f64,
    /// `P(Mt|d)`.
    pub posterior: Vec<f64>,
    pub best: BestSolution,
    pub centroid: Centroid,
    pub coverage: f64,
    /// Summed squared distance of every mechanism stack to the optimal stack.
    pub misfit: f64,
}

/// Signed stack energy `Σ stack² · sign(Σ stack)`.
pub fn stack_score(stack: &[f64]) -> f64 {
    let energy = StatsHelper::nan_sum(&stack.iter().map(|v| v * v).collect::<Vec<_>>());
    energy * StatsHelper::sign(StatsHelper::nan_sum(stack))
}

/// Stacks the bound wavelets with the polarities each grid mechanism
/// predicts and scores every stack.
pub fn score_mechanisms(
    grid: &MechanismGrid,
    binding: &DataBinding,
) -> SourceResult<Vec<MechanismScore>> {
    let fields = grid.fields();
    (0..grid.len())
        .into_par_iter()
        .map_init(
            || StackPool::with_capacity(1),
            |pool, row| -> SourceResult<MechanismScore> {
                let mut stack = pool.checkout(binding.length)?;
                for wavelet in &binding.wavelets {
                    let polarity =
                        StatsHelper::sign(fields[wavelet.field].values[[row, wavelet.index]]);
                    if polarity.is_nan() {
                        continue;
                    }
                    for ((slot, value), taper) in stack
                        .iter_mut()
                        .zip(wavelet.samples.iter())
                        .zip(wavelet.taper.iter())
                    {
                        *slot += polarity * value * taper;
                    }
                }
                let rms = stack_score(&stack);
                let xcorr = if rms == 0.0 {
                    0.0
                } else {
                    StatsHelper::pearson(&binding.optimal_stack, &stack)
                };
                let misfit = binding
                    .optimal_stack
                    .iter()
                    .zip(stack.iter())
                    .map(|(o, s)| (o - s).powi(2))
                    .filter(|v| !v.is_nan())
                    .sum();
                pool.release(stack);
                Ok(MechanismScore { rms, xcorr, misfit })
            },
        )
        .collect()
}

/// `P(d)`: share of cells reaching the top score, times one half, then held
/// between the smallest prior and the largest likelihood.
pub fn evidence(rms: &[f64], likelihood: &[f64], prior: f64) -> f64 {
    if rms.is_empty() {
        return f64::NAN;
    }
    let top = StatsHelper::nan_max(rms);
    let reaching = rms.iter().filter(|v| v.abs() >= top).count();
    let raw = reaching as f64 * 0.5 / rms.len() as f64;
    let floored = nan_aware_max(raw, prior);
    nan_aware_min(floored, StatsHelper::nan_max(likelihood))
}

fn nan_aware_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn nan_aware_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Weighted mean of `tensors` using the posteriors above
/// `mean + factor · std` as weights; negative posteriors weigh nothing.
pub fn centroid_tensor(posterior: &[f64], tensors: &[[f64; 6]], factor: f64) -> [f64; 6] {
    let mut weights: Vec<f64> = posterior
        .iter()
        .map(|&p| if p < 0.0 { 0.0 } else { p })
        .collect();
    let limit = StatsHelper::nan_mean(&weights) + factor * StatsHelper::std(&weights);
    for weight in weights.iter_mut() {
        if *weight < limit {
            *weight = 0.0;
        }
    }
    let total = StatsHelper::nan_sum(&weights);
    let mut centroid = [0.0; 6];
    for (component, slot) in centroid.iter_mut().enumerate() {
        let weighted: Vec<f64> = weights
            .iter()
            .zip(tensors.iter())
            .map(|(w, t)| w * t[component])
            .collect();
        let value = StatsHelper::nan_sum(&weighted) / total;
        *slot = if value.is_nan() { CENTROID_FALLBACK } else { value };
    }
    centroid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_keeps_sign_of_stack_sum() {
        assert_eq!(stack_score(&[1.0, 2.0]), 5.0);
        assert_eq!(stack_score(&[-1.0, -2.0]), -5.0);
        assert_eq!(stack_score(&[1.0, -1.0]), 0.0);
        assert_eq!(stack_score(&[]), 0.0);
    }

    #[test]
    fn evidence_counts_top_scores() {
        let rms = [1.0, 4.0, -4.0, 2.0];
        let likelihood = [0.1, 0.4, -0.4, 0.2];
        // two of four cells reach |rms| >= 4, so 2 * 0.5 / 4 = 0.25
        assert!((evidence(&rms, &likelihood, 0.01) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn evidence_is_floored_by_prior_and_capped_by_likelihood() {
        let rms = [1.0, 4.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let likelihood = [0.1, 0.4, 0.2, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert!((evidence(&rms, &likelihood, 0.3) - 0.3).abs() < 1e-12);
        let small = [0.01, 0.04, 0.02, 0.03, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert!((evidence(&rms, &small, 0.001) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn centroid_averages_only_the_strongest_cells() {
        let tensors = [
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        ];
        let centroid = centroid_tensor(&[0.9, 0.1, 0.0, -0.5], &tensors, 1.0);
        assert!((centroid[0] - 1.0).abs() < 1e-12);
        assert_eq!(centroid[1], 0.0);
        assert_eq!(centroid[3], 0.0);
    }

    #[test]
    fn all_negative_posterior_falls_back_to_tiny_tensor() {
        let tensors = [[1.0; 6], [2.0; 6]];
        let centroid = centroid_tensor(&[-0.2, -0.4], &tensors, 1.0);
        assert_eq!(centroid, [CENTROID_FALLBACK; 6]);
    }
}
