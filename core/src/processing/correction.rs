use crate::math::stats::StatsHelper;
use crate::prelude::{RadiationModel, SourceResult};
use crate::processing::binding::DataBinding;
use crate::processing::scoring::stack_score;
use crate::radiation::aki_richards::AkiRichards;
use crate::radiation::projection::disp_component;
use crate::radiation::wave::{Component, WaveType};
use crate::tensor::mechanism::Mechanism;
use serde::Serialize;

/// Observed wavelets with the polarities one mechanism predicts at their
/// actual directions, and the probabilities of that mechanism.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectedData {
    pub tensor: [f64; 6],
    pub stations: Vec<String>,
    pub polarities: Vec<f64>,
    /// Unit-peak wavelets multiplied by their polarity.
    pub wavelets: Vec<Vec<f64>>,
    pub rms: f64,
    /// `P(d|Mt)`.
    pub likelihood: f64,
    /// `P(Mt)`.
    pub prior: f64,
    /// `P(Mt|d)`.
    pub posterior: f64,
}

/// Forward-models `mechanism` at the bound directions and stacks the
/// polarity-corrected wavelets.
pub fn correct(
    binding: &DataBinding,
    mechanism: &Mechanism,
    prior: f64,
    evidence: f64,
) -> SourceResult<CorrectedData> {
    let tensor = mechanism.tensor()?;
    let model = AkiRichards::from_tensor(tensor);
    let cartesian = binding.observations.cartesian().view();

    let mut fields: Vec<((WaveType, Component), Vec<f64>)> = Vec::new();
    for wavelet in &binding.wavelets {
        let pair = (wavelet.wave, wavelet.component);
        if fields.iter().any(|(p, _)| *p == pair) {
            continue;
        }
        let pattern = model.radpat(wavelet.wave, &binding.observations)?;
        let projected =
            disp_component(cartesian, pattern.displacement.view(), Some(wavelet.component))?;
        fields.push((pair, projected.amplitudes.to_vec()));
    }
    let polarities: Vec<f64> = binding
        .wavelets
        .iter()
        .enumerate()
        .map(|(index, wavelet)| {
            fields
                .iter()
                .find(|(p, _)| *p == (wavelet.wave, wavelet.component))
                .and_then(|(_, amplitudes)| amplitudes.get(index))
                .map_or(f64::NAN, |&a| StatsHelper::sign(a))
        })
        .collect();

    let mut stack = vec![0.0; binding.length];
    let mut wavelets = Vec::with_capacity(binding.len());
    for (wavelet, &polarity) in binding.wavelets.iter().zip(polarities.iter()) {
        let corrected: Vec<f64> = wavelet.samples.iter().map(|v| v * polarity).collect();
        if !polarity.is_nan() {
            for ((slot, value), taper) in stack.iter_mut().zip(&corrected).zip(&wavelet.taper) {
                *slot += value * taper;
            }
        }
        wavelets.push(corrected);
    }

    let rms = stack_score(&stack);
    let likelihood = rms / binding.synthetic_power;
    Ok(CorrectedData {
        tensor,
        stations: binding.wavelets.iter().map(|w| w.station.clone()).collect(),
        polarities,
        wavelets,
        rms,
        likelihood,
        prior,
        posterior: likelihood * prior / evidence,
    })
}
