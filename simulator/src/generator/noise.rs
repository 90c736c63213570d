use focalcore::data::Wavelet;
use rand::{rngs::StdRng, Rng};

/// Draw resolution of the shift and SNR ranges.
const DRAW_STEPS: f64 = 1000.0;

/// Adds uniform noise scaled by `max / snr` to each wavelet, rescales it by
/// its original peak and delays it by a whole number of samples. One shift
/// (fraction of the wavelet length) and one SNR are drawn per wavelet from
/// the inclusive ranges.
pub fn degrade(wavelets: &mut [Wavelet], shift: [f64; 2], snr: [f64; 2], rng: &mut StdRng) {
    for wavelet in wavelets.iter_mut() {
        let shift = draw(shift, rng);
        let snr = draw(snr, rng);
        let length = wavelet.samples.len();
        if length == 0 {
            continue;
        }

        let peak = wavelet.peak();
        let max = wavelet
            .samples
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if snr > 0.0 {
            for sample in wavelet.samples.iter_mut() {
                let unit = rng.gen_range(-100..=100) as f64 / 100.0;
                *sample += unit * max / snr;
            }
        }
        if peak > 0.0 {
            wavelet.samples.iter_mut().for_each(|v| *v /= peak);
        }

        let delay = (length as f64 + shift * length as f64).floor() as isize - length as isize;
        wavelet.samples = delayed(&wavelet.samples, delay);
    }
}

fn draw(range: [f64; 2], rng: &mut StdRng) -> f64 {
    let low = (range[0] * DRAW_STEPS) as i64;
    let high = (range[1] * DRAW_STEPS) as i64;
    if high <= low {
        return low as f64 / DRAW_STEPS;
    }
    rng.gen_range(low..=high) as f64 / DRAW_STEPS
}

/// `samples` moved `delay` samples later (earlier when negative), zero filled.
fn delayed(samples: &[f64], delay: isize) -> Vec<f64> {
    let length = samples.len() as isize;
    (0..length)
        .map(|k| {
            let source = k - delay;
            if (0..length).contains(&source) {
                samples[source as usize]
            } else {
                0.0
            }
        })
        .collect()
}
