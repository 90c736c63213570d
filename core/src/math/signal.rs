//! Wavelet templates and windows shared by data binding and the providers.

use std::f64::consts::PI;

/// One period of `sin(2πt)` sampled at `t = k / length`.
pub fn template_wavelet(length: usize) -> Vec<f64> {
    (0..length)
        .map(|k| (2.0 * PI * k as f64 / length as f64).sin())
        .collect()
}

/// Flat window that ramps linearly down over the second half of the wavelet.
pub fn taper_window(length: usize) -> Vec<f64> {
    let l = length as f64;
    (0..length)
        .map(|k| (2.0 * (length - k) as f64).min(l) / l)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taper_is_flat_then_ramps() {
        let taper = taper_window(20);
        assert_eq!(taper.len(), 20);
        assert!(taper[..10].iter().all(|&v| v == 1.0));
        assert!((taper[19] - 0.1).abs() < 1e-12);
        assert!(taper.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn template_starts_at_zero_and_peaks_at_quarter() {
        let wave = template_wavelet(20);
        assert_eq!(wave[0], 0.0);
        assert!((wave[5] - 1.0).abs() < 1e-12);
    }
}
