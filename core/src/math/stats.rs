pub struct StatsHelper;

impl StatsHelper {
    /// Sign with `sign(0) == 0` and NaN passed through.
    pub fn sign(value: f64) -> f64 {
        if value > 0.0 {
            1.0
        } else if value < 0.0 {
            -1.0
        } else {
            value
        }
    }

    pub fn nan_sum(values: &[f64]) -> f64 {
        values.iter().filter(|v| !v.is_nan()).sum()
    }

    pub fn nan_max(values: &[f64]) -> f64 {
        values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
    }

    pub fn nan_min(values: &[f64]) -> f64 {
        values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc })
    }

    pub fn nan_mean(values: &[f64]) -> f64 {
        let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if finite.is_empty() {
            return f64::NAN;
        }
        finite.iter().sum::<f64>() / finite.len() as f64
    }

    /// Index of the first maximum, ignoring NaN.
    pub fn nan_argmax(values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &value) in values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((index, value)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Population standard deviation.
    pub fn std(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        var.sqrt()
    }

    /// Pearson correlation coefficient; NaN when either input is constant.
    pub fn pearson(lhs: &[f64], rhs: &[f64]) -> f64 {
        let n = lhs.len().min(rhs.len());
        if n == 0 {
            return f64::NAN;
        }
        let mean_l = lhs[..n].iter().sum::<f64>() / n as f64;
        let mean_r = rhs[..n].iter().sum::<f64>() / n as f64;
        let mut cov = 0.0;
        let mut var_l = 0.0;
        let mut var_r = 0.0;
        for (l, r) in lhs[..n].iter().zip(rhs[..n].iter()) {
            let dl = l - mean_l;
            let dr = r - mean_r;
            cov += dl * dr;
            var_l += dl * dl;
            var_r += dr * dr;
        }
        let denom = (var_l * var_r).sqrt();
        if denom == 0.0 {
            return f64::NAN;
        }
        (cov / denom).clamp(-1.0, 1.0)
    }
}
