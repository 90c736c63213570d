/// Every double couple appears twice in the strike/dip/rake box (the two
/// nodal planes), so only `1 / ANTIPODAL_MULTIPLICITY` of the cells are
/// distinct solutions.
pub const ANTIPODAL_MULTIPLICITY: f64 = 2.0;

const STRIKE_RANGE: (f64, f64) = (0.0, 180.0);
const DIP_RANGE: (f64, f64) = (0.0, 90.0);
const RAKE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Regular strike/dip/rake discretization with one angular step on all axes.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanismSpace {
    precision: f64,
    strikes: Vec<f64>,
    dips: Vec<f64>,
    rakes: Vec<f64>,
}

impl MechanismSpace {
    /// Step chosen so that the full box holds about `n_model` cells.
    pub fn new(n_model: usize) -> Self {
        let volume = (STRIKE_RANGE.1 - STRIKE_RANGE.0).powi(3);
        let precision = (volume / n_model.max(1) as f64).cbrt();
        Self {
            precision,
            strikes: arange(STRIKE_RANGE, precision),
            dips: arange(DIP_RANGE, precision),
            rakes: arange(RAKE_RANGE, precision),
        }
    }

    /// Angular step in degrees.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn len(&self) -> usize {
        self.strikes.len() * self.dips.len() * self.rakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(strike, dip, rake)` of every cell, dip outermost and rake innermost.
    pub fn cells(&self) -> Vec<[f64; 3]> {
        let mut cells = Vec::with_capacity(self.len());
        for &dip in &self.dips {
            for &strike in &self.strikes {
                for &rake in &self.rakes {
                    cells.push([strike, dip, rake]);
                }
            }
        }
        cells
    }
}

fn arange(range: (f64, f64), step: f64) -> Vec<f64> {
    let count = ((range.1 - range.0) / step).ceil() as usize;
    (0..count).map(|k| range.0 + k as f64 * step).collect()
}
