use crate::prelude::SourceResult;
use crate::radiation::aki_richards::AkiRichards;
use crate::radiation::vavrycuk::{Vavrycuk, DEFAULT_POISSON};
use crate::tensor::decomposition::{Decomposer, Decomposition, EigenDecomposer};
use crate::tensor::mechanism::Mechanism;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;

/// One mechanism exposed through both forward models and its decomposition.
#[derive(Debug, Clone)]
pub struct SeismicSource {
    pub mechanism: Mechanism,
    pub tensor: [f64; 6],
    pub decomposition: Decomposition,
    pub aki_richards: AkiRichards,
    pub vavrycuk: Vavrycuk,
}

impl SeismicSource {
    pub fn new(mechanism: Mechanism) -> SourceResult<Self> {
        Self::with_poisson(mechanism, DEFAULT_POISSON)
    }

    pub fn with_poisson(mechanism: Mechanism, poisson: f64) -> SourceResult<Self> {
        Self::build(mechanism, poisson, &EigenDecomposer)
    }

    pub fn build(
        mechanism: Mechanism,
        poisson: f64,
        decomposer: &dyn Decomposer,
    ) -> SourceResult<Self> {
        let tensor = mechanism.tensor()?;
        let decomposition = decomposer.decompose(&tensor)?;
        Ok(Self {
            mechanism,
            tensor,
            decomposition,
            aki_richards: AkiRichards::from_tensor(tensor),
            vavrycuk: Vavrycuk::with_decomposer(&mechanism, poisson, decomposer)?,
        })
    }
}

/// Reference sources with unit-scale amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleModel {
    LinearVector,
    Isotropic,
    Clvd,
    DoubleCouple,
}

impl SimpleModel {
    pub const ALL: [SimpleModel; 4] = [
        SimpleModel::LinearVector,
        SimpleModel::Isotropic,
        SimpleModel::Clvd,
        SimpleModel::DoubleCouple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LinearVector => "Linear vector",
            Self::Isotropic => "Isotropic",
            Self::Clvd => "Compensated linear vector",
            Self::DoubleCouple => "Double couple",
        }
    }

    pub fn tensor(self) -> [f64; 6] {
        const C: f64 = 2.0;
        match self {
            Self::LinearVector => [0.0, C / 2.0, 0.0, 0.0, 0.0, 0.0],
            // slightly unequal diagonal keeps the eigenvectors well defined
            Self::Isotropic => {
                let s = 1.0 / 3f64.sqrt();
                [
                    C / 2.0001 * s,
                    C / 2.000001 * s,
                    C / 2.0000000001 * s,
                    0.0,
                    0.0,
                    0.0,
                ]
            }
            Self::Clvd => {
                let s = 1.0 / 6f64.sqrt();
                [-C * s, C / 2.0 * s, C / 2.0 * s, 0.0, 0.0, 0.0]
            }
            Self::DoubleCouple => [0.0, 0.0, 0.0, C.sqrt() / SQRT_2, 0.0, 0.0],
        }
    }

    pub fn source(self) -> SourceResult<SeismicSource> {
        SeismicSource::new(Mechanism::SixComponent(self.tensor()))
    }
}
