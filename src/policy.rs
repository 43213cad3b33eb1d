// Selection of how a two-dimensional distribution behaves between grid points.

use serde::{Deserialize, Serialize};

use crate::interpolation::TwoDInterpolation;

/// Sampling discipline between neighbouring grid bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GridSampling {
    /// Interpolate evaluated densities; sample one of the two bins.
    Direct,
    /// Interpolate on a common unit domain, then map back.
    UnitBase,
    /// Invert both bins at one shared random number and interpolate the results.
    #[default]
    Correlated,
    /// Correlated sampling carried out on the unit domain.
    UnitBaseCorrelated,
}

impl std::fmt::Display for GridSampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridSampling::Direct => write!(f, "Direct"),
            GridSampling::UnitBase => write!(f, "UnitBase"),
            GridSampling::Correlated => write!(f, "Correlated"),
            GridSampling::UnitBaseCorrelated => write!(f, "UnitBaseCorrelated"),
        }
    }
}

/// Sampling discipline plus the axis processing used to interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InterpolationPolicy {
    pub sampling: GridSampling,
    pub interpolation: TwoDInterpolation,
}

impl InterpolationPolicy {
    pub fn new(sampling: GridSampling, interpolation: TwoDInterpolation) -> Self {
        Self {
            sampling,
            interpolation,
        }
    }

    /// Correlated lin-lin-log policy used for elastic cutoff grids.
    pub fn default_elastic() -> Self {
        Self::new(GridSampling::Correlated, TwoDInterpolation::LinLinLog)
    }

    pub fn is_correlated(&self) -> bool {
        matches!(
            self.sampling,
            GridSampling::Correlated | GridSampling::UnitBaseCorrelated
        )
    }

    pub fn is_unit_base(&self) -> bool {
        matches!(
            self.sampling,
            GridSampling::UnitBase | GridSampling::UnitBaseCorrelated
        )
    }
}

impl std::fmt::Display for InterpolationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.interpolation, self.sampling)
    }
}
