use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bank::ParticleBank;
use crate::error::{CollisionError, CollisionResult};
use crate::interpolation::InterpolationScheme;
use crate::particle::{Particle, ParticleType};
use crate::random::RandomSource;
use crate::scattering::{ScatteringDistribution, ScatteringModel};

/// Identifies a reaction channel of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionType {
    ElectronElastic,
    Bremsstrahlung,
    Electroionization { subshell: u32 },
    AtomicExcitation,
    IncoherentPhoton,
    PhotoelectricAbsorption,
    /// Placeholder channel for a particle type the material does not interact with
    VoidAbsorption(ParticleType),
}

impl ReactionType {
    pub fn incident_particle(&self) -> ParticleType {
        match self {
            ReactionType::ElectronElastic
            | ReactionType::Bremsstrahlung
            | ReactionType::Electroionization { .. }
            | ReactionType::AtomicExcitation => ParticleType::Electron,
            ReactionType::IncoherentPhoton | ReactionType::PhotoelectricAbsorption => ParticleType::Photon,
            ReactionType::VoidAbsorption(particle_type) => *particle_type,
        }
    }
}

impl std::fmt::Display for ReactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReactionType::ElectronElastic => write!(f, "electron elastic"),
            ReactionType::Bremsstrahlung => write!(f, "bremsstrahlung"),
            ReactionType::Electroionization { subshell } => write!(f, "electroionization (subshell {})", subshell),
            ReactionType::AtomicExcitation => write!(f, "atomic excitation"),
            ReactionType::IncoherentPhoton => write!(f, "incoherent photon"),
            ReactionType::PhotoelectricAbsorption => write!(f, "photoelectric absorption"),
            ReactionType::VoidAbsorption(particle_type) => write!(f, "{} void absorption", particle_type),
        }
    }
}

/// Cross section on a (possibly shared) energy grid.
///
/// `values` start at `threshold_index` of `energies`. Below the threshold
/// energy the cross section is exactly zero; above the grid the last value
/// is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    energies: Arc<Vec<f64>>,
    values: Vec<f64>,
    threshold_index: usize,
    scheme: InterpolationScheme,
}

impl CrossSection {
    pub fn new(
        energies: Arc<Vec<f64>>,
        values: Vec<f64>,
        threshold_index: usize,
        scheme: InterpolationScheme,
    ) -> CollisionResult<Self> {
        if threshold_index >= energies.len() {
            return Err(CollisionError::InvalidGrid(format!(
                "threshold index {} is outside an energy grid of {} points",
                threshold_index,
                energies.len()
            )));
        }
        if values.len() != energies.len() - threshold_index {
            return Err(CollisionError::InvalidGrid(format!(
                "cross section has {} values, expected {} from threshold index {}",
                values.len(),
                energies.len() - threshold_index,
                threshold_index
            )));
        }
        if energies.iter().any(|e| !e.is_finite()) || energies.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CollisionError::InvalidGrid(
                "cross section energies must be finite and strictly increasing".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CollisionError::InvalidGrid(
                "cross section values must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self {
            energies,
            values,
            threshold_index,
            scheme,
        })
    }

    /// Cross section that is zero at every energy.
    pub fn zero() -> Self {
        Self {
            energies: Arc::new(Vec::new()),
            values: Vec::new(),
            threshold_index: 0,
            scheme: InterpolationScheme::LinLin,
        }
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn threshold_index(&self) -> usize {
        self.threshold_index
    }

    /// Lowest energy with a tabulated value; infinite for a zero cross section
    pub fn threshold_energy(&self) -> f64 {
        self.energies
            .get(self.threshold_index)
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    #[inline]
    pub fn evaluate(&self, energy: f64) -> f64 {
        if self.values.is_empty() || !(energy >= self.threshold_energy()) {
            return 0.0;
        }
        let n = self.energies.len();
        if energy >= self.energies[n - 1] {
            return self.values[self.values.len() - 1];
        }
        // first grid index above the energy, past the threshold given the checks above
        let upper = self.energies.partition_point(|&e| e <= energy);
        let lower = upper - 1;
        let (v0, v1) = (
            self.values[lower - self.threshold_index],
            self.values[upper - self.threshold_index],
        );
        if self.energies[lower] == energy {
            return v0;
        }
        self.scheme
            .interpolate(self.energies[lower], self.energies[upper], v0, v1, energy)
            .max(0.0)
    }
}

/// A reaction channel: cross section plus the scattering model applied when
/// the channel is selected.
#[derive(Debug, Clone)]
pub struct Reaction {
    reaction_type: ReactionType,
    cross_section: CrossSection,
    distribution: ScatteringModel,
}

impl Reaction {
    pub fn new(reaction_type: ReactionType, cross_section: CrossSection, distribution: ScatteringModel) -> Self {
        log::debug!(
            "Built {} reaction with threshold {} MeV",
            reaction_type,
            cross_section.threshold_energy()
        );
        Self {
            reaction_type,
            cross_section,
            distribution,
        }
    }

    /// Reaction with zero cross section that leaves particles untouched.
    pub fn void(particle_type: ParticleType) -> Self {
        Self::new(
            ReactionType::VoidAbsorption(particle_type),
            CrossSection::zero(),
            ScatteringModel::Void,
        )
    }

    pub fn reaction_type(&self) -> ReactionType {
        self.reaction_type
    }

    pub fn cross_section(&self) -> &CrossSection {
        &self.cross_section
    }

    pub fn distribution(&self) -> &ScatteringModel {
        &self.distribution
    }

    pub fn incident_particle(&self) -> ParticleType {
        self.reaction_type.incident_particle()
    }

    pub fn cross_section_at(&self, energy: f64) -> f64 {
        self.cross_section.evaluate(energy)
    }

    pub fn threshold_energy(&self) -> f64 {
        self.cross_section.threshold_energy()
    }

    pub fn emitted_electron_count(&self, energy: f64) -> u32 {
        self.distribution.emitted_electron_count(energy)
    }

    pub fn emitted_photon_count(&self, energy: f64) -> u32 {
        self.distribution.emitted_photon_count(energy)
    }

    pub fn emitted_positron_count(&self, energy: f64) -> u32 {
        self.distribution.emitted_positron_count(energy)
    }

    /// Apply the reaction to `particle`, banking any secondaries. The
    /// particle's generation counter advances unless the reaction is void.
    pub fn react<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        if self.distribution.is_void() {
            return Ok(());
        }
        self.distribution.scatter(particle, bank, rng)?;
        particle.generation += 1;
        Ok(())
    }
}
