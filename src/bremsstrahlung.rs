// Electron bremsstrahlung: photon energy from a tabulated grid bounded by
// the incoming energy, photon emitted at a sampled angle and banked.

use serde::{Deserialize, Serialize};

use crate::bank::ParticleBank;
use crate::constants::ELECTRON_REST_MASS_ENERGY;
use crate::error::{CollisionError, CollisionResult};
use crate::particle::{rotate_direction, sample_azimuthal_angle, Particle, ParticleType};
use crate::random::RandomSource;
use crate::scattering::ScatteringDistribution;
use crate::two_d::{SecondaryLimits, TwoDDistribution};

/// Emission angle of the bremsstrahlung photon relative to the electron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BremsstrahlungAngularModel {
    /// Photon emitted along the electron direction
    Simple,
    /// Lorentz-boosted dipole distribution
    #[default]
    Dipole,
}

#[derive(Debug, Clone)]
pub struct BremsstrahlungDistribution {
    photon_energy: TwoDDistribution,
    angular: BremsstrahlungAngularModel,
}

impl BremsstrahlungDistribution {
    /// `photon_energy` is the tabulated photon energy grid over incoming
    /// electron energy. Sampled photon energies are limited to
    /// `[k_min, E]`, with `k_min` the lowest tabulated photon energy.
    pub fn new(photon_energy: TwoDDistribution, angular: BremsstrahlungAngularModel) -> CollisionResult<Self> {
        let min_photon_energy = photon_energy
            .grid()
            .bins()
            .iter()
            .map(|bin| bin.lower_bound())
            .fold(f64::INFINITY, f64::min);
        if !(min_photon_energy > 0.0 && min_photon_energy.is_finite()) {
            return Err(CollisionError::InvalidGrid(format!(
                "bremsstrahlung photon energies must be positive, lowest is {}",
                min_photon_energy
            )));
        }
        let photon_energy = photon_energy.with_limits(SecondaryLimits::new(
            move |_| min_photon_energy,
            |energy| energy,
        ));
        Ok(Self {
            photon_energy,
            angular,
        })
    }

    pub fn photon_energy_distribution(&self) -> &TwoDDistribution {
        &self.photon_energy
    }

    pub fn angular_model(&self) -> BremsstrahlungAngularModel {
        self.angular
    }

    pub fn sample_photon_energy<R: RandomSource + ?Sized>(&self, energy: f64, rng: &mut R) -> CollisionResult<f64> {
        Ok(self.photon_energy.sample(energy, rng)?.min(energy))
    }

    /// Photon emission cosine relative to an electron of kinetic energy `energy`.
    pub fn sample_photon_cosine<R: RandomSource + ?Sized>(&self, energy: f64, rng: &mut R) -> f64 {
        match self.angular {
            BremsstrahlungAngularModel::Simple => 1.0,
            BremsstrahlungAngularModel::Dipole => dipole_cosine(energy, rng.random_number()),
        }
    }
}

/// Dipole emission cosine for an electron of kinetic energy `energy`.
pub fn dipole_cosine(energy: f64, random_number: f64) -> f64 {
    let total_energy = energy + ELECTRON_REST_MASS_ENERGY;
    let beta = (energy * (energy + 2.0 * ELECTRON_REST_MASS_ENERGY)).sqrt() / total_energy;
    let mu = (2.0 * random_number + beta - 1.0) / (2.0 * random_number * beta - beta + 1.0);
    mu.clamp(-1.0, 1.0)
}

impl ScatteringDistribution for BremsstrahlungDistribution {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        let energy = particle.energy;
        let photon_energy = self.sample_photon_energy(energy, rng)?;
        let mu = self.sample_photon_cosine(energy, rng);
        let phi = sample_azimuthal_angle(rng);

        let direction = rotate_direction(&particle.direction, mu, phi);
        bank.push(particle.create_secondary(ParticleType::Photon, direction, photon_energy));

        particle.energy = energy - photon_energy;
        Ok(())
    }

    fn emitted_photon_count(&self, _energy: f64) -> u32 {
        1
    }
}
