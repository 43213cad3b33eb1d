// Electroionization of one atomic subshell: knock-on electron energy from a
// tabulated grid, binary-collision kinematics for both outgoing electrons.

use crate::bank::ParticleBank;
use crate::constants::ELECTRON_REST_MASS_ENERGY;
use crate::error::{CollisionError, CollisionResult};
use crate::particle::{rotate_direction, sample_azimuthal_angle, Particle, ParticleType};
use crate::random::RandomSource;
use crate::scattering::ScatteringDistribution;
use crate::two_d::{SecondaryLimits, TwoDDistribution};

#[derive(Debug, Clone)]
pub struct ElectroionizationSubshellDistribution {
    knock_on_energy: TwoDDistribution,
    binding_energy: f64,
}

impl ElectroionizationSubshellDistribution {
    /// Knock-on energies are limited to `[W_min, (E - B) / 2]`: the knock-on
    /// electron is by convention the slower of the two.
    pub fn new(knock_on_energy: TwoDDistribution, binding_energy: f64) -> CollisionResult<Self> {
        if !(binding_energy > 0.0 && binding_energy.is_finite()) {
            return Err(CollisionError::InvalidGrid(format!(
                "subshell binding energy {} must be positive",
                binding_energy
            )));
        }
        let min_knock_on = knock_on_energy
            .grid()
            .bins()
            .iter()
            .map(|bin| bin.lower_bound())
            .fold(f64::INFINITY, f64::min);
        let knock_on_energy = knock_on_energy.with_limits(SecondaryLimits::new(
            move |_| min_knock_on,
            move |energy| 0.5 * (energy - binding_energy),
        ));
        Ok(Self {
            knock_on_energy,
            binding_energy,
        })
    }

    pub fn binding_energy(&self) -> f64 {
        self.binding_energy
    }

    pub fn knock_on_energy_distribution(&self) -> &TwoDDistribution {
        &self.knock_on_energy
    }

    pub fn sample_knock_on_energy<R: RandomSource + ?Sized>(&self, energy: f64, rng: &mut R) -> CollisionResult<f64> {
        if energy <= self.binding_energy {
            return Err(CollisionError::Domain(format!(
                "energy {} MeV is below the subshell binding energy {} MeV",
                energy, self.binding_energy
            )));
        }
        let max_knock_on = 0.5 * (energy - self.binding_energy);
        Ok(self.knock_on_energy.sample(energy, rng)?.min(max_knock_on))
    }
}

/// Cosine between an outgoing electron of kinetic energy `outgoing` and an
/// incoming electron of kinetic energy `energy` in a binary collision.
pub fn binary_collision_cosine(energy: f64, outgoing: f64) -> f64 {
    let two_m = 2.0 * ELECTRON_REST_MASS_ENERGY;
    let mu_squared = outgoing * (energy + two_m) / (energy * (outgoing + two_m));
    mu_squared.clamp(0.0, 1.0).sqrt()
}

impl ScatteringDistribution for ElectroionizationSubshellDistribution {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        let energy = particle.energy;
        let knock_on_energy = self.sample_knock_on_energy(energy, rng)?;
        let outgoing_energy = (energy - self.binding_energy - knock_on_energy).max(0.0);

        let phi = sample_azimuthal_angle(rng);
        let knock_on_mu = binary_collision_cosine(energy, knock_on_energy);
        let primary_mu = binary_collision_cosine(energy, outgoing_energy);

        // the two electrons leave on opposite sides of the incoming direction
        let knock_on_direction = rotate_direction(&particle.direction, knock_on_mu, phi);
        bank.push(particle.create_secondary(ParticleType::Electron, knock_on_direction, knock_on_energy));

        particle.rotate(primary_mu, phi + std::f64::consts::PI);
        particle.energy = outgoing_energy;
        Ok(())
    }

    fn emitted_electron_count(&self, _energy: f64) -> u32 {
        1
    }
}
