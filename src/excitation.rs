// Atomic excitation: tabulated mean energy loss, direction unchanged.

use crate::bank::ParticleBank;
use crate::error::CollisionResult;
use crate::interpolation::TabulatedFunction;
use crate::particle::Particle;
use crate::random::RandomSource;
use crate::scattering::ScatteringDistribution;

#[derive(Debug, Clone, PartialEq)]
pub struct AtomicExcitationDistribution {
    energy_loss: TabulatedFunction,
}

impl AtomicExcitationDistribution {
    pub fn new(energy_loss: TabulatedFunction) -> Self {
        Self { energy_loss }
    }

    pub fn energy_loss(&self, energy: f64) -> f64 {
        self.energy_loss.evaluate(energy).max(0.0)
    }
}

impl ScatteringDistribution for AtomicExcitationDistribution {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        _bank: &mut ParticleBank,
        _rng: &mut R,
    ) -> CollisionResult<()> {
        particle.energy = (particle.energy - self.energy_loss(particle.energy)).max(0.0);
        Ok(())
    }
}
