// Physics-facing scattering contract: sample outgoing state for an incoming
// particle, mutate it in place and bank any secondaries.

use crate::bremsstrahlung::BremsstrahlungDistribution;
use crate::elastic::CompositeElasticModel;
use crate::error::CollisionResult;
use crate::excitation::AtomicExcitationDistribution;
use crate::incoherent::IncoherentPhotonDistribution;
use crate::ionization::ElectroionizationSubshellDistribution;
use crate::particle::{rotate_direction, sample_azimuthal_angle, Particle, ParticleType};
use crate::bank::ParticleBank;
use crate::random::RandomSource;
use crate::two_d::TwoDDistribution;

pub trait ScatteringDistribution {
    /// Update `particle` for one interaction, pushing secondaries into `bank`.
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()>;

    fn emitted_electron_count(&self, _energy: f64) -> u32 {
        0
    }

    fn emitted_photon_count(&self, _energy: f64) -> u32 {
        0
    }

    fn emitted_positron_count(&self, _energy: f64) -> u32 {
        0
    }
}

//=====================================================================
// Elastic scattering: direction change only.
//=====================================================================
#[derive(Debug, Clone)]
pub enum ElasticScattering {
    /// Tabulated cutoff distribution alone, no forward tail
    Cutoff(TwoDDistribution),
    Composite(CompositeElasticModel),
}

impl ElasticScattering {
    pub fn sample_cosine<R: RandomSource + ?Sized>(&self, energy: f64, rng: &mut R) -> CollisionResult<f64> {
        match self {
            ElasticScattering::Cutoff(distribution) => distribution.sample(energy, rng),
            ElasticScattering::Composite(model) => model.sample(energy, rng),
        }
    }
}

impl ScatteringDistribution for ElasticScattering {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        _bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        let mu = self.sample_cosine(particle.energy, rng)?;
        let phi = sample_azimuthal_angle(rng);
        particle.rotate(mu, phi);
        Ok(())
    }
}

//=====================================================================
// Absorption, with an optional photo-electron.
//=====================================================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbsorptionDistribution {
    /// Binding energy of the ejected electron; None absorbs without emission
    pub photoelectron_binding_energy: Option<f64>,
}

impl AbsorptionDistribution {
    pub fn new(photoelectron_binding_energy: Option<f64>) -> Self {
        Self {
            photoelectron_binding_energy,
        }
    }

    fn photoelectron_energy(&self, energy: f64) -> Option<f64> {
        self.photoelectron_binding_energy
            .map(|binding| energy - binding)
            .filter(|&kinetic| kinetic > 0.0)
    }
}

impl ScatteringDistribution for AbsorptionDistribution {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        if let Some(kinetic) = self.photoelectron_energy(particle.energy) {
            // isotropic emission
            let mu = 2.0 * rng.random_number() - 1.0;
            let phi = sample_azimuthal_angle(rng);
            let direction = rotate_direction(&particle.direction, mu, phi);
            bank.push(particle.create_secondary(ParticleType::Electron, direction, kinetic));
        }
        particle.energy = 0.0;
        particle.set_as_gone();
        Ok(())
    }

    fn emitted_electron_count(&self, energy: f64) -> u32 {
        u32::from(self.photoelectron_energy(energy).is_some())
    }
}

//=====================================================================
// Closed set of scattering models.
//=====================================================================
#[derive(Debug, Clone)]
pub enum ScatteringModel {
    Elastic(ElasticScattering),
    Bremsstrahlung(BremsstrahlungDistribution),
    Electroionization(ElectroionizationSubshellDistribution),
    AtomicExcitation(AtomicExcitationDistribution),
    Incoherent(IncoherentPhotonDistribution),
    Absorption(AbsorptionDistribution),
    /// Leaves the particle untouched
    Void,
}

impl ScatteringModel {
    pub fn is_void(&self) -> bool {
        matches!(self, ScatteringModel::Void)
    }
}

impl ScatteringDistribution for ScatteringModel {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        match self {
            ScatteringModel::Elastic(d) => d.scatter(particle, bank, rng),
            ScatteringModel::Bremsstrahlung(d) => d.scatter(particle, bank, rng),
            ScatteringModel::Electroionization(d) => d.scatter(particle, bank, rng),
            ScatteringModel::AtomicExcitation(d) => d.scatter(particle, bank, rng),
            ScatteringModel::Incoherent(d) => d.scatter(particle, bank, rng),
            ScatteringModel::Absorption(d) => d.scatter(particle, bank, rng),
            ScatteringModel::Void => Ok(()),
        }
    }

    fn emitted_electron_count(&self, energy: f64) -> u32 {
        match self {
            ScatteringModel::Elastic(d) => d.emitted_electron_count(energy),
            ScatteringModel::Bremsstrahlung(d) => d.emitted_electron_count(energy),
            ScatteringModel::Electroionization(d) => d.emitted_electron_count(energy),
            ScatteringModel::AtomicExcitation(d) => d.emitted_electron_count(energy),
            ScatteringModel::Incoherent(d) => d.emitted_electron_count(energy),
            ScatteringModel::Absorption(d) => d.emitted_electron_count(energy),
            ScatteringModel::Void => 0,
        }
    }

    fn emitted_photon_count(&self, energy: f64) -> u32 {
        match self {
            ScatteringModel::Bremsstrahlung(d) => d.emitted_photon_count(energy),
            _ => 0,
        }
    }

    fn emitted_positron_count(&self, _energy: f64) -> u32 {
        0
    }
}
