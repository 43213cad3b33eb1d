// Incoherent (Klein-Nishina) photon scattering with a banked Compton electron.

use nalgebra::Vector3;

use crate::bank::ParticleBank;
use crate::constants::ELECTRON_REST_MASS_ENERGY;
use crate::error::{check_energy, CollisionError, CollisionResult};
use crate::particle::{sample_azimuthal_angle, Particle, ParticleType};
use crate::random::RandomSource;
use crate::scattering::ScatteringDistribution;

/// Trial cap for Kahn's rejection method.
pub const MAX_KAHN_TRIALS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IncoherentPhotonDistribution;

impl IncoherentPhotonDistribution {
    pub fn new() -> Self {
        Self
    }

    /// Sample (outgoing photon energy, scattering cosine) for a photon of
    /// energy `energy` using Kahn's rejection method. The outgoing energy is
    /// always strictly below `energy`.
    pub fn sample_klein_nishina<R: RandomSource + ?Sized>(
        &self,
        energy: f64,
        rng: &mut R,
    ) -> CollisionResult<(f64, f64)> {
        check_energy(energy)?;
        let alpha = energy / ELECTRON_REST_MASS_ENERGY;
        let beta = 1.0 + 2.0 * alpha;
        let branch = beta / (beta + 8.0);

        for _ in 0..MAX_KAHN_TRIALS {
            let r1 = rng.random_number();
            let r2 = rng.random_number();
            let r3 = rng.random_number();
            // x is the ratio of incoming to outgoing photon energy
            let x = if r1 <= branch {
                let x = 1.0 + 2.0 * alpha * r2;
                if r3 > 4.0 * (1.0 / x - 1.0 / (x * x)) {
                    continue;
                }
                x
            } else {
                let x = beta / (1.0 + 2.0 * alpha * r2);
                let mu = 1.0 + (1.0 - x) / alpha;
                if r3 > 0.5 * (mu * mu + 1.0 / x) {
                    continue;
                }
                x
            };
            let outgoing = energy / x;
            // a Compton electron needs a non-zero energy transfer
            if !(outgoing < energy) {
                continue;
            }
            let mu = (1.0 + (1.0 - x) / alpha).clamp(-1.0, 1.0);
            return Ok((outgoing, mu));
        }

        Err(CollisionError::NumericalFailure {
            energy,
            parameter: MAX_KAHN_TRIALS as f64,
            message: "Klein-Nishina rejection sampling did not accept".to_string(),
        })
    }
}

impl ScatteringDistribution for IncoherentPhotonDistribution {
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<()> {
        let energy = particle.energy;
        let (outgoing_energy, mu) = self.sample_klein_nishina(energy, rng)?;
        let phi = sample_azimuthal_angle(rng);

        let incoming = Vector3::from_row_slice(&particle.direction);
        particle.rotate(mu, phi);
        let outgoing = Vector3::from_row_slice(&particle.direction);
        particle.energy = outgoing_energy;

        let electron_energy = energy - outgoing_energy;
        if electron_energy > 0.0 {
            // momentum balance, photon momenta in MeV/c
            let momentum: Vector3<f64> = energy * incoming - outgoing_energy * outgoing;
            let norm = momentum.norm();
            if norm > 0.0 {
                let direction = momentum / norm;
                bank.push(particle.create_secondary(
                    ParticleType::Electron,
                    [direction.x, direction.y, direction.z],
                    electron_energy,
                ));
            }
        }
        Ok(())
    }

    fn emitted_electron_count(&self, energy: f64) -> u32 {
        u32::from(energy > 0.0 && energy.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedSequence;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_compton_kinematics() {
        let distribution = IncoherentPhotonDistribution::new();
        let mut rng = StdRng::seed_from_u64(77);
        for _ in 0..1000 {
            let energy = 1.0;
            let (outgoing, mu) = distribution.sample_klein_nishina(energy, &mut rng).unwrap();
            let alpha = energy / ELECTRON_REST_MASS_ENERGY;
            assert!(outgoing >= energy / (1.0 + 2.0 * alpha) - 1e-12 && outgoing <= energy);
            // Compton relation
            assert_relative_eq!(outgoing, energy / (1.0 + alpha * (1.0 - mu)), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_electron_momentum_balance() {
        let distribution = IncoherentPhotonDistribution::new();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let mut photon = Particle::new(ParticleType::Photon, [0.0; 3], [0.0, 0.0, 1.0], 2.0);
            let mut bank = ParticleBank::new();
            distribution.scatter(&mut photon, &mut bank, &mut rng).unwrap();
            let electron = bank.pop_particle().unwrap();
            assert_relative_eq!(electron.energy + photon.energy, 2.0, max_relative = 1e-14);

            let electron_momentum =
                (electron.energy * (electron.energy + 2.0 * ELECTRON_REST_MASS_ENERGY)).sqrt();
            let balance: Vec<f64> = (0..3)
                .map(|i| 2.0 * [0.0, 0.0, 1.0][i] - photon.energy * photon.direction[i])
                .collect();
            for i in 0..3 {
                assert_relative_eq!(
                    electron_momentum * electron.direction[i],
                    balance[i],
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_zero_transfer_is_redrawn() {
        let distribution = IncoherentPhotonDistribution::new();
        // first trial x = 1 with r3 = 0 would leave the photon unscattered
        let mut rng = FixedSequence::new(vec![0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.25]);
        let mut photon = Particle::new(ParticleType::Photon, [0.0; 3], [0.0, 0.0, 1.0], 1.0);
        let mut bank = ParticleBank::new();
        distribution.scatter(&mut photon, &mut bank, &mut rng).unwrap();
        assert_eq!(rng.remaining(), 0);
        assert!(photon.energy < 1.0);
        assert_eq!(bank.len() as u32, distribution.emitted_electron_count(1.0));
        assert!(bank.pop_particle().unwrap().energy > 0.0);
        assert_eq!(distribution.emitted_electron_count(0.0), 0);
    }

    #[test]
    fn test_trial_cap() {
        let distribution = IncoherentPhotonDistribution::new();
        // r2 = 0 gives x = 1 and a zero acceptance probability on the first branch
        let values: Vec<f64> = (0..MAX_KAHN_TRIALS).flat_map(|_| [0.0, 0.0, 0.5]).collect();
        let mut rng = FixedSequence::new(values);
        assert!(matches!(
            distribution.sample_klein_nishina(1.0, &mut rng),
            Err(CollisionError::NumericalFailure { .. })
        ));
    }
}
