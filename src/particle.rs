use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleType {
    Neutron,
    Photon,
    Electron,
    Positron,
}

impl std::fmt::Display for ParticleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticleType::Neutron => write!(f, "neutron"),
            ParticleType::Photon => write!(f, "photon"),
            ParticleType::Electron => write!(f, "electron"),
            ParticleType::Positron => write!(f, "positron"),
        }
    }
}

/// State of a particle at a collision site. Energies are in MeV.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy: f64,
    /// Cleared when the particle is absorbed or falls below its energy floor;
    /// removal from transport is left to the caller.
    pub alive: bool,
    pub generation: u32,
}

impl Particle {
    pub fn new(particle_type: ParticleType, position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Self {
            particle_type,
            position,
            direction,
            energy,
            alive: true,
            generation: 0,
        }
    }

    /// A new particle born at this particle's position, one generation later.
    pub fn create_secondary(&self, particle_type: ParticleType, direction: [f64; 3], energy: f64) -> Particle {
        Particle {
            particle_type,
            position: self.position,
            direction,
            energy,
            alive: true,
            generation: self.generation + 1,
        }
    }

    pub fn is_gone(&self) -> bool {
        !self.alive
    }

    pub fn set_as_gone(&mut self) {
        self.alive = false;
    }

    /// Turn the direction through polar cosine `mu` and azimuth `phi`.
    pub fn rotate(&mut self, mu: f64, phi: f64) {
        self.direction = rotate_direction(&self.direction, mu, phi);
    }
}

/// Rotate `direction` to a new unit vector at cosine `mu` from it, with
/// azimuth `phi` about it.
pub fn rotate_direction(direction: &[f64; 3], mu: f64, phi: f64) -> [f64; 3] {
    let u = Vector3::from_row_slice(direction).normalize();
    let mu = mu.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    let perp = if u.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(&u).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(&u).normalize()
    };
    let ortho = u.cross(&perp);

    let rotated = (mu * u + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho).normalize();
    [rotated.x, rotated.y, rotated.z]
}

/// Uniform azimuthal angle in [0, 2π).
pub fn sample_azimuthal_angle<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    2.0 * std::f64::consts::PI * rng.random_number()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn test_particle_construction() {
        let p = Particle::new(ParticleType::Electron, [0.0, 1.0, 2.0], [1.0, 0.0, 0.0], 1.0);
        assert_eq!(p.position, [0.0, 1.0, 2.0]);
        assert_eq!(p.direction, [1.0, 0.0, 0.0]);
        assert_eq!(p.energy, 1.0);
        assert_eq!(p.generation, 0);
        assert!(p.alive);
        assert!(!p.is_gone());
    }

    #[test]
    fn test_secondary_inherits_position() {
        let mut p = Particle::new(ParticleType::Electron, [1.0, 2.0, 3.0], [0.0, 0.0, 1.0], 10.0);
        p.generation = 2;
        let s = p.create_secondary(ParticleType::Photon, [1.0, 0.0, 0.0], 0.5);
        assert_eq!(s.position, p.position);
        assert_eq!(s.particle_type, ParticleType::Photon);
        assert_eq!(s.generation, 3);
        assert!(s.alive);
    }

    #[test]
    fn test_rotation_preserves_cosine() {
        let directions = [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.6, 0.0, 0.8]];
        for direction in directions {
            for &(mu, phi) in &[(0.5, 0.3), (-0.9, 4.0), (1.0, 1.0), (-1.0, 0.0)] {
                let rotated = rotate_direction(&direction, mu, phi);
                assert_abs_diff_eq!(dot(&rotated, &rotated), 1.0, epsilon = 1e-12);
                assert_abs_diff_eq!(dot(&rotated, &direction), mu, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_set_as_gone() {
        let mut p = Particle::new(ParticleType::Photon, [0.0; 3], [0.0, 0.0, 1.0], 1.0);
        p.set_as_gone();
        assert!(p.is_gone());
    }
}
