// Analytic screened-Rutherford angular distribution for the near-forward
// elastic tail, defined on the cosine interval [μ_c, 1].

use crate::constants::{ELECTRON_REST_MASS_ENERGY, FINE_STRUCTURE_CONSTANT, THOMAS_FERMI_COEFFICIENT};
use crate::distribution::UnivariateDistribution;
use crate::error::{check_energy, check_random_number, CollisionError, CollisionResult};

/// Screened-Rutherford distribution with shape `1 / (η + 1 - μ)²` on `[μ_c, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedRutherfordDistribution {
    eta: f64,
    cutoff_cosine: f64,
}

impl ScreenedRutherfordDistribution {
    pub fn new(eta: f64, cutoff_cosine: f64) -> CollisionResult<Self> {
        if !(eta.is_finite() && eta > 0.0) {
            return Err(CollisionError::Domain(format!(
                "screening constant {} must be finite and positive",
                eta
            )));
        }
        if !(-1.0..1.0).contains(&cutoff_cosine) {
            return Err(CollisionError::Domain(format!(
                "cutoff cosine {} must lie in [-1, 1)",
                cutoff_cosine
            )));
        }
        Ok(Self { eta, cutoff_cosine })
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn cutoff_cosine(&self) -> f64 {
        self.cutoff_cosine
    }

    /// Integral of the raw shape over `[μ_c, 1]`
    pub fn norm(&self) -> f64 {
        let delta = 1.0 - self.cutoff_cosine;
        delta / (self.eta * (self.eta + delta))
    }
}

impl UnivariateDistribution for ScreenedRutherfordDistribution {
    fn evaluate(&self, mu: f64) -> f64 {
        if !(mu >= self.cutoff_cosine && mu <= 1.0) {
            return 0.0;
        }
        let denominator = self.eta + 1.0 - mu;
        1.0 / (denominator * denominator)
    }

    fn evaluate_pdf(&self, mu: f64) -> f64 {
        self.evaluate(mu) / self.norm()
    }

    fn evaluate_cdf(&self, mu: f64) -> f64 {
        if mu.is_nan() || mu <= self.cutoff_cosine {
            return 0.0;
        }
        if mu >= 1.0 {
            return 1.0;
        }
        let delta = 1.0 - self.cutoff_cosine;
        (self.eta * (mu - self.cutoff_cosine) / (delta * (self.eta + 1.0 - mu))).clamp(0.0, 1.0)
    }

    fn sample_with_random_number(&self, random_number: f64) -> CollisionResult<f64> {
        check_random_number(random_number)?;
        let delta = 1.0 - self.cutoff_cosine;
        let mu = 1.0 - delta * (self.eta * (1.0 - random_number) / (self.eta + random_number * delta));
        Ok(mu.clamp(self.cutoff_cosine, 1.0))
    }

    fn lower_bound(&self) -> f64 {
        self.cutoff_cosine
    }

    fn upper_bound(&self) -> f64 {
        1.0
    }
}

/// Moliere screening constant η(Z, E) for an electron of kinetic energy
/// `energy` [MeV] scattering off an atom of atomic number `atomic_number`.
pub fn moliere_screening_constant(atomic_number: u32, energy: f64) -> CollisionResult<f64> {
    check_energy(energy)?;
    let z = atomic_number as f64;
    // momentum squared in units of (m_e c)²
    let p_squared =
        energy * (energy + 2.0 * ELECTRON_REST_MASS_ENERGY) / (ELECTRON_REST_MASS_ENERGY * ELECTRON_REST_MASS_ENERGY);
    let beta_squared = p_squared / (1.0 + p_squared);
    let alpha_z = FINE_STRUCTURE_CONSTANT * z;

    let screening = (FINE_STRUCTURE_CONSTANT / THOMAS_FERMI_COEFFICIENT).powi(2) * z.powf(2.0 / 3.0)
        / (4.0 * p_squared);
    let eta = screening * (1.13 + 3.76 * alpha_z * alpha_z / beta_squared);

    if !(eta.is_finite() && eta > 0.0) {
        return Err(CollisionError::NumericalFailure {
            energy,
            parameter: eta,
            message: format!("Moliere screening constant is not positive for Z = {}", atomic_number),
        });
    }
    Ok(eta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_sample_endpoints() {
        let distribution = ScreenedRutherfordDistribution::new(2.5e-5, 0.999999).unwrap();
        assert_eq!(distribution.sample_with_random_number(0.0).unwrap(), 0.999999);
        assert_eq!(distribution.sample_with_random_number(1.0).unwrap(), 1.0);
        assert_eq!(distribution.sample_with_random_number(1.0 - 1e-15).unwrap(), 1.0);
    }

    #[test]
    fn test_cdf_inverts_sample() {
        let distribution = ScreenedRutherfordDistribution::new(1e-3, 0.9).unwrap();
        for i in 1..10 {
            let xi = i as f64 / 10.0;
            let mu = distribution.sample_with_random_number(xi).unwrap();
            assert_relative_eq!(distribution.evaluate_cdf(mu), xi, epsilon = 1e-10);
        }
        assert_abs_diff_eq!(distribution.evaluate_cdf(0.9), 0.0);
        assert_abs_diff_eq!(distribution.evaluate_cdf(1.0), 1.0);
    }

    #[test]
    fn test_pdf_integrates_to_one() {
        let distribution = ScreenedRutherfordDistribution::new(1e-2, 0.5).unwrap();
        let n = 200_000;
        let width = 0.5 / n as f64;
        let integral: f64 = (0..n)
            .map(|i| distribution.evaluate_pdf(0.5 + (i as f64 + 0.5) * width) * width)
            .sum();
        assert_relative_eq!(integral, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_evaluate_outside_domain() {
        let distribution = ScreenedRutherfordDistribution::new(1e-2, 0.5).unwrap();
        assert_eq!(distribution.evaluate(0.4), 0.0);
        assert_eq!(distribution.evaluate(1.1), 0.0);
        assert_relative_eq!(distribution.evaluate(1.0), 1.0e4);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ScreenedRutherfordDistribution::new(0.0, 0.9).is_err());
        assert!(ScreenedRutherfordDistribution::new(f64::NAN, 0.9).is_err());
        assert!(ScreenedRutherfordDistribution::new(1e-3, 1.0).is_err());
        assert!(ScreenedRutherfordDistribution::new(1e-3, -1.5).is_err());
    }

    #[test]
    fn test_moliere_decreases_with_energy() {
        let low = moliere_screening_constant(79, 1e-3).unwrap();
        let high = moliere_screening_constant(79, 66.25).unwrap();
        assert!(low > high);
        assert!(high > 0.0);
    }

    #[test]
    fn test_moliere_rejects_zero_energy() {
        assert!(matches!(
            moliere_screening_constant(1, 0.0),
            Err(CollisionError::NumericalFailure { .. })
        ));
        assert!(matches!(
            moliere_screening_constant(1, -1.0),
            Err(CollisionError::Domain(_))
        ));
    }
}
