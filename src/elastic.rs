// Composite elastic angular distribution: tabulated cutoff distribution for
// μ ≤ μ_c joined to an analytic screened-Rutherford tail on (μ_c, 1].

use serde::{Deserialize, Serialize};

use crate::distribution::UnivariateDistribution;
use crate::error::{check_energy, check_random_number, CollisionError, CollisionResult};
use crate::grid::{Bracket, GridBin};
use crate::interpolation::{AxisScale, TabulatedFunction};
use crate::random::RandomSource;
use crate::screened_rutherford::{moliere_screening_constant, ScreenedRutherfordDistribution};
use crate::two_d::{bisect, TwoDDistribution};

/// Tolerance on each cutoff bin's upper bound matching the cutoff cosine.
pub const CUTOFF_COSINE_TOLERANCE: f64 = 1e-12;

/// How a coupled distribution combines neighbouring energy bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoupledSamplingMethod {
    /// Sample each bin's full coupled distribution, then interpolate.
    OneDUnion,
    /// Interpolate each region separately; only the region boundary is shared.
    TwoDUnion,
    /// Use the energy-interpolated cutoff ratio and seam density.
    #[default]
    SimplifiedUnion,
}

impl std::fmt::Display for CoupledSamplingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoupledSamplingMethod::OneDUnion => write!(f, "OneDUnion"),
            CoupledSamplingMethod::TwoDUnion => write!(f, "TwoDUnion"),
            CoupledSamplingMethod::SimplifiedUnion => write!(f, "SimplifiedUnion"),
        }
    }
}

/// Rule for combining the cutoff region with the screened-Rutherford tail.
#[derive(Debug, Clone, PartialEq)]
pub enum ElasticDiscipline {
    /// One distribution over [-1, 1]. `cutoff_ratios` is σ_cutoff/σ_total per
    /// energy; the tail's screening constant follows from seam continuity.
    Coupled {
        cutoff_ratios: TabulatedFunction,
        method: CoupledSamplingMethod,
    },
    /// Independently normalized regions chosen by σ_cutoff/σ_total, with the
    /// Moliere screening constant for the tail.
    Decoupled { cutoff_ratios: TabulatedFunction },
    /// As decoupled, with the region chosen by σ_cutoff/(σ_cutoff + σ_mp).
    Hybrid {
        cutoff_cross_section: TabulatedFunction,
        moment_preserving_cross_section: TabulatedFunction,
    },
}

impl ElasticDiscipline {
    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            ElasticDiscipline::Coupled { .. } => "Coupled",
            ElasticDiscipline::Decoupled { .. } => "Decoupled",
            ElasticDiscipline::Hybrid { .. } => "Hybrid",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositeElasticModel {
    cutoff: TwoDDistribution,
    cutoff_cosine: f64,
    atomic_number: u32,
    discipline: ElasticDiscipline,
}

impl CompositeElasticModel {
    /// Build a composite model. Every cutoff bin must end at `cutoff_cosine`.
    pub fn new(
        cutoff: TwoDDistribution,
        cutoff_cosine: f64,
        atomic_number: u32,
        discipline: ElasticDiscipline,
    ) -> CollisionResult<Self> {
        if !(cutoff_cosine > -1.0 && cutoff_cosine <= 1.0) {
            return Err(CollisionError::InvalidGrid(format!(
                "cutoff cosine {} must lie in (-1, 1]",
                cutoff_cosine
            )));
        }
        if atomic_number == 0 {
            return Err(CollisionError::InvalidGrid(
                "atomic number must be positive".to_string(),
            ));
        }
        if let Some(bin) = cutoff
            .grid()
            .bins()
            .iter()
            .find(|bin| (bin.upper_bound() - cutoff_cosine).abs() > CUTOFF_COSINE_TOLERANCE)
        {
            return Err(CollisionError::InvalidGrid(format!(
                "cutoff distribution at {} MeV ends at {}, expected the cutoff cosine {}",
                bin.primary,
                bin.upper_bound(),
                cutoff_cosine
            )));
        }
        match &discipline {
            ElasticDiscipline::Coupled { cutoff_ratios, .. } | ElasticDiscipline::Decoupled { cutoff_ratios } => {
                if cutoff_ratios.y().iter().any(|r| !(0.0..=1.0).contains(r)) {
                    return Err(CollisionError::InvalidGrid(
                        "cutoff cross section ratios must lie in [0, 1]".to_string(),
                    ));
                }
            }
            ElasticDiscipline::Hybrid {
                cutoff_cross_section,
                moment_preserving_cross_section,
            } => {
                if cutoff_cross_section
                    .y()
                    .iter()
                    .chain(moment_preserving_cross_section.y())
                    .any(|xs| *xs < 0.0)
                {
                    return Err(CollisionError::InvalidGrid(
                        "hybrid cross sections must be non-negative".to_string(),
                    ));
                }
            }
        }
        log::debug!(
            "Built {} elastic model for Z = {} with cutoff cosine {}",
            discipline.name(),
            atomic_number,
            cutoff_cosine
        );
        Ok(Self {
            cutoff,
            cutoff_cosine,
            atomic_number,
            discipline,
        })
    }

    /// Tabulated distribution of the cutoff region.
    pub fn cutoff_distribution(&self) -> &TwoDDistribution {
        &self.cutoff
    }

    /// Cosine separating the cutoff region from the tail.
    pub fn cutoff_cosine(&self) -> f64 {
        self.cutoff_cosine
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    /// How the two regions are combined.
    pub fn discipline(&self) -> &ElasticDiscipline {
        &self.discipline
    }

    fn has_tail(&self) -> bool {
        self.cutoff_cosine < 1.0
    }

    fn delta(&self) -> f64 {
        1.0 - self.cutoff_cosine
    }

    /// Probability of scattering into the cutoff region at `energy`.
    pub fn cutoff_probability(&self, energy: f64) -> CollisionResult<f64> {
        check_energy(energy)?;
        if !self.has_tail() {
            return Ok(1.0);
        }
        Ok(match &self.discipline {
            ElasticDiscipline::Coupled { cutoff_ratios, .. } | ElasticDiscipline::Decoupled { cutoff_ratios } => {
                cutoff_ratios.evaluate(energy).clamp(0.0, 1.0)
            }
            ElasticDiscipline::Hybrid {
                cutoff_cross_section,
                moment_preserving_cross_section,
            } => {
                let cutoff = cutoff_cross_section.evaluate(energy);
                let total = cutoff + moment_preserving_cross_section.evaluate(energy);
                if total > 0.0 {
                    (cutoff / total).clamp(0.0, 1.0)
                } else {
                    1.0
                }
            }
        })
    }

    /// Screening constant of the tail at `energy`.
    pub fn screening_constant(&self, energy: f64) -> CollisionResult<f64> {
        check_energy(energy)?;
        match &self.discipline {
            ElasticDiscipline::Coupled { .. } => {
                let ratio = self.cutoff_probability(energy)?;
                let seam_pdf = self.cutoff.evaluate_pdf(energy, self.cutoff_cosine)?;
                self.coupled_eta(energy, ratio, seam_pdf)
            }
            _ => moliere_screening_constant(self.atomic_number, energy),
        }
    }

    // Screening constant making (1 - c)·tail pdf equal c·f_A at the seam.
    fn coupled_eta(&self, energy: f64, ratio: f64, seam_pdf: f64) -> CollisionResult<f64> {
        let delta = self.delta();
        let weight = ratio * seam_pdf * delta;
        let eta = weight * delta / ((1.0 - ratio) - weight);
        if !(eta.is_finite() && eta > 0.0) {
            return Err(CollisionError::NumericalFailure {
                energy,
                parameter: eta,
                message: format!(
                    "inconsistent coupled screening constant (cutoff ratio {}, seam pdf {})",
                    ratio, seam_pdf
                ),
            });
        }
        Ok(eta)
    }

    fn tail(&self, energy: f64) -> CollisionResult<ScreenedRutherfordDistribution> {
        ScreenedRutherfordDistribution::new(self.screening_constant(energy)?, self.cutoff_cosine)
    }

    /// Density at (energy, μ). The tail amplitude is matched to the cutoff
    /// density at μ_c, so the value is continuous across the seam.
    pub fn evaluate(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        if !self.has_tail() {
            return self.cutoff.evaluate_pdf(energy, mu);
        }
        match self.discipline {
            ElasticDiscipline::Coupled { .. } => self.mixture_pdf(energy, mu),
            _ => {
                let p = self.cutoff_probability(energy)?;
                if mu <= self.cutoff_cosine {
                    return Ok(p * self.cutoff.evaluate_pdf(energy, mu)?);
                }
                if mu > 1.0 {
                    return Ok(0.0);
                }
                let eta = self.screening_constant(energy)?;
                let seam = p * self.cutoff.evaluate_pdf(energy, self.cutoff_cosine)?;
                let ratio = (eta + self.delta()) / (eta + 1.0 - mu);
                Ok(seam * ratio * ratio)
            }
        }
    }

    /// Probability density of the sampled cosine at (energy, μ). Coupled
    /// models follow their union method between energy nodes.
    pub fn evaluate_pdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        if !self.has_tail() {
            return self.cutoff.evaluate_pdf(energy, mu);
        }
        match &self.discipline {
            ElasticDiscipline::Coupled {
                method: CoupledSamplingMethod::OneDUnion,
                ..
            } => self.one_d_union_pdf(energy, mu),
            ElasticDiscipline::Coupled {
                method: CoupledSamplingMethod::TwoDUnion,
                ..
            } => self.two_d_union_pdf(energy, mu),
            _ => self.mixture_pdf(energy, mu),
        }
    }

    /// Probability that the sampled cosine does not exceed μ.
    pub fn evaluate_cdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        if !self.has_tail() {
            return self.cutoff.evaluate_cdf(energy, mu);
        }
        match &self.discipline {
            ElasticDiscipline::Coupled {
                method: CoupledSamplingMethod::OneDUnion,
                ..
            } => self.one_d_union_cdf(energy, mu),
            ElasticDiscipline::Coupled {
                method: CoupledSamplingMethod::TwoDUnion,
                ..
            } => self.two_d_union_cdf(energy, mu),
            _ => self.mixture_cdf(energy, mu),
        }
    }

    // Cutoff density weighted by the region probability, tail at the
    // energy's own screening constant.
    fn mixture_pdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        let p = self.cutoff_probability(energy)?;
        if mu <= self.cutoff_cosine {
            return Ok(p * self.cutoff.evaluate_pdf(energy, mu)?);
        }
        if mu > 1.0 || p >= 1.0 {
            return Ok(0.0);
        }
        Ok((1.0 - p) * self.tail(energy)?.evaluate_pdf(mu))
    }

    fn mixture_cdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        let p = self.cutoff_probability(energy)?;
        if mu <= self.cutoff_cosine {
            return Ok(p * self.cutoff.evaluate_cdf(energy, mu)?);
        }
        if mu >= 1.0 || p >= 1.0 {
            return Ok(1.0);
        }
        Ok(p + (1.0 - p) * self.tail(energy)?.evaluate_cdf(mu))
    }

    /// Draw a scattering cosine. Coupled distributions consume one random
    /// number; decoupled and hybrid ones draw the region first.
    pub fn sample<R: RandomSource + ?Sized>(&self, energy: f64, rng: &mut R) -> CollisionResult<f64> {
        if !self.has_tail() {
            return self.cutoff.sample(energy, rng);
        }
        match self.discipline {
            ElasticDiscipline::Coupled { .. } => self.sample_with_random_number(energy, rng.random_number()),
            _ => {
                let p = self.cutoff_probability(energy)?;
                if rng.random_number() < p {
                    self.cutoff.sample(energy, rng)
                } else {
                    self.tail(energy)?.sample(rng)
                }
            }
        }
    }

    /// Draw a scattering cosine from an explicit random number.
    pub fn sample_with_random_number(&self, energy: f64, random_number: f64) -> CollisionResult<f64> {
        check_random_number(random_number)?;
        check_energy(energy)?;
        if !self.has_tail() {
            return self.cutoff.sample_with_random_number(energy, random_number);
        }
        match &self.discipline {
            ElasticDiscipline::Coupled { method, .. } => match method {
                CoupledSamplingMethod::SimplifiedUnion => self.sample_simplified_union(energy, random_number),
                CoupledSamplingMethod::TwoDUnion => self.sample_two_d_union(energy, random_number),
                CoupledSamplingMethod::OneDUnion => self.sample_one_d_union(energy, random_number),
            },
            _ => {
                let p = self.cutoff_probability(energy)?;
                match split(random_number, p) {
                    Region::Cutoff(xi) => self.cutoff.sample_with_random_number(energy, xi),
                    Region::Tail(xi) => self.tail(energy)?.sample_with_random_number(xi),
                }
            }
        }
    }

    fn sample_simplified_union(&self, energy: f64, random_number: f64) -> CollisionResult<f64> {
        let ratio = self.cutoff_probability(energy)?;
        match split(random_number, ratio) {
            Region::Cutoff(xi) => self.cutoff.sample_with_random_number(energy, xi),
            Region::Tail(xi) => {
                let seam_pdf = self.cutoff.evaluate_pdf(energy, self.cutoff_cosine)?;
                let eta = self.coupled_eta(energy, ratio, seam_pdf)?;
                ScreenedRutherfordDistribution::new(eta, self.cutoff_cosine)?.sample_with_random_number(xi)
            }
        }
    }

    fn sample_two_d_union(&self, energy: f64, random_number: f64) -> CollisionResult<f64> {
        let ratio = self.cutoff_probability(energy)?;
        match split(random_number, ratio) {
            Region::Cutoff(xi) => self.cutoff.sample_with_random_number(energy, xi),
            Region::Tail(xi) => match self.cutoff.bracket(energy)? {
                Bracket::Node(bin) => self.bin_tail(bin)?.sample_with_random_number(xi),
                Bracket::Between { lower, upper, fraction } => {
                    self.two_d_union_tail_sample(lower, upper, fraction, xi)
                }
            },
        }
    }

    fn sample_one_d_union(&self, energy: f64, random_number: f64) -> CollisionResult<f64> {
        match self.cutoff.bracket(energy)? {
            Bracket::Node(bin) => self.sample_bin(bin, random_number),
            Bracket::Between { lower, upper, fraction } => {
                let mu_lower = self.sample_bin(lower, random_number)?;
                let mu_upper = self.sample_bin(upper, random_number)?;
                let mu = self.cutoff.interpolate_secondary(mu_lower, mu_upper, fraction);
                Ok(mu.clamp(-1.0, 1.0))
            }
        }
    }

    fn two_d_union_tail_sample(&self, lower: &GridBin, upper: &GridBin, fraction: f64, xi: f64) -> CollisionResult<f64> {
        let mu_lower = self.bin_tail(lower)?.sample_with_random_number(xi)?;
        let mu_upper = self.bin_tail(upper)?.sample_with_random_number(xi)?;
        let mu = self.cutoff.interpolate_secondary(mu_lower, mu_upper, fraction);
        Ok(mu.clamp(self.cutoff_cosine, 1.0))
    }

    // Shared tail random number whose interpolated sample is `mu`.
    fn two_d_union_tail_cdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        match self.cutoff.bracket(energy)? {
            Bracket::Node(bin) => Ok(self.bin_tail(bin)?.evaluate_cdf(mu)),
            Bracket::Between { lower, upper, fraction } => {
                if mu <= self.two_d_union_tail_sample(lower, upper, fraction, 0.0)? {
                    return Ok(0.0);
                }
                if mu >= self.two_d_union_tail_sample(lower, upper, fraction, 1.0)? {
                    return Ok(1.0);
                }
                bisect(0.0, 1.0, mu, |xi| self.two_d_union_tail_sample(lower, upper, fraction, xi))
            }
        }
    }

    fn two_d_union_cdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        let p = self.cutoff_probability(energy)?;
        if mu <= self.cutoff_cosine {
            return Ok(p * self.cutoff.evaluate_cdf(energy, mu)?);
        }
        if mu >= 1.0 || p >= 1.0 {
            return Ok(1.0);
        }
        Ok(p + (1.0 - p) * self.two_d_union_tail_cdf(energy, mu)?)
    }

    fn two_d_union_pdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        let p = self.cutoff_probability(energy)?;
        if mu <= self.cutoff_cosine {
            return Ok(p * self.cutoff.evaluate_pdf(energy, mu)?);
        }
        if mu > 1.0 || p >= 1.0 {
            return Ok(0.0);
        }
        let tail_pdf = match self.cutoff.bracket(energy)? {
            Bracket::Node(bin) => self.bin_tail(bin)?.evaluate_pdf(mu),
            Bracket::Between { lower, upper, fraction } => {
                let xi = self.two_d_union_tail_cdf(energy, mu)?;
                let (lower_tail, upper_tail) = (self.bin_tail(lower)?, self.bin_tail(upper)?);
                let mu_lower = lower_tail.sample_with_random_number(xi)?;
                let mu_upper = upper_tail.sample_with_random_number(xi)?;
                self.interpolated_density(
                    fraction,
                    (mu_lower, lower_tail.evaluate_pdf(mu_lower)),
                    (mu_upper, upper_tail.evaluate_pdf(mu_upper)),
                    mu,
                )
            }
        };
        Ok((1.0 - p) * tail_pdf)
    }

    fn one_d_union_cdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        match self.cutoff.bracket(energy)? {
            Bracket::Node(bin) => self.bin_cdf(bin, mu),
            Bracket::Between { .. } => {
                if mu <= self.sample_one_d_union(energy, 0.0)? {
                    return Ok(0.0);
                }
                if mu >= self.sample_one_d_union(energy, 1.0)? {
                    return Ok(1.0);
                }
                bisect(0.0, 1.0, mu, |xi| self.sample_one_d_union(energy, xi))
            }
        }
    }

    fn one_d_union_pdf(&self, energy: f64, mu: f64) -> CollisionResult<f64> {
        match self.cutoff.bracket(energy)? {
            Bracket::Node(bin) => self.bin_pdf(bin, mu),
            Bracket::Between { lower, upper, fraction } => {
                if !(-1.0..=1.0).contains(&mu) {
                    return Ok(0.0);
                }
                let xi = self.one_d_union_cdf(energy, mu)?;
                let mu_lower = self.sample_bin(lower, xi)?;
                let mu_upper = self.sample_bin(upper, xi)?;
                Ok(self.interpolated_density(
                    fraction,
                    (mu_lower, self.bin_pdf(lower, mu_lower)?),
                    (mu_upper, self.bin_pdf(upper, mu_upper)?),
                    mu,
                ))
            }
        }
    }

    // Density of μ = interpolate(μ0(ξ), μ1(ξ)) given each bin's density at
    // its own sample.
    fn interpolated_density(&self, fraction: f64, lower: (f64, f64), upper: (f64, f64), mu: f64) -> f64 {
        let ((mu0, f0), (mu1, f1)) = (lower, upper);
        if !(f0 > 0.0 && f1 > 0.0) {
            return 0.0;
        }
        let scale = self.cutoff.policy().interpolation.secondary();
        let scale = if [mu0, mu1, mu].iter().all(|&x| scale.accepts(x)) {
            scale
        } else {
            AxisScale::Lin
        };
        let du_dxi = (1.0 - fraction) * scale.derivative(mu0) / f0 + fraction * scale.derivative(mu1) / f1;
        scale.derivative(mu) / du_dxi
    }

    // Coupled tail of a single energy bin.
    fn bin_tail(&self, bin: &GridBin) -> CollisionResult<ScreenedRutherfordDistribution> {
        let ratio = self.cutoff_probability(bin.primary)?;
        let seam_pdf = bin.distribution.evaluate_pdf(self.cutoff_cosine);
        let eta = self.coupled_eta(bin.primary, ratio, seam_pdf)?;
        ScreenedRutherfordDistribution::new(eta, self.cutoff_cosine)
    }

    // Full coupled distribution of a single energy bin.
    fn bin_pdf(&self, bin: &GridBin, mu: f64) -> CollisionResult<f64> {
        let ratio = self.cutoff_probability(bin.primary)?;
        if mu <= self.cutoff_cosine {
            return Ok(ratio * bin.distribution.evaluate_pdf(mu));
        }
        if mu > 1.0 || ratio >= 1.0 {
            return Ok(0.0);
        }
        Ok((1.0 - ratio) * self.bin_tail(bin)?.evaluate_pdf(mu))
    }

    fn bin_cdf(&self, bin: &GridBin, mu: f64) -> CollisionResult<f64> {
        let ratio = self.cutoff_probability(bin.primary)?;
        if mu <= self.cutoff_cosine {
            return Ok(ratio * bin.distribution.evaluate_cdf(mu));
        }
        if mu >= 1.0 || ratio >= 1.0 {
            return Ok(1.0);
        }
        Ok(ratio + (1.0 - ratio) * self.bin_tail(bin)?.evaluate_cdf(mu))
    }

    // Full coupled sample from a single energy bin.
    fn sample_bin(&self, bin: &GridBin, random_number: f64) -> CollisionResult<f64> {
        let ratio = self.cutoff_probability(bin.primary)?;
        match split(random_number, ratio) {
            Region::Cutoff(xi) => bin.distribution.sample_with_random_number(xi),
            Region::Tail(xi) => self.bin_tail(bin)?.sample_with_random_number(xi),
        }
    }
}

enum Region {
    Cutoff(f64),
    Tail(f64),
}

// Split a random number at the cutoff probability and rescale it to the
// chosen region.
fn split(random_number: f64, probability: f64) -> Region {
    if probability > 0.0 && random_number <= probability {
        Region::Cutoff((random_number / probability).min(1.0))
    } else {
        Region::Tail(((random_number - probability) / (1.0 - probability)).clamp(0.0, 1.0))
    }
}
