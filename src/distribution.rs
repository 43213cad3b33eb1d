// One-dimensional probability distributions over a single secondary variable
// (outgoing energy or scattering-angle cosine).

use crate::error::{check_random_number, CollisionError, CollisionResult};
use crate::interpolation::InterpolationScheme;
use crate::random::RandomSource;
use crate::screened_rutherford::ScreenedRutherfordDistribution;

/// Evaluation and sampling contract shared by every one-dimensional distribution.
///
/// `evaluate*` return 0 outside `[lower_bound, upper_bound]` rather than
/// failing; `evaluate_cdf` returns 0 below and 1 above the bounds. Sampling
/// never extrapolates past the bounds.
pub trait UnivariateDistribution {
    /// Raw (possibly unnormalized) tabulated or analytic value at `x`
    fn evaluate(&self, x: f64) -> f64;

    /// Normalized probability density at `x`
    fn evaluate_pdf(&self, x: f64) -> f64;

    /// Cumulative probability up to `x`
    fn evaluate_cdf(&self, x: f64) -> f64;

    /// Invert the CDF at `random_number` in [0, 1]
    fn sample_with_random_number(&self, random_number: f64) -> CollisionResult<f64>;

    fn lower_bound(&self) -> f64;

    fn upper_bound(&self) -> f64;

    fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> CollisionResult<f64>
    where
        Self: Sized,
    {
        self.sample_with_random_number(rng.random_number())
    }
}

//=====================================================================
// Tabular distribution: (x, value) pairs joined by an interpolation
// scheme. The CDF is the exact integral of the interpolated density, so
// inversion within a bin is closed form for every supported scheme.
//=====================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDistribution {
    x: Vec<f64>,
    values: Vec<f64>,
    cdf: Vec<f64>,
    norm: f64,
    scheme: InterpolationScheme,
}

// Power-law and exponential bins whose parameters degenerate are treated as
// linear so integration and inversion stay consistent.
const DEGENERATE_EXPONENT: f64 = 1e-12;

impl TabularDistribution {
    pub fn new(x: Vec<f64>, values: Vec<f64>, scheme: InterpolationScheme) -> CollisionResult<Self> {
        if scheme == InterpolationScheme::LinLog {
            return Err(CollisionError::InvalidGrid(
                "TabularDistribution: LinLog densities cannot be inverted in closed form".to_string(),
            ));
        }
        if x.len() < 2 {
            return Err(CollisionError::InvalidGrid(format!(
                "TabularDistribution: at least two points are required, got {}",
                x.len()
            )));
        }
        if x.len() != values.len() {
            return Err(CollisionError::InvalidGrid(format!(
                "TabularDistribution: x ({}) and values ({}) must be of the same length",
                x.len(),
                values.len()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) || values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CollisionError::InvalidGrid(
                "TabularDistribution: values must be finite and non-negative".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CollisionError::InvalidGrid(
                "TabularDistribution: x values must be strictly increasing".to_string(),
            ));
        }

        let mut distribution = Self {
            x,
            values,
            cdf: Vec::new(),
            norm: 1.0,
            scheme,
        };

        let mut cdf = Vec::with_capacity(distribution.x.len());
        cdf.push(0.0);
        let mut running = 0.0;
        for bin in 0..distribution.x.len() - 1 {
            running += distribution.bin_integral(bin, distribution.x[bin + 1]);
            cdf.push(running);
        }
        if !(running > 0.0 && running.is_finite()) {
            return Err(CollisionError::InvalidGrid(format!(
                "TabularDistribution: distribution cannot be normalized (integral = {})",
                running
            )));
        }
        for value in cdf.iter_mut() {
            *value /= running;
        }
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        distribution.cdf = cdf;
        distribution.norm = running;
        Ok(distribution)
    }

    /// Build from a probability density, rescaling it to unit area.
    pub fn from_pdf(x: Vec<f64>, pdf: Vec<f64>, scheme: InterpolationScheme) -> CollisionResult<Self> {
        let raw = Self::new(x, pdf, scheme)?;
        let norm = raw.norm;
        Ok(Self {
            values: raw.values.iter().map(|v| v / norm).collect(),
            norm: 1.0,
            ..raw
        })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    pub fn scheme(&self) -> InterpolationScheme {
        self.scheme
    }

    /// Integral of the raw values over the whole domain
    pub fn norm(&self) -> f64 {
        self.norm
    }

    // Scheme used for a bin after degenerate-case fallbacks.
    fn bin_scheme(&self, bin: usize) -> InterpolationScheme {
        let (x0, x1) = (self.x[bin], self.x[bin + 1]);
        let (y0, y1) = (self.values[bin], self.values[bin + 1]);
        match self.scheme {
            InterpolationScheme::LogLin if y0 > 0.0 && y1 > 0.0 => InterpolationScheme::LogLin,
            InterpolationScheme::LogLog if x0 > 0.0 && y0 > 0.0 && y1 > 0.0 && x1 > 0.0 => {
                InterpolationScheme::LogLog
            }
            InterpolationScheme::Histogram => InterpolationScheme::Histogram,
            _ => InterpolationScheme::LinLin,
        }
    }

    fn bin_value(&self, bin: usize, x_val: f64) -> f64 {
        self.bin_scheme(bin).interpolate(
            self.x[bin],
            self.x[bin + 1],
            self.values[bin],
            self.values[bin + 1],
            x_val,
        )
    }

    // Integral of the raw density from the bin start to `x_val`.
    fn bin_integral(&self, bin: usize, x_val: f64) -> f64 {
        let (x0, x1) = (self.x[bin], self.x[bin + 1]);
        let (y0, y1) = (self.values[bin], self.values[bin + 1]);
        let d = x_val - x0;
        match self.bin_scheme(bin) {
            InterpolationScheme::Histogram => y0 * d,
            InterpolationScheme::LogLin => {
                let b = (y1 / y0).ln() / (x1 - x0);
                if (b * (x1 - x0)).abs() < DEGENERATE_EXPONENT {
                    y0 * d
                } else {
                    y0 * (b * d).exp_m1() / b
                }
            }
            InterpolationScheme::LogLog => {
                let b = (y1 / y0).ln() / (x1 / x0).ln();
                let ratio = x_val / x0;
                if (b + 1.0).abs() < DEGENERATE_EXPONENT {
                    y0 * x0 * ratio.ln()
                } else {
                    y0 * x0 * ((b + 1.0) * ratio.ln()).exp_m1() / (b + 1.0)
                }
            }
            _ => {
                let slope = (y1 - y0) / (x1 - x0);
                d * (y0 + 0.5 * slope * d)
            }
        }
    }

    // Position within a bin whose partial integral equals `target`.
    fn bin_inverse(&self, bin: usize, target: f64) -> f64 {
        let (x0, x1) = (self.x[bin], self.x[bin + 1]);
        let (y0, y1) = (self.values[bin], self.values[bin + 1]);
        let x_val = match self.bin_scheme(bin) {
            InterpolationScheme::Histogram => {
                if y0 > 0.0 {
                    x0 + target / y0
                } else {
                    x0
                }
            }
            InterpolationScheme::LogLin => {
                let b = (y1 / y0).ln() / (x1 - x0);
                if (b * (x1 - x0)).abs() < DEGENERATE_EXPONENT {
                    x0 + target / y0
                } else {
                    x0 + (b * target / y0).ln_1p() / b
                }
            }
            InterpolationScheme::LogLog => {
                let b = (y1 / y0).ln() / (x1 / x0).ln();
                if (b + 1.0).abs() < DEGENERATE_EXPONENT {
                    x0 * (target / (y0 * x0)).exp()
                } else {
                    x0 * (((b + 1.0) * target / (y0 * x0)).ln_1p() / (b + 1.0)).exp()
                }
            }
            _ => {
                let slope = (y1 - y0) / (x1 - x0);
                let discriminant = (y0 * y0 + 2.0 * slope * target).max(0.0);
                let denominator = y0 + discriminant.sqrt();
                if denominator > 0.0 {
                    x0 + 2.0 * target / denominator
                } else {
                    x0
                }
            }
        };
        if x_val.is_nan() {
            x0
        } else {
            x_val.clamp(x0, x1)
        }
    }

    // Bin containing x_val, assuming it lies inside the bounds.
    fn bin_of(&self, x_val: f64) -> usize {
        let upper = self.x.partition_point(|&x| x <= x_val);
        upper.saturating_sub(1).min(self.x.len() - 2)
    }
}

impl UnivariateDistribution for TabularDistribution {
    fn evaluate(&self, x_val: f64) -> f64 {
        if !(x_val >= self.lower_bound() && x_val <= self.upper_bound()) {
            return 0.0;
        }
        let bin = self.bin_of(x_val);
        if x_val == self.x[bin] {
            return self.values[bin];
        }
        if x_val == self.x[bin + 1] {
            return self.values[bin + 1];
        }
        self.bin_value(bin, x_val)
    }

    fn evaluate_pdf(&self, x_val: f64) -> f64 {
        self.evaluate(x_val) / self.norm
    }

    fn evaluate_cdf(&self, x_val: f64) -> f64 {
        if x_val.is_nan() || x_val <= self.lower_bound() {
            return 0.0;
        }
        if x_val >= self.upper_bound() {
            return 1.0;
        }
        let bin = self.bin_of(x_val);
        (self.cdf[bin] + self.bin_integral(bin, x_val) / self.norm).clamp(0.0, 1.0)
    }

    fn sample_with_random_number(&self, random_number: f64) -> CollisionResult<f64> {
        check_random_number(random_number)?;
        if random_number >= 1.0 {
            return Ok(self.upper_bound());
        }
        // first cdf entry strictly above the random number, so empty bins are skipped
        let upper = self.cdf.partition_point(|&c| c <= random_number);
        let bin = upper.saturating_sub(1).min(self.x.len() - 2);
        let target = (random_number - self.cdf[bin]) * self.norm;
        let x_val = self.bin_inverse(bin, target);
        Ok(x_val.clamp(self.lower_bound(), self.upper_bound()))
    }

    fn lower_bound(&self) -> f64 {
        self.x[0]
    }

    fn upper_bound(&self) -> f64 {
        self.x[self.x.len() - 1]
    }
}

//=====================================================================
// Closed set of one-dimensional distribution kinds.
//=====================================================================
#[derive(Debug, Clone, PartialEq)]
pub enum OneDDistribution {
    Tabular(TabularDistribution),
    ScreenedRutherford(ScreenedRutherfordDistribution),
}

impl From<TabularDistribution> for OneDDistribution {
    fn from(distribution: TabularDistribution) -> Self {
        OneDDistribution::Tabular(distribution)
    }
}

impl From<ScreenedRutherfordDistribution> for OneDDistribution {
    fn from(distribution: ScreenedRutherfordDistribution) -> Self {
        OneDDistribution::ScreenedRutherford(distribution)
    }
}

impl UnivariateDistribution for OneDDistribution {
    fn evaluate(&self, x: f64) -> f64 {
        match self {
            OneDDistribution::Tabular(d) => d.evaluate(x),
            OneDDistribution::ScreenedRutherford(d) => d.evaluate(x),
        }
    }

    fn evaluate_pdf(&self, x: f64) -> f64 {
        match self {
            OneDDistribution::Tabular(d) => d.evaluate_pdf(x),
            OneDDistribution::ScreenedRutherford(d) => d.evaluate_pdf(x),
        }
    }

    fn evaluate_cdf(&self, x: f64) -> f64 {
        match self {
            OneDDistribution::Tabular(d) => d.evaluate_cdf(x),
            OneDDistribution::ScreenedRutherford(d) => d.evaluate_cdf(x),
        }
    }

    fn sample_with_random_number(&self, random_number: f64) -> CollisionResult<f64> {
        match self {
            OneDDistribution::Tabular(d) => d.sample_with_random_number(random_number),
            OneDDistribution::ScreenedRutherford(d) => d.sample_with_random_number(random_number),
        }
    }

    fn lower_bound(&self) -> f64 {
        match self {
            OneDDistribution::Tabular(d) => d.lower_bound(),
            OneDDistribution::ScreenedRutherford(d) => d.lower_bound(),
        }
    }

    fn upper_bound(&self) -> f64 {
        match self {
            OneDDistribution::Tabular(d) => d.upper_bound(),
            OneDDistribution::ScreenedRutherford(d) => d.upper_bound(),
        }
    }
}
