// Two-dimensional tabular distribution: a grid of one-dimensional
// distributions over a secondary variable, indexed by a primary variable
// (incoming energy), evaluated and sampled between grid points according to
// an InterpolationPolicy.

use std::fmt;
use std::sync::Arc;

use crate::distribution::{OneDDistribution, UnivariateDistribution};
use crate::error::{check_random_number, CollisionError, CollisionResult};
use crate::grid::{Bracket, GridBin, TwoDGrid};
use crate::interpolation::AxisScale;
use crate::policy::{GridSampling, InterpolationPolicy};
use crate::random::RandomSource;

/// Iteration cap for every bisection used to invert an interpolated CDF.
pub const MAX_BISECTION_ITERATIONS: usize = 200;

pub type BoundFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Secondary-variable bounds as functions of the primary value, e.g. the
/// maximum photon energy of bremsstrahlung equal to the incoming energy.
#[derive(Clone)]
pub struct SecondaryLimits {
    min: BoundFunction,
    max: BoundFunction,
}

impl SecondaryLimits {
    /// Limits from a lower and an upper bound function.
    pub fn new<F, G>(min: F, max: G) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
        G: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            min: Arc::new(min),
            max: Arc::new(max),
        }
    }

    /// Smallest secondary value allowed at `primary`.
    pub fn min(&self, primary: f64) -> f64 {
        (self.min)(primary)
    }

    /// Largest secondary value allowed at `primary`.
    pub fn max(&self, primary: f64) -> f64 {
        (self.max)(primary)
    }
}

impl fmt::Debug for SecondaryLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryLimits").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
enum Density {
    Raw,
    Pdf,
}

impl Density {
    fn of(self, distribution: &OneDDistribution, x: f64) -> f64 {
        match self {
            Density::Raw => distribution.evaluate(x),
            Density::Pdf => distribution.evaluate_pdf(x),
        }
    }
}

// Scale to use for a set of values; linear when any of them cannot be
// processed on `scale`.
fn guard(scale: AxisScale, values: &[f64]) -> AxisScale {
    if values.iter().all(|&v| scale.accepts(v)) {
        scale
    } else {
        AxisScale::Lin
    }
}

fn span(scale: AxisScale, lower: f64, upper: f64) -> f64 {
    scale.forward(upper) - scale.forward(lower)
}

fn to_unit(scale: AxisScale, lower: f64, upper: f64, x: f64) -> f64 {
    let width = span(scale, lower, upper);
    if width <= 0.0 {
        return 0.0;
    }
    ((scale.forward(x) - scale.forward(lower)) / width).clamp(0.0, 1.0)
}

fn from_unit(scale: AxisScale, lower: f64, upper: f64, eta: f64) -> f64 {
    if eta <= 0.0 {
        return lower;
    }
    if eta >= 1.0 {
        return upper;
    }
    scale
        .inverse(scale.forward(lower) + eta * span(scale, lower, upper))
        .clamp(lower, upper)
}

// Largest argument in [lower, upper] where the non-decreasing `f` stays
// below `target`, found by bounded bisection.
pub(crate) fn bisect<F>(lower: f64, upper: f64, target: f64, f: F) -> CollisionResult<f64>
where
    F: Fn(f64) -> CollisionResult<f64>,
{
    let (mut lo, mut hi) = (lower, upper);
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if f(mid)? < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

// Neighbouring bins of a primary value strictly inside the grid.
#[derive(Clone, Copy)]
struct Segment<'a> {
    lower: &'a GridBin,
    upper: &'a GridBin,
    fraction: f64,
    min: f64,
    max: f64,
}

impl<'a> Segment<'a> {
    fn lower_dist(&self) -> &'a OneDDistribution {
        &self.lower.distribution
    }

    fn upper_dist(&self) -> &'a OneDDistribution {
        &self.upper.distribution
    }

    fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }
}

// Part of a node bin's CDF that falls inside the attached limits.
#[derive(Clone, Copy)]
struct NodeWindow {
    min: f64,
    max: f64,
    cdf_min: f64,
    mass: f64,
}

impl NodeWindow {
    fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    // Where every sample goes when the bin has no probability inside the window.
    fn empty_sample(&self, bin: &GridBin) -> f64 {
        if bin.lower_bound() >= self.max {
            self.max
        } else {
            self.min
        }
    }
}

//=====================================================================
// TwoDDistribution
//=====================================================================
#[derive(Debug, Clone)]
pub struct TwoDDistribution {
    grid: TwoDGrid,
    policy: InterpolationPolicy,
    limits: Option<SecondaryLimits>,
}

impl TwoDDistribution {
    /// Build a distribution over `grid`. Log axes require positive values on that axis.
    pub fn new(grid: TwoDGrid, policy: InterpolationPolicy) -> CollisionResult<Self> {
        let interpolation = policy.interpolation;
        if interpolation.primary() == AxisScale::Log && grid.min_primary() <= 0.0 {
            return Err(CollisionError::InvalidGrid(format!(
                "{} interpolation requires positive primary values, grid starts at {}",
                interpolation,
                grid.min_primary()
            )));
        }
        match interpolation.secondary() {
            AxisScale::Log => {
                if let Some(bin) = grid.bins().iter().find(|bin| bin.lower_bound() <= 0.0) {
                    return Err(CollisionError::InvalidGrid(format!(
                        "{} interpolation requires positive secondary values, bin at {} starts at {}",
                        interpolation,
                        bin.primary,
                        bin.lower_bound()
                    )));
                }
            }
            AxisScale::LogCos => {
                if let Some(bin) = grid.bins().iter().find(|bin| bin.upper_bound() >= 1.0) {
                    return Err(CollisionError::InvalidGrid(format!(
                        "{} interpolation requires cosines below 1, bin at {} ends at {}",
                        interpolation,
                        bin.primary,
                        bin.upper_bound()
                    )));
                }
            }
            AxisScale::Lin => {}
        }
        log::debug!(
            "Built two-dimensional distribution with {} bins, policy {}",
            grid.len(),
            policy
        );
        Ok(Self {
            grid,
            policy,
            limits: None,
        })
    }

    /// Replace the interpolated secondary bounds with explicit functions of
    /// the primary value.
    pub fn with_limits(mut self, limits: SecondaryLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// The underlying grid of bins.
    pub fn grid(&self) -> &TwoDGrid {
        &self.grid
    }

    /// Sampling and interpolation policy.
    pub fn policy(&self) -> InterpolationPolicy {
        self.policy
    }

    /// Explicit secondary bounds, if any were attached.
    pub fn limits(&self) -> Option<&SecondaryLimits> {
        self.limits.as_ref()
    }

    /// Locate `primary` on the grid, clamping to the boundary bins.
    pub fn bracket(&self, primary: f64) -> CollisionResult<Bracket<'_>> {
        self.grid.bracket(primary, self.policy.interpolation.primary())
    }

    /// Interpolate two secondary values on this distribution's secondary axis.
    pub fn interpolate_secondary(&self, a: f64, b: f64, fraction: f64) -> f64 {
        self.policy.interpolation.secondary().interpolate(a, b, fraction)
    }

    /// Lowest secondary value that can be sampled at `primary`.
    pub fn lower_bound_of_secondary(&self, primary: f64) -> CollisionResult<f64> {
        Ok(match self.bracket(primary)? {
            Bracket::Node(bin) => self.node_bounds(primary, bin).0,
            Bracket::Between { lower, upper, fraction } => {
                self.segment(primary, lower, upper, fraction).min
            }
        })
    }

    /// Highest secondary value that can be sampled at `primary`.
    pub fn upper_bound_of_secondary(&self, primary: f64) -> CollisionResult<f64> {
        Ok(match self.bracket(primary)? {
            Bracket::Node(bin) => self.node_bounds(primary, bin).1,
            Bracket::Between { lower, upper, fraction } => {
                self.segment(primary, lower, upper, fraction).max
            }
        })
    }

    /// Tabulated (unnormalized) density at (primary, secondary).
    pub fn evaluate(&self, primary: f64, secondary: f64) -> CollisionResult<f64> {
        self.evaluate_density(primary, secondary, Density::Raw)
    }

    /// Normalized probability density at (primary, secondary).
    pub fn evaluate_pdf(&self, primary: f64, secondary: f64) -> CollisionResult<f64> {
        self.evaluate_density(primary, secondary, Density::Pdf)
    }

    /// Cumulative probability of the secondary value at `primary`.
    pub fn evaluate_cdf(&self, primary: f64, secondary: f64) -> CollisionResult<f64> {
        let segment = match self.bracket(primary)? {
            Bracket::Node(bin) => return Ok(self.node_cdf(primary, bin, secondary)),
            Bracket::Between { lower, upper, fraction } => self.segment(primary, lower, upper, fraction),
        };
        if segment.is_degenerate() {
            return Ok(if secondary < segment.min { 0.0 } else { 1.0 });
        }
        if secondary.is_nan() || secondary <= segment.min {
            return Ok(0.0);
        }
        if secondary >= segment.max {
            return Ok(1.0);
        }
        let cdf = match self.policy.sampling {
            GridSampling::Direct => self.direct_cdf(&segment, secondary),
            GridSampling::UnitBase => self.unit_base_cdf(&segment, secondary),
            GridSampling::Correlated => self.correlated_cdf(&segment, secondary)?,
            GridSampling::UnitBaseCorrelated => self.unit_base_correlated_cdf(&segment, secondary)?,
        };
        Ok(cdf.clamp(0.0, 1.0))
    }

    /// Draw a secondary value at `primary`. Direct and UnitBase consume two
    /// random numbers (bin choice, then the bin sample); the correlated
    /// policies consume one.
    pub fn sample<R: RandomSource + ?Sized>(&self, primary: f64, rng: &mut R) -> CollisionResult<f64> {
        let segment = match self.bracket(primary)? {
            Bracket::Node(bin) => return self.sample_node(primary, bin, rng.random_number()),
            Bracket::Between { lower, upper, fraction } => self.segment(primary, lower, upper, fraction),
        };
        match self.policy.sampling {
            GridSampling::Direct | GridSampling::UnitBase => {
                let bin_random_number = rng.random_number();
                let use_upper = bin_random_number < segment.fraction;
                let bin = if use_upper { segment.upper } else { segment.lower };
                let x = bin.distribution.sample(rng)?;
                if segment.is_degenerate() {
                    return Ok(segment.min);
                }
                if self.policy.sampling == GridSampling::Direct {
                    return Ok(x.clamp(segment.min, segment.max));
                }
                let scale = self.unit_scale(&segment);
                let eta = to_unit(scale, bin.lower_bound(), bin.upper_bound(), x);
                Ok(from_unit(scale, segment.min, segment.max, eta))
            }
            _ => self.sample_segment(&segment, rng.random_number()),
        }
    }

    /// Draw a secondary value at `primary` by inverting the interpolated
    /// CDF at `random_number`.
    pub fn sample_with_random_number(&self, primary: f64, random_number: f64) -> CollisionResult<f64> {
        check_random_number(random_number)?;
        match self.bracket(primary)? {
            Bracket::Node(bin) => self.sample_node(primary, bin, random_number),
            Bracket::Between { lower, upper, fraction } => {
                let segment = self.segment(primary, lower, upper, fraction);
                self.sample_segment(&segment, random_number)
            }
        }
    }

    fn sample_segment(&self, segment: &Segment<'_>, random_number: f64) -> CollisionResult<f64> {
        if segment.is_degenerate() {
            return Ok(segment.min);
        }
        let x = match self.policy.sampling {
            GridSampling::Direct => bisect(segment.min, segment.max, random_number, |x| {
                Ok(self.direct_cdf(segment, x))
            })?,
            GridSampling::UnitBase => {
                let eta = bisect(0.0, 1.0, random_number, |eta| {
                    Ok(self.unit_base_cdf_at_eta(segment, eta))
                })?;
                from_unit(self.unit_scale(segment), segment.min, segment.max, eta)
            }
            GridSampling::Correlated => self.correlated_sample(segment, random_number)?,
            GridSampling::UnitBaseCorrelated => {
                let eta = self.unit_base_correlated_eta(segment, random_number)?.0;
                from_unit(self.unit_scale(segment), segment.min, segment.max, eta)
            }
        };
        Ok(x.clamp(segment.min, segment.max))
    }

    fn node_bounds(&self, primary: f64, bin: &GridBin) -> (f64, f64) {
        match &self.limits {
            Some(limits) => (limits.min(primary), limits.max(primary)),
            None => (bin.lower_bound(), bin.upper_bound()),
        }
    }

    // None when there are no limits or they cover the whole bin, so node
    // values stay exactly those of the bin.
    fn node_window(&self, primary: f64, bin: &GridBin) -> Option<NodeWindow> {
        let limits = self.limits.as_ref()?;
        let (min, max) = (limits.min(primary), limits.max(primary));
        if min <= bin.lower_bound() && max >= bin.upper_bound() {
            return None;
        }
        let cdf_min = bin.distribution.evaluate_cdf(min);
        Some(NodeWindow {
            min,
            max,
            cdf_min,
            mass: bin.distribution.evaluate_cdf(max) - cdf_min,
        })
    }

    // A node bin truncated to the limits and renormalized.
    fn sample_node(&self, primary: f64, bin: &GridBin, random_number: f64) -> CollisionResult<f64> {
        let window = match self.node_window(primary, bin) {
            None => return bin.distribution.sample_with_random_number(random_number),
            Some(window) => window,
        };
        if window.is_degenerate() {
            return Ok(window.min);
        }
        if !(window.mass > 0.0) {
            return Ok(window.empty_sample(bin));
        }
        if random_number >= 1.0 {
            return Ok(window.max.min(bin.upper_bound()));
        }
        let xi = (window.cdf_min + random_number * window.mass).min(1.0);
        Ok(bin.distribution.sample_with_random_number(xi)?.clamp(window.min, window.max))
    }

    fn node_cdf(&self, primary: f64, bin: &GridBin, secondary: f64) -> f64 {
        let window = match self.node_window(primary, bin) {
            None => return bin.distribution.evaluate_cdf(secondary),
            Some(window) => window,
        };
        if window.is_degenerate() {
            return if secondary < window.min { 0.0 } else { 1.0 };
        }
        if !(window.mass > 0.0) {
            return if secondary < window.empty_sample(bin) { 0.0 } else { 1.0 };
        }
        if secondary.is_nan() || secondary <= window.min {
            return 0.0;
        }
        if secondary >= window.max {
            return 1.0;
        }
        ((bin.distribution.evaluate_cdf(secondary) - window.cdf_min) / window.mass).clamp(0.0, 1.0)
    }

    fn node_density(&self, primary: f64, bin: &GridBin, secondary: f64, density: Density) -> f64 {
        let window = match self.node_window(primary, bin) {
            None => return density.of(&bin.distribution, secondary),
            Some(window) => window,
        };
        if window.is_degenerate() || !(window.mass > 0.0) || secondary < window.min || secondary > window.max {
            return 0.0;
        }
        match density {
            Density::Raw => density.of(&bin.distribution, secondary),
            Density::Pdf => density.of(&bin.distribution, secondary) / window.mass,
        }
    }

    fn segment<'a>(&self, primary: f64, lower: &'a GridBin, upper: &'a GridBin, fraction: f64) -> Segment<'a> {
        let (min, max) = match (&self.limits, self.policy.sampling) {
            (Some(limits), _) => (limits.min(primary), limits.max(primary)),
            // direct sampling keeps the union of both bins' supports
            (None, GridSampling::Direct) => (
                lower.lower_bound().min(upper.lower_bound()),
                lower.upper_bound().max(upper.upper_bound()),
            ),
            (None, _) => (
                self.interpolate_secondary(lower.lower_bound(), upper.lower_bound(), fraction),
                self.interpolate_secondary(lower.upper_bound(), upper.upper_bound(), fraction),
            ),
        };
        Segment {
            lower,
            upper,
            fraction,
            min,
            max,
        }
    }

    fn evaluate_density(&self, primary: f64, secondary: f64, density: Density) -> CollisionResult<f64> {
        let segment = match self.bracket(primary)? {
            Bracket::Node(bin) => return Ok(self.node_density(primary, bin, secondary, density)),
            Bracket::Between { lower, upper, fraction } => self.segment(primary, lower, upper, fraction),
        };
        if segment.is_degenerate() || !segment.contains(secondary) {
            return Ok(0.0);
        }
        let t = segment.fraction;
        let value_scale = self.policy.interpolation.value();
        match self.policy.sampling {
            GridSampling::Direct => {
                let f0 = density.of(segment.lower_dist(), secondary);
                let f1 = density.of(segment.upper_dist(), secondary);
                Ok(value_scale.interpolate(f0, f1, t))
            }
            GridSampling::UnitBase => {
                let scale = self.unit_scale(&segment);
                let eta = to_unit(scale, segment.min, segment.max, secondary);
                let h0 = unit_density(scale, segment.lower, eta, density);
                let h1 = unit_density(scale, segment.upper, eta, density);
                let h = value_scale.interpolate(h0, h1, t);
                Ok(h * scale.derivative(secondary) / span(scale, segment.min, segment.max))
            }
            GridSampling::Correlated => {
                let xi = self.correlated_cdf(&segment, secondary)?;
                let x0 = segment.lower_dist().sample_with_random_number(xi)?;
                let x1 = segment.upper_dist().sample_with_random_number(xi)?;
                let f0 = density.of(segment.lower_dist(), x0);
                let f1 = density.of(segment.upper_dist(), x1);
                if !(f0 > 0.0 && f1 > 0.0) {
                    return Ok(0.0);
                }
                let scale = guard(self.policy.interpolation.secondary(), &[x0, x1, secondary]);
                let dx_dxi = (1.0 - t) * scale.derivative(x0) / f0 + t * scale.derivative(x1) / f1;
                Ok(scale.derivative(secondary) / dx_dxi)
            }
            GridSampling::UnitBaseCorrelated => {
                let xi = self.unit_base_correlated_cdf(&segment, secondary)?;
                let (_, x0, x1) = self.unit_base_correlated_eta(&segment, xi)?;
                let f0 = density.of(segment.lower_dist(), x0);
                let f1 = density.of(segment.upper_dist(), x1);
                if !(f0 > 0.0 && f1 > 0.0) {
                    return Ok(0.0);
                }
                let scale = self.unit_scale(&segment);
                let lower_span = span(scale, segment.lower.lower_bound(), segment.lower.upper_bound());
                let upper_span = span(scale, segment.upper.lower_bound(), segment.upper.upper_bound());
                let deta_dxi = (1.0 - t) * scale.derivative(x0) / (lower_span * f0)
                    + t * scale.derivative(x1) / (upper_span * f1);
                Ok(scale.derivative(secondary) / (span(scale, segment.min, segment.max) * deta_dxi))
            }
        }
    }

    // Scale for mapping both bins and the intermediate domain to [0, 1].
    fn unit_scale(&self, segment: &Segment<'_>) -> AxisScale {
        guard(
            self.policy.interpolation.secondary(),
            &[
                segment.lower.lower_bound(),
                segment.lower.upper_bound(),
                segment.upper.lower_bound(),
                segment.upper.upper_bound(),
                segment.min,
                segment.max,
            ],
        )
    }

    fn direct_cdf(&self, segment: &Segment<'_>, x: f64) -> f64 {
        let t = segment.fraction;
        (1.0 - t) * segment.lower_dist().evaluate_cdf(x) + t * segment.upper_dist().evaluate_cdf(x)
    }

    fn unit_base_cdf_at_eta(&self, segment: &Segment<'_>, eta: f64) -> f64 {
        let scale = self.unit_scale(segment);
        let t = segment.fraction;
        let x0 = from_unit(scale, segment.lower.lower_bound(), segment.lower.upper_bound(), eta);
        let x1 = from_unit(scale, segment.upper.lower_bound(), segment.upper.upper_bound(), eta);
        (1.0 - t) * segment.lower_dist().evaluate_cdf(x0) + t * segment.upper_dist().evaluate_cdf(x1)
    }

    fn unit_base_cdf(&self, segment: &Segment<'_>, x: f64) -> f64 {
        let eta = to_unit(self.unit_scale(segment), segment.min, segment.max, x);
        self.unit_base_cdf_at_eta(segment, eta)
    }

    fn correlated_sample(&self, segment: &Segment<'_>, random_number: f64) -> CollisionResult<f64> {
        let x0 = segment.lower_dist().sample_with_random_number(random_number)?;
        let x1 = segment.upper_dist().sample_with_random_number(random_number)?;
        Ok(self.interpolate_secondary(x0, x1, segment.fraction))
    }

    // Shared random number whose correlated sample is `x`.
    fn correlated_cdf(&self, segment: &Segment<'_>, x: f64) -> CollisionResult<f64> {
        if x <= self.correlated_sample(segment, 0.0)? {
            return Ok(0.0);
        }
        if x >= self.correlated_sample(segment, 1.0)? {
            return Ok(1.0);
        }
        bisect(0.0, 1.0, x, |xi| self.correlated_sample(segment, xi))
    }

    // Interpolated unit-domain position for a shared random number, with the
    // two bin samples it came from.
    fn unit_base_correlated_eta(
        &self,
        segment: &Segment<'_>,
        random_number: f64,
    ) -> CollisionResult<(f64, f64, f64)> {
        let scale = self.unit_scale(segment);
        let x0 = segment.lower_dist().sample_with_random_number(random_number)?;
        let x1 = segment.upper_dist().sample_with_random_number(random_number)?;
        let eta0 = to_unit(scale, segment.lower.lower_bound(), segment.lower.upper_bound(), x0);
        let eta1 = to_unit(scale, segment.upper.lower_bound(), segment.upper.upper_bound(), x1);
        Ok((eta0 + segment.fraction * (eta1 - eta0), x0, x1))
    }

    fn unit_base_correlated_cdf(&self, segment: &Segment<'_>, x: f64) -> CollisionResult<f64> {
        let target = to_unit(self.unit_scale(segment), segment.min, segment.max, x);
        if target <= self.unit_base_correlated_eta(segment, 0.0)?.0 {
            return Ok(0.0);
        }
        if target >= self.unit_base_correlated_eta(segment, 1.0)?.0 {
            return Ok(1.0);
        }
        bisect(0.0, 1.0, target, |xi| Ok(self.unit_base_correlated_eta(segment, xi)?.0))
    }
}

// Density of a bin's secondary variable on the unit domain at `eta`.
fn unit_density(scale: AxisScale, bin: &GridBin, eta: f64, density: Density) -> f64 {
    let (lower, upper) = (bin.lower_bound(), bin.upper_bound());
    let x = from_unit(scale, lower, upper, eta);
    density.of(&bin.distribution, x) * span(scale, lower, upper) / scale.derivative(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::TabularDistribution;
    use crate::interpolation::{InterpolationScheme, TwoDInterpolation};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ALL_SAMPLING: [GridSampling; 4] = [
        GridSampling::Direct,
        GridSampling::UnitBase,
        GridSampling::Correlated,
        GridSampling::UnitBaseCorrelated,
    ];

    fn uniform(lower: f64, upper: f64) -> TabularDistribution {
        TabularDistribution::from_pdf(vec![lower, upper], vec![1.0, 1.0], InterpolationScheme::LinLin).unwrap()
    }

    fn widening_grid() -> TwoDGrid {
        TwoDGrid::new(vec![
            GridBin::new(1.0, uniform(0.0, 1.0)),
            GridBin::new(3.0, uniform(0.0, 3.0)),
        ])
        .unwrap()
    }

    fn lin(sampling: GridSampling) -> TwoDDistribution {
        TwoDDistribution::new(
            widening_grid(),
            InterpolationPolicy::new(sampling, TwoDInterpolation::LinLinLin),
        )
        .unwrap()
    }

    #[test]
    fn test_node_exactness() {
        for sampling in ALL_SAMPLING {
            let distribution = lin(sampling);
            for bin in distribution.grid().bins() {
                for i in 0..=20 {
                    let x = i as f64 * 0.15;
                    assert_eq!(
                        distribution.evaluate(bin.primary, x).unwrap(),
                        bin.distribution.evaluate(x)
                    );
                    assert_eq!(
                        distribution.evaluate_cdf(bin.primary, x).unwrap(),
                        bin.distribution.evaluate_cdf(x)
                    );
                }
                assert_eq!(
                    distribution.sample_with_random_number(bin.primary, 0.3).unwrap(),
                    bin.distribution.sample_with_random_number(0.3).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_correlated_midpoint() {
        let distribution = lin(GridSampling::Correlated);
        // bins give 0.5 and 1.5 at xi = 0.5; halfway in energy gives 1.0
        assert_relative_eq!(distribution.sample_with_random_number(2.0, 0.5).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(distribution.upper_bound_of_secondary(2.0).unwrap(), 2.0);
        // uniform on [0, 2]
        assert_relative_eq!(distribution.evaluate_pdf(2.0, 1.0).unwrap(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(distribution.evaluate_cdf(2.0, 1.5).unwrap(), 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_unit_base_midpoint() {
        for sampling in [GridSampling::UnitBase, GridSampling::UnitBaseCorrelated] {
            let distribution = lin(sampling);
            assert_relative_eq!(distribution.evaluate_pdf(2.0, 1.0).unwrap(), 0.5, epsilon = 1e-9);
            assert_relative_eq!(distribution.evaluate_cdf(2.0, 0.5).unwrap(), 0.25, epsilon = 1e-9);
            assert_relative_eq!(
                distribution.sample_with_random_number(2.0, 0.25).unwrap(),
                0.5,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_direct_mixture() {
        let distribution = lin(GridSampling::Direct);
        // half of [0,1] uniform plus half of [0,3] uniform
        assert_relative_eq!(distribution.evaluate_pdf(2.0, 0.5).unwrap(), 0.5 + 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(distribution.evaluate_pdf(2.0, 2.0).unwrap(), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(distribution.upper_bound_of_secondary(2.0).unwrap(), 3.0);
        let x = distribution.sample_with_random_number(2.0, 0.5).unwrap();
        assert_relative_eq!(distribution.evaluate_cdf(2.0, x).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_cdf_inverts_sample_between_nodes() {
        for sampling in ALL_SAMPLING {
            let distribution = lin(sampling);
            for i in 1..10 {
                let xi = i as f64 / 10.0;
                let x = distribution.sample_with_random_number(1.7, xi).unwrap();
                assert_relative_eq!(distribution.evaluate_cdf(1.7, x).unwrap(), xi, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_sampling_range_with_limits() {
        let grid = TwoDGrid::new(vec![
            GridBin::new(1.0, TabularDistribution::new(vec![1e-3, 1.0], vec![10.0, 1.0], InterpolationScheme::LogLog).unwrap()),
            GridBin::new(10.0, TabularDistribution::new(vec![1e-3, 10.0], vec![10.0, 0.1], InterpolationScheme::LogLog).unwrap()),
        ])
        .unwrap();
        for sampling in ALL_SAMPLING {
            let distribution = TwoDDistribution::new(
                grid.clone(),
                InterpolationPolicy::new(sampling, TwoDInterpolation::LogLogLog),
            )
            .unwrap()
            .with_limits(SecondaryLimits::new(|_| 1e-3, |energy| energy));
            let mut rng = StdRng::seed_from_u64(1234);
            for _ in 0..10_000 {
                let k = distribution.sample(4.0, &mut rng).unwrap();
                assert!((1e-3..=4.0).contains(&k), "{} sampled {}", sampling, k);
            }
        }
    }

    #[test]
    fn test_limits_below_grid_truncate_boundary_bin() {
        let grid = TwoDGrid::new(vec![
            GridBin::new(1.0, TabularDistribution::new(vec![1e-3, 1.0], vec![10.0, 1.0], InterpolationScheme::LogLog).unwrap()),
            GridBin::new(10.0, TabularDistribution::new(vec![1e-3, 10.0], vec![10.0, 0.1], InterpolationScheme::LogLog).unwrap()),
        ])
        .unwrap();
        for sampling in ALL_SAMPLING {
            let distribution = TwoDDistribution::new(
                grid.clone(),
                InterpolationPolicy::new(sampling, TwoDInterpolation::LogLogLog),
            )
            .unwrap()
            .with_limits(SecondaryLimits::new(|_| 1e-3, |energy| energy));
            let energy = 0.5;
            let max = distribution.upper_bound_of_secondary(energy).unwrap();
            assert_eq!(max, energy);

            let k = distribution.sample_with_random_number(energy, 0.9).unwrap();
            assert!(k < max, "{} sampled {}", sampling, k);
            assert_relative_eq!(distribution.evaluate_cdf(energy, k).unwrap(), 0.9, epsilon = 1e-9);
            assert_eq!(distribution.sample_with_random_number(energy, 1.0).unwrap(), max);
            assert_eq!(distribution.evaluate_cdf(energy, max).unwrap(), 1.0);
            assert_eq!(distribution.evaluate_pdf(energy, 0.7).unwrap(), 0.0);

            let mut rng = StdRng::seed_from_u64(500);
            let at_max = (0..1000)
                .map(|_| distribution.sample(energy, &mut rng).unwrap())
                .inspect(|&k| assert!((1e-3..=max).contains(&k)))
                .filter(|&k| k == max)
                .count();
            assert_eq!(at_max, 0);
        }
    }

    #[test]
    fn test_clamps_outside_grid() {
        let distribution = lin(GridSampling::Correlated);
        assert_eq!(distribution.sample_with_random_number(10.0, 1.0).unwrap(), 3.0);
        assert_eq!(distribution.sample_with_random_number(0.1, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_domain_errors() {
        let distribution = lin(GridSampling::Correlated);
        assert!(matches!(distribution.evaluate(-1.0, 0.5), Err(CollisionError::Domain(_))));
        assert!(matches!(
            distribution.sample_with_random_number(f64::INFINITY, 0.5),
            Err(CollisionError::Domain(_))
        ));
        assert!(matches!(
            distribution.sample_with_random_number(2.0, 2.0),
            Err(CollisionError::Domain(_))
        ));
    }

    #[test]
    fn test_log_scales_validated() {
        let grid = widening_grid();
        // secondary starts at 0
        let result = TwoDDistribution::new(
            grid,
            InterpolationPolicy::new(GridSampling::Correlated, TwoDInterpolation::LogLogLog),
        );
        assert!(matches!(result, Err(CollisionError::InvalidGrid(_))));

        let grid = TwoDGrid::new(vec![GridBin::new(1.0, uniform(-1.0, 1.0))]).unwrap();
        let result = TwoDDistribution::new(
            grid,
            InterpolationPolicy::new(GridSampling::Correlated, TwoDInterpolation::LogLogCosLog),
        );
        assert!(matches!(result, Err(CollisionError::InvalidGrid(_))));
    }
}
