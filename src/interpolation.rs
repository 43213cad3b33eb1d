use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, CollisionResult};

//=====================================================================
// One-dimensional interpolation schemes, numbered as in ENDF.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationScheme {
    Histogram = 1,
    #[default]
    LinLin = 2,
    LinLog = 3,
    LogLin = 4,
    LogLog = 5,
}

impl TryFrom<i32> for InterpolationScheme {
    type Error = CollisionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InterpolationScheme::Histogram),
            2 => Ok(InterpolationScheme::LinLin),
            3 => Ok(InterpolationScheme::LinLog),
            4 => Ok(InterpolationScheme::LogLin),
            5 => Ok(InterpolationScheme::LogLog),
            _ => Err(CollisionError::InvalidGrid(format!(
                "unsupported interpolation scheme code {}",
                value
            ))),
        }
    }
}

impl std::fmt::Display for InterpolationScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpolationScheme::Histogram => write!(f, "Histogram"),
            InterpolationScheme::LinLin => write!(f, "LinLin"),
            InterpolationScheme::LinLog => write!(f, "LinLog"),
            InterpolationScheme::LogLin => write!(f, "LogLin"),
            InterpolationScheme::LogLog => write!(f, "LogLog"),
        }
    }
}

impl InterpolationScheme {
    /// Interpolate y at `x` between (x0, y0) and (x1, y1).
    ///
    /// A log axis whose values are not strictly positive falls back to a
    /// linear axis for that bin.
    #[inline]
    pub fn interpolate(self, x0: f64, x1: f64, y0: f64, y1: f64, x: f64) -> f64 {
        if x1 == x0 {
            return y0;
        }
        let log_x = x0 > 0.0 && x1 > 0.0 && x > 0.0;
        let log_y = y0 > 0.0 && y1 > 0.0;
        match self {
            InterpolationScheme::Histogram => y0,
            InterpolationScheme::LinLin => y0 + (y1 - y0) * (x - x0) / (x1 - x0),
            InterpolationScheme::LinLog if log_x => {
                y0 + (y1 - y0) * (x / x0).ln() / (x1 / x0).ln()
            }
            InterpolationScheme::LogLin if log_y => {
                y0 * ((x - x0) * (y1 / y0).ln() / (x1 - x0)).exp()
            }
            InterpolationScheme::LogLog if log_x && log_y => {
                y0 * ((x / x0).ln() * (y1 / y0).ln() / (x1 / x0).ln()).exp()
            }
            _ => y0 + (y1 - y0) * (x - x0) / (x1 - x0),
        }
    }
}

//=====================================================================
// Axis processing used by two-dimensional interpolation.
//
// `LogCos` maps an angle cosine to -ln(1 - mu), which stretches the
// forward-peaked region near mu = 1 and is increasing in mu.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisScale {
    Lin,
    Log,
    LogCos,
}

impl AxisScale {
    #[inline]
    pub fn forward(self, x: f64) -> f64 {
        match self {
            AxisScale::Lin => x,
            AxisScale::Log => x.ln(),
            AxisScale::LogCos => -(1.0 - x).ln(),
        }
    }

    #[inline]
    pub fn inverse(self, u: f64) -> f64 {
        match self {
            AxisScale::Lin => u,
            AxisScale::Log => u.exp(),
            AxisScale::LogCos => 1.0 - (-u).exp(),
        }
    }

    /// d(forward)/dx
    #[inline]
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            AxisScale::Lin => 1.0,
            AxisScale::Log => 1.0 / x,
            AxisScale::LogCos => 1.0 / (1.0 - x),
        }
    }

    /// Whether `x` can be processed on this axis
    #[inline]
    pub fn accepts(self, x: f64) -> bool {
        match self {
            AxisScale::Lin => x.is_finite(),
            AxisScale::Log => x > 0.0 && x.is_finite(),
            AxisScale::LogCos => x < 1.0,
        }
    }

    /// Fraction of the way `x` lies from `x0` to `x1` on this axis.
    #[inline]
    pub fn fraction(self, x0: f64, x1: f64, x: f64) -> f64 {
        if !(self.accepts(x0) && self.accepts(x1) && self.accepts(x)) {
            return (x - x0) / (x1 - x0);
        }
        (self.forward(x) - self.forward(x0)) / (self.forward(x1) - self.forward(x0))
    }

    /// Interpolate between `a` and `b` at `fraction` on this axis.
    #[inline]
    pub fn interpolate(self, a: f64, b: f64, fraction: f64) -> f64 {
        if a == b {
            return a;
        }
        if !(self.accepts(a) && self.accepts(b)) {
            return a + fraction * (b - a);
        }
        let (ua, ub) = (self.forward(a), self.forward(b));
        self.inverse(ua + fraction * (ub - ua))
    }
}

//=====================================================================
// Two-dimensional interpolation, named (value, secondary, primary).
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TwoDInterpolation {
    LinLinLin,
    LinLinLog,
    #[default]
    LogLogLog,
    LogLogCosLog,
}

impl TwoDInterpolation {
    pub fn primary(self) -> AxisScale {
        match self {
            TwoDInterpolation::LinLinLin => AxisScale::Lin,
            _ => AxisScale::Log,
        }
    }

    pub fn secondary(self) -> AxisScale {
        match self {
            TwoDInterpolation::LinLinLin | TwoDInterpolation::LinLinLog => AxisScale::Lin,
            TwoDInterpolation::LogLogLog => AxisScale::Log,
            TwoDInterpolation::LogLogCosLog => AxisScale::LogCos,
        }
    }

    pub fn value(self) -> AxisScale {
        match self {
            TwoDInterpolation::LinLinLin | TwoDInterpolation::LinLinLog => AxisScale::Lin,
            _ => AxisScale::Log,
        }
    }
}

impl std::fmt::Display for TwoDInterpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TwoDInterpolation::LinLinLin => write!(f, "LinLinLin"),
            TwoDInterpolation::LinLinLog => write!(f, "LinLinLog"),
            TwoDInterpolation::LogLogLog => write!(f, "LogLogLog"),
            TwoDInterpolation::LogLogCosLog => write!(f, "LogLogCosLog"),
        }
    }
}

//=====================================================================
// Tabulated y(x) function.
//=====================================================================

/// A validated y(x) table. Outside its range the end values are returned.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedFunction {
    x: Vec<f64>,
    y: Vec<f64>,
    scheme: InterpolationScheme,
}

impl TabulatedFunction {
    pub fn new(x: Vec<f64>, y: Vec<f64>, scheme: InterpolationScheme) -> CollisionResult<Self> {
        if x.is_empty() {
            return Err(CollisionError::InvalidGrid(
                "tabulated function has no points".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(CollisionError::InvalidGrid(format!(
                "tabulated function x ({}) and y ({}) must be of the same length",
                x.len(),
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(CollisionError::InvalidGrid(
                "tabulated function contains non-finite values".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CollisionError::InvalidGrid(
                "tabulated function x values must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { x, y, scheme })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn scheme(&self) -> InterpolationScheme {
        self.scheme
    }

    pub fn evaluate(&self, x_val: f64) -> f64 {
        let n = self.x.len();
        if x_val <= self.x[0] {
            return self.y[0];
        }
        if x_val >= self.x[n - 1] {
            return self.y[n - 1];
        }
        // first index with x > x_val, at least 1 given the checks above
        let upper = self.x.partition_point(|&x| x <= x_val);
        let lower = upper - 1;
        if self.x[lower] == x_val {
            return self.y[lower];
        }
        self.scheme.interpolate(
            self.x[lower],
            self.x[upper],
            self.y[lower],
            self.y[upper],
            x_val,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scheme_codes() {
        assert_eq!(InterpolationScheme::try_from(1).unwrap(), InterpolationScheme::Histogram);
        assert_eq!(InterpolationScheme::try_from(5).unwrap(), InterpolationScheme::LogLog);
        assert!(InterpolationScheme::try_from(6).is_err());
        assert_eq!(InterpolationScheme::LogLin.to_string(), "LogLin");
    }

    #[test]
    fn test_scheme_interpolation() {
        assert_eq!(InterpolationScheme::Histogram.interpolate(1.0, 2.0, 2.0, 4.0, 1.5), 2.0);
        assert_eq!(InterpolationScheme::LinLin.interpolate(1.0, 2.0, 2.0, 4.0, 1.5), 3.0);
        assert_relative_eq!(
            InterpolationScheme::LinLog.interpolate(1.0, 2.0, 2.0, 5.0, 1.5),
            3.754888,
            epsilon = 1e-5
        );
        assert_relative_eq!(
            InterpolationScheme::LogLin.interpolate(1.0, 2.0, 2.0, 5.0, 1.5),
            3.162278,
            epsilon = 1e-5
        );
        assert_relative_eq!(
            InterpolationScheme::LogLog.interpolate(1.0, 2.0, 2.0, 5.0, 1.5),
            3.418298,
            epsilon = 1e-5
        );
        // log axis with a zero value falls back to linear
        assert_eq!(InterpolationScheme::LogLog.interpolate(1.0, 2.0, 0.0, 4.0, 1.5), 2.0);
    }

    #[test]
    fn test_axis_scale_round_trip_points() {
        for scale in [AxisScale::Lin, AxisScale::Log, AxisScale::LogCos] {
            let x = 0.75;
            assert_relative_eq!(scale.inverse(scale.forward(x)), x, epsilon = 1e-14);
        }
        assert_relative_eq!(AxisScale::Log.fraction(1.0, 100.0, 10.0), 0.5, epsilon = 1e-14);
        assert_relative_eq!(AxisScale::Lin.interpolate(-1.0, 1.0, 0.25), -0.5);
        // log-cos interpolation stays inside the bracket
        let mu = AxisScale::LogCos.interpolate(0.9, 0.99, 0.5);
        assert!(mu > 0.9 && mu < 0.99);
        // mu = 1 cannot be processed on a log-cos axis: linear fallback
        assert_relative_eq!(AxisScale::LogCos.interpolate(0.9, 1.0, 0.5), 0.95);
    }

    #[test]
    fn test_two_d_interpolation_axes() {
        let interp = TwoDInterpolation::LogLogCosLog;
        assert_eq!(interp.primary(), AxisScale::Log);
        assert_eq!(interp.secondary(), AxisScale::LogCos);
        assert_eq!(interp.value(), AxisScale::Log);
        assert_eq!(TwoDInterpolation::LinLinLin.primary(), AxisScale::Lin);
        assert_eq!(TwoDInterpolation::default(), TwoDInterpolation::LogLogLog);
    }

    #[test]
    fn test_tabulated_function() {
        let table = TabulatedFunction::new(
            vec![0.5, 1.0, 2.0, 5.0],
            vec![1.0, 2.0, 3.0, 4.0],
            InterpolationScheme::LinLin,
        )
        .unwrap();
        assert_eq!(table.evaluate(0.1), 1.0);
        assert_eq!(table.evaluate(1.0), 2.0);
        assert_eq!(table.evaluate(1.5), 2.5);
        assert_eq!(table.evaluate(10.0), 4.0);
    }

    #[test]
    fn test_tabulated_function_invalid() {
        assert!(TabulatedFunction::new(vec![], vec![], InterpolationScheme::LinLin).is_err());
        assert!(TabulatedFunction::new(vec![1.0, 2.0], vec![1.0], InterpolationScheme::LinLin).is_err());
        assert!(TabulatedFunction::new(vec![2.0, 1.0], vec![1.0, 1.0], InterpolationScheme::LinLin).is_err());
    }
}
