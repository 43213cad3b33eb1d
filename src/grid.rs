// Ordered (primary value, distribution) bins and bracketing of a primary
// value between neighbouring bins.

use crate::distribution::{OneDDistribution, UnivariateDistribution};
use crate::error::{check_energy, CollisionError, CollisionResult};
use crate::interpolation::AxisScale;

/// One bin of a two-dimensional grid: the distribution of the secondary
/// variable at a fixed primary value.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBin {
    pub primary: f64,
    pub distribution: OneDDistribution,
}

impl GridBin {
    pub fn new(primary: f64, distribution: impl Into<OneDDistribution>) -> Self {
        Self {
            primary,
            distribution: distribution.into(),
        }
    }

    pub fn lower_bound(&self) -> f64 {
        self.distribution.lower_bound()
    }

    pub fn upper_bound(&self) -> f64 {
        self.distribution.upper_bound()
    }
}

/// Position of a primary value relative to the grid.
#[derive(Debug, Clone, Copy)]
pub enum Bracket<'a> {
    /// Exactly on a grid point, or clamped to a boundary bin
    Node(&'a GridBin),
    /// Strictly between two bins; `fraction` is measured on the primary axis
    Between {
        lower: &'a GridBin,
        upper: &'a GridBin,
        fraction: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwoDGrid {
    bins: Vec<GridBin>,
}

impl TwoDGrid {
    pub fn new(bins: Vec<GridBin>) -> CollisionResult<Self> {
        if bins.is_empty() {
            return Err(CollisionError::InvalidGrid(
                "two-dimensional grid has no bins".to_string(),
            ));
        }
        if bins.iter().any(|bin| !bin.primary.is_finite()) {
            return Err(CollisionError::InvalidGrid(
                "grid primary values must be finite".to_string(),
            ));
        }
        if let Some(pair) = bins.windows(2).find(|w| w[1].primary <= w[0].primary) {
            return Err(CollisionError::InvalidGrid(format!(
                "grid primary values must be strictly increasing ({} followed by {})",
                pair[0].primary, pair[1].primary
            )));
        }
        log::debug!(
            "Built grid with {} bins on [{}, {}]",
            bins.len(),
            bins[0].primary,
            bins[bins.len() - 1].primary
        );
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[GridBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn min_primary(&self) -> f64 {
        self.bins[0].primary
    }

    pub fn max_primary(&self) -> f64 {
        self.bins[self.bins.len() - 1].primary
    }

    /// Locate `primary` on the grid. Values outside the grid clamp to the
    /// nearest boundary bin.
    pub fn bracket(&self, primary: f64, scale: AxisScale) -> CollisionResult<Bracket<'_>> {
        check_energy(primary)?;
        let first = &self.bins[0];
        let last = &self.bins[self.bins.len() - 1];
        if primary <= first.primary {
            if primary < first.primary {
                log::trace!("primary value {} below grid, clamped to {}", primary, first.primary);
            }
            return Ok(Bracket::Node(first));
        }
        if primary >= last.primary {
            if primary > last.primary {
                log::trace!("primary value {} above grid, clamped to {}", primary, last.primary);
            }
            return Ok(Bracket::Node(last));
        }
        // first bin strictly above primary; at least 1 given the checks above
        let upper_index = self.bins.partition_point(|bin| bin.primary <= primary);
        let lower = &self.bins[upper_index - 1];
        if lower.primary == primary {
            return Ok(Bracket::Node(lower));
        }
        let upper = &self.bins[upper_index];
        Ok(Bracket::Between {
            lower,
            upper,
            fraction: scale.fraction(lower.primary, upper.primary, primary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::TabularDistribution;
    use crate::interpolation::InterpolationScheme;
    use approx::assert_relative_eq;

    fn uniform(lower: f64, upper: f64) -> TabularDistribution {
        TabularDistribution::new(vec![lower, upper], vec![1.0, 1.0], InterpolationScheme::LinLin).unwrap()
    }

    fn grid() -> TwoDGrid {
        TwoDGrid::new(vec![
            GridBin::new(1.0, uniform(0.0, 1.0)),
            GridBin::new(10.0, uniform(0.0, 2.0)),
            GridBin::new(100.0, uniform(0.0, 3.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_bracket_between() {
        let grid = grid();
        match grid.bracket(5.5, AxisScale::Lin).unwrap() {
            Bracket::Between { lower, upper, fraction } => {
                assert_eq!(lower.primary, 1.0);
                assert_eq!(upper.primary, 10.0);
                assert_relative_eq!(fraction, 0.5);
            }
            other => panic!("expected Between, got {:?}", other),
        }
        match grid.bracket(10.0_f64.powf(1.5), AxisScale::Log).unwrap() {
            Bracket::Between { lower, fraction, .. } => {
                assert_eq!(lower.primary, 10.0);
                assert_relative_eq!(fraction, 0.5, epsilon = 1e-12);
            }
            other => panic!("expected Between, got {:?}", other),
        }
    }

    #[test]
    fn test_bracket_node_and_clamp() {
        let grid = grid();
        assert!(matches!(grid.bracket(10.0, AxisScale::Lin).unwrap(), Bracket::Node(b) if b.primary == 10.0));
        assert!(matches!(grid.bracket(0.5, AxisScale::Lin).unwrap(), Bracket::Node(b) if b.primary == 1.0));
        assert!(matches!(grid.bracket(1e3, AxisScale::Lin).unwrap(), Bracket::Node(b) if b.primary == 100.0));
    }

    #[test]
    fn test_bracket_rejects_bad_primary() {
        let grid = grid();
        assert!(matches!(grid.bracket(-1.0, AxisScale::Lin), Err(CollisionError::Domain(_))));
        assert!(matches!(grid.bracket(f64::NAN, AxisScale::Lin), Err(CollisionError::Domain(_))));
    }

    #[test]
    fn test_invalid_grids() {
        assert!(matches!(TwoDGrid::new(vec![]), Err(CollisionError::InvalidGrid(_))));
        let result = TwoDGrid::new(vec![
            GridBin::new(2.0, uniform(0.0, 1.0)),
            GridBin::new(1.0, uniform(0.0, 1.0)),
        ]);
        assert!(matches!(result, Err(CollisionError::InvalidGrid(_))));
        let result = TwoDGrid::new(vec![
            GridBin::new(1.0, uniform(0.0, 1.0)),
            GridBin::new(1.0, uniform(0.0, 1.0)),
        ]);
        assert!(matches!(result, Err(CollisionError::InvalidGrid(_))));
    }
}
