// Random number injection for sampling routines
//
// Every sampling entry point takes its random numbers from a `RandomSource`
// owned by the caller's history, so two histories with the same seed produce
// the same results regardless of thread count.

use rand::distributions::{Distribution, Standard};
use rand::RngCore;

/// A source of uniform random numbers in [0, 1).
pub trait RandomSource {
    fn random_number(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    #[inline]
    fn random_number(&mut self) -> f64 {
        Standard.sample(self)
    }
}

/// Deterministic source returning a fixed sequence of values in order.
///
/// Used to make sampled outputs bit-reproducible in tests.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    index: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }

    /// Number of values not yet consumed
    pub fn remaining(&self) -> usize {
        self.values.len() - self.index
    }
}

impl RandomSource for FixedSequence {
    fn random_number(&mut self) -> f64 {
        if self.index >= self.values.len() {
            panic!(
                "FixedSequence: ran out of values after {} draws",
                self.values.len()
            );
        }
        let value = self.values[self.index];
        self.index += 1;
        value
    }
}
