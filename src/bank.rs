// Particle banking for a single history
//
// Secondaries produced at a collision are pushed here and transported later
// by the caller. The collision core only ever pushes.

use crate::particle::Particle;
use std::collections::VecDeque;

/// FIFO queue of particles awaiting transport.
#[derive(Debug, Clone, Default)]
pub struct ParticleBank {
    queue: VecDeque<Particle>,
}

impl ParticleBank {
    pub fn new() -> Self {
        ParticleBank {
            queue: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ParticleBank {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Bank a particle; ownership moves to the bank.
    pub fn push(&mut self, particle: Particle) {
        self.queue.push_back(particle);
    }

    /// Next particle for transport, or None if the bank is empty
    pub fn pop_particle(&mut self) -> Option<Particle> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.queue.iter()
    }
}
