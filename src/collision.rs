use std::collections::HashMap;
use std::sync::Arc;

use crate::bank::ParticleBank;
use crate::config::CollisionConfig;
use crate::error::{check_energy, CollisionResult};
use crate::material::Material;
use crate::particle::{Particle, ParticleType};
use crate::random::RandomSource;
use crate::reaction::ReactionType;

/// Geometry cell identifier.
pub type CellId = u64;

/// What happened at a collision site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// The cell offers no cross section to this particle type; nothing changed.
    VoidMaterial,
    Reacted {
        reaction_type: ReactionType,
        atomic_number: u32,
    },
}

impl CollisionOutcome {
    pub fn is_void(&self) -> bool {
        matches!(self, CollisionOutcome::VoidMaterial)
    }
}

/// Dispatches collisions in the materials filling each cell.
///
/// Materials are shared read-only; the only state touched by `collide` is
/// the particle, the caller's bank and the caller's random source, so one
/// handler can serve many histories at once.
#[derive(Debug, Clone, Default)]
pub struct CollisionHandler {
    materials: HashMap<CellId, Arc<Material>>,
    config: CollisionConfig,
}

impl CollisionHandler {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            materials: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Fill `cell` with `material`, replacing any previous filling.
    pub fn add_material(&mut self, cell: CellId, material: Arc<Material>) {
        log::debug!(
            "Cell {} filled with material {} ({})",
            cell,
            material.id(),
            material.name().unwrap_or("unnamed")
        );
        self.materials.insert(cell, material);
    }

    pub fn material(&self, cell: CellId) -> Option<&Arc<Material>> {
        self.materials.get(&cell)
    }

    pub fn is_cell_void(&self, cell: CellId) -> bool {
        !self.materials.contains_key(&cell)
    }

    /// True when nothing in `cell` interacts with `particle_type` at `energy`.
    pub fn is_cell_void_for(&self, cell: CellId, particle_type: ParticleType, energy: f64) -> CollisionResult<bool> {
        Ok(self.macroscopic_cross_section(cell, particle_type, energy)? <= 0.0)
    }

    /// Macroscopic total cross section (1/cm); zero in an empty cell.
    pub fn macroscopic_cross_section(
        &self,
        cell: CellId,
        particle_type: ParticleType,
        energy: f64,
    ) -> CollisionResult<f64> {
        check_energy(energy)?;
        match self.materials.get(&cell) {
            Some(material) => material.macroscopic_cross_section(particle_type, energy),
            None => Ok(0.0),
        }
    }

    pub fn macroscopic_reaction_cross_section(
        &self,
        cell: CellId,
        energy: f64,
        reaction_type: ReactionType,
    ) -> CollisionResult<f64> {
        check_energy(energy)?;
        match self.materials.get(&cell) {
            Some(material) => material.macroscopic_reaction_cross_section(energy, reaction_type),
            None => Ok(0.0),
        }
    }

    /// Select a reaction in `cell` and apply it to `particle`.
    ///
    /// One random number selects the reaction; the reaction draws the rest.
    /// A particle whose energy ends at or below its cutoff is flagged gone but
    /// stays with the caller. A void cell consumes no random numbers.
    pub fn collide<R: RandomSource + ?Sized>(
        &self,
        cell: CellId,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> CollisionResult<CollisionOutcome> {
        check_energy(particle.energy)?;
        let material = match self.materials.get(&cell) {
            Some(material) => material,
            None => {
                log::trace!("Cell {} is empty, {} passes through", cell, particle.particle_type);
                return Ok(CollisionOutcome::VoidMaterial);
            }
        };
        if material.macroscopic_cross_section(particle.particle_type, particle.energy)? <= 0.0 {
            log::trace!(
                "Material {} is void for a {} at {} MeV",
                material.id(),
                particle.particle_type,
                particle.energy
            );
            return Ok(CollisionOutcome::VoidMaterial);
        }

        let random_number = rng.random_number();
        let (atom, reaction) =
            match material.sample_reaction(particle.particle_type, particle.energy, random_number)? {
                Some(selected) => selected,
                None => return Ok(CollisionOutcome::VoidMaterial),
            };
        reaction.react(particle, bank, rng)?;

        if !particle.is_gone() && particle.energy <= self.config.cutoff_energy(particle.particle_type) {
            log::trace!(
                "{} at {} MeV fell below its cutoff energy",
                particle.particle_type,
                particle.energy
            );
            particle.set_as_gone();
        }

        Ok(CollisionOutcome::Reacted {
            reaction_type: reaction.reaction_type(),
            atomic_number: atom.atomic_number(),
        })
    }
}
