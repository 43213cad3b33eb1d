use crate::error::{check_energy, check_random_number, CollisionError, CollisionResult};
use crate::particle::ParticleType;
use crate::reaction::{Reaction, ReactionType};

/// One constituent of a material with its ordered reaction channels.
#[derive(Debug, Clone)]
pub struct Atom {
    name: String,
    atomic_number: u32,
    /// atoms/(barn·cm)
    number_density: f64,
    reactions: Vec<Reaction>,
}

impl Atom {
    pub fn new(name: impl Into<String>, atomic_number: u32, number_density: f64) -> CollisionResult<Self> {
        if !number_density.is_finite() || number_density < 0.0 {
            return Err(CollisionError::Domain(format!(
                "number density must be finite and non-negative, got {}",
                number_density
            )));
        }
        Ok(Self {
            name: name.into(),
            atomic_number,
            number_density,
            reactions: Vec::new(),
        })
    }

    pub fn with_reactions(mut self, reactions: Vec<Reaction>) -> Self {
        self.reactions = reactions;
        self
    }

    pub fn add_reaction(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn number_density(&self) -> f64 {
        self.number_density
    }

    pub fn set_number_density(&mut self, number_density: f64) {
        self.number_density = number_density;
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Summed microscopic cross section (barns) of the channels open to `particle_type`
    pub fn microscopic_cross_section(&self, particle_type: ParticleType, energy: f64) -> f64 {
        self.reactions
            .iter()
            .filter(|r| r.incident_particle() == particle_type)
            .map(|r| r.cross_section_at(energy))
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    id: u32,
    name: Option<String>,
    atoms: Vec<Atom>,
}

impl Material {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: None,
            atoms: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_atom(mut self, atom: Atom) -> Self {
        self.atoms.push(atom);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Weighted channels open to `particle_type`, in atom then reaction order.
    fn channels(&self, particle_type: ParticleType, energy: f64) -> impl Iterator<Item = (&Atom, &Reaction, f64)> {
        self.atoms.iter().flat_map(move |atom| {
            atom.reactions
                .iter()
                .filter(move |r| r.incident_particle() == particle_type)
                .map(move |r| (atom, r, atom.number_density * r.cross_section_at(energy)))
        })
    }

    /// Macroscopic total cross section (1/cm) seen by `particle_type`.
    pub fn macroscopic_cross_section(&self, particle_type: ParticleType, energy: f64) -> CollisionResult<f64> {
        check_energy(energy)?;
        Ok(self.channels(particle_type, energy).map(|(_, _, xs)| xs).sum())
    }

    /// Macroscopic cross section (1/cm) of one reaction type summed over atoms.
    pub fn macroscopic_reaction_cross_section(&self, energy: f64, reaction_type: ReactionType) -> CollisionResult<f64> {
        check_energy(energy)?;
        Ok(self
            .atoms
            .iter()
            .flat_map(|atom| {
                atom.reactions
                    .iter()
                    .filter(move |r| r.reaction_type() == reaction_type)
                    .map(move |r| atom.number_density * r.cross_section_at(energy))
            })
            .sum())
    }

    /// Pick the channel at which the running sum of macroscopic cross
    /// sections first reaches `random_number * total`. Channels with zero
    /// cross section are never selected. Returns `None` when nothing is open.
    pub fn sample_reaction(
        &self,
        particle_type: ParticleType,
        energy: f64,
        random_number: f64,
    ) -> CollisionResult<Option<(&Atom, &Reaction)>> {
        check_energy(energy)?;
        check_random_number(random_number)?;

        let open: Vec<(&Atom, &Reaction, f64)> = self
            .channels(particle_type, energy)
            .filter(|(_, _, xs)| *xs > 0.0)
            .collect();
        let total: f64 = open.iter().map(|(_, _, xs)| xs).sum();
        if open.is_empty() || total <= 0.0 {
            return Ok(None);
        }

        let target = random_number * total;
        let mut accum = 0.0;
        for &(atom, reaction, xs) in &open {
            accum += xs;
            if accum >= target {
                log::trace!(
                    "Selected {} on {} at {} MeV (xi = {})",
                    reaction.reaction_type(),
                    atom.name,
                    energy,
                    random_number
                );
                return Ok(Some((atom, reaction)));
            }
        }
        // round-off left the running sum short of the target
        Ok(open.last().map(|&(atom, reaction, _)| (atom, reaction)))
    }
}
