// Collision and tabular-sampling core for coupled electron-photon transport.
// Energies are in MeV, cross sections in barns.
pub mod bank;
pub mod bremsstrahlung;
pub mod collision;
pub mod config;
pub mod constants;
pub mod distribution;
pub mod elastic;
pub mod error;
pub mod excitation;
pub mod grid;
pub mod incoherent;
pub mod interpolation;
pub mod ionization;
pub mod material;
pub mod particle;
pub mod policy;
pub mod random;
pub mod reaction;
pub mod scattering;
pub mod screened_rutherford;
pub mod tables;
pub mod two_d;

pub use bank::ParticleBank;
pub use bremsstrahlung::{BremsstrahlungAngularModel, BremsstrahlungDistribution};
pub use collision::{CellId, CollisionHandler, CollisionOutcome};
pub use config::{CollisionConfig, ElasticMode};
pub use distribution::{OneDDistribution, TabularDistribution, UnivariateDistribution};
pub use elastic::{CompositeElasticModel, CoupledSamplingMethod, ElasticDiscipline};
pub use error::{CollisionError, CollisionResult};
pub use excitation::AtomicExcitationDistribution;
pub use grid::{Bracket, GridBin, TwoDGrid};
pub use incoherent::IncoherentPhotonDistribution;
pub use interpolation::{AxisScale, InterpolationScheme, TabulatedFunction, TwoDInterpolation};
pub use ionization::ElectroionizationSubshellDistribution;
pub use material::{Atom, Material};
pub use particle::{Particle, ParticleType};
pub use policy::{GridSampling, InterpolationPolicy};
pub use random::{FixedSequence, RandomSource};
pub use reaction::{CrossSection, Reaction, ReactionType};
pub use scattering::{AbsorptionDistribution, ElasticScattering, ScatteringDistribution, ScatteringModel};
pub use screened_rutherford::{moliere_screening_constant, ScreenedRutherfordDistribution};
pub use tables::{build_atom, AtomData};
pub use two_d::{SecondaryLimits, TwoDDistribution};
