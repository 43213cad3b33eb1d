// Run-time options for building and driving the collision models
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bremsstrahlung::BremsstrahlungAngularModel;
use crate::elastic::CoupledSamplingMethod;
use crate::error::{CollisionError, CollisionResult};
use crate::interpolation::TwoDInterpolation;
use crate::particle::ParticleType;
use crate::policy::{GridSampling, InterpolationPolicy};

/// How electron elastic scattering is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElasticMode {
    /// Cutoff distribution joined to a screened-Rutherford tail sharing one CDF
    #[default]
    Coupled,
    /// Region picked from the cutoff ratio, tail uses the Moliere screening constant
    Decoupled,
    /// Region picked from the cutoff and moment-preserving cross sections
    Hybrid,
    /// Cutoff distribution alone, no forward tail
    Cutoff,
}

impl std::fmt::Display for ElasticMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElasticMode::Coupled => "Coupled",
            ElasticMode::Decoupled => "Decoupled",
            ElasticMode::Hybrid => "Hybrid",
            ElasticMode::Cutoff => "Cutoff",
        };
        write!(f, "{}", name)
    }
}

/// Configuration container for the collision core.
///
/// The configuration is an explicit value handed to the model factory and to
/// the collision handler. Every field has a default, so a JSON document only
/// needs to name the options it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollisionConfig {
    /// Electrons at or below this energy (MeV) are flagged gone after a collision
    pub electron_cutoff_energy: f64,
    /// Photons at or below this energy (MeV) are flagged gone after a collision
    pub photon_cutoff_energy: f64,
    /// Positrons at or below this energy (MeV) are flagged gone after a collision
    pub positron_cutoff_energy: f64,
    pub elastic_mode: ElasticMode,
    /// Bin combination used by the coupled elastic model
    pub coupled_sampling: CoupledSamplingMethod,
    /// Sampling discipline for energy-loss grids and the elastic cutoff grid
    pub grid_sampling: GridSampling,
    /// Axis processing for energy-loss grids (bremsstrahlung, electroionization)
    pub grid_interpolation: TwoDInterpolation,
    /// Axis processing for the elastic cutoff grid
    pub elastic_interpolation: TwoDInterpolation,
    pub bremsstrahlung_angular: BremsstrahlungAngularModel,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            electron_cutoff_energy: 1e-4,
            photon_cutoff_energy: 1e-3,
            positron_cutoff_energy: 1e-4,
            elastic_mode: ElasticMode::default(),
            coupled_sampling: CoupledSamplingMethod::default(),
            grid_sampling: GridSampling::default(),
            grid_interpolation: TwoDInterpolation::LogLogLog,
            elastic_interpolation: TwoDInterpolation::LinLinLog,
            bremsstrahlung_angular: BremsstrahlungAngularModel::default(),
        }
    }
}

impl CollisionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> CollisionResult<Self> {
        let config: CollisionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> CollisionResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        log::debug!("Loading collision configuration from {}", path.as_ref().display());
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> CollisionResult<()> {
        for (label, value) in [
            ("electron_cutoff_energy", self.electron_cutoff_energy),
            ("photon_cutoff_energy", self.photon_cutoff_energy),
            ("positron_cutoff_energy", self.positron_cutoff_energy),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CollisionError::Config(format!(
                    "{} must be finite and non-negative, got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }

    /// Energy floor for `particle_type`; neutrons have none.
    pub fn cutoff_energy(&self, particle_type: ParticleType) -> f64 {
        match particle_type {
            ParticleType::Electron => self.electron_cutoff_energy,
            ParticleType::Photon => self.photon_cutoff_energy,
            ParticleType::Positron => self.positron_cutoff_energy,
            ParticleType::Neutron => 0.0,
        }
    }

    /// Policy for bremsstrahlung and electroionization grids
    pub fn energy_loss_policy(&self) -> InterpolationPolicy {
        InterpolationPolicy::new(self.grid_sampling, self.grid_interpolation)
    }

    /// Policy for the elastic cutoff grid
    pub fn elastic_policy(&self) -> InterpolationPolicy {
        InterpolationPolicy::new(self.grid_sampling, self.elastic_interpolation)
    }
}
