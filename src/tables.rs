// Input tables handed over by a data-loading layer, and the factory that turns
// them into an `Atom` with every reaction channel assembled.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bremsstrahlung::BremsstrahlungDistribution;
use crate::config::{CollisionConfig, ElasticMode};
use crate::distribution::TabularDistribution;
use crate::elastic::{CompositeElasticModel, ElasticDiscipline};
use crate::error::{CollisionError, CollisionResult};
use crate::excitation::AtomicExcitationDistribution;
use crate::grid::{GridBin, TwoDGrid};
use crate::incoherent::IncoherentPhotonDistribution;
use crate::interpolation::{InterpolationScheme, TabulatedFunction};
use crate::ionization::ElectroionizationSubshellDistribution;
use crate::material::Atom;
use crate::particle::ParticleType;
use crate::policy::InterpolationPolicy;
use crate::reaction::{CrossSection, Reaction, ReactionType};
use crate::scattering::{AbsorptionDistribution, ElasticScattering, ScatteringModel};
use crate::two_d::TwoDDistribution;

/// Cross section values on the owning energy grid, starting at `threshold_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionData {
    pub values: Vec<f64>,
    #[serde(default)]
    pub threshold_index: usize,
}

/// One outgoing-variable table at a given incoming energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedBinData {
    pub energy: f64,
    pub outgoing: Vec<f64>,
    pub pdf: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedGridData {
    pub bins: Vec<TabulatedBinData>,
    #[serde(default)]
    pub scheme: InterpolationScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticData {
    pub cutoff_cosine: f64,
    pub cutoff_cross_section: CrossSectionData,
    pub total_cross_section: CrossSectionData,
    #[serde(default)]
    pub moment_preserving_cross_section: Option<CrossSectionData>,
    /// Angle cosines on [-1, μ_c] per incoming energy
    pub cutoff_distribution: TabulatedGridData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BremsstrahlungData {
    pub cross_section: CrossSectionData,
    pub photon_energy: TabulatedGridData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonizationSubshellData {
    pub subshell: u32,
    pub binding_energy: f64,
    pub cross_section: CrossSectionData,
    pub knock_on_energy: TabulatedGridData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcitationData {
    pub cross_section: CrossSectionData,
    pub energy_loss_energies: Vec<f64>,
    pub energy_loss: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoatomicData {
    pub energy_grid: Vec<f64>,
    #[serde(default)]
    pub incoherent_cross_section: Option<CrossSectionData>,
    #[serde(default)]
    pub photoelectric_cross_section: Option<CrossSectionData>,
    #[serde(default)]
    pub photoelectron_binding_energy: Option<f64>,
}

/// Everything needed to build one atom's reactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomData {
    pub name: String,
    pub atomic_number: u32,
    #[serde(default)]
    pub electron_energy_grid: Vec<f64>,
    #[serde(default)]
    pub elastic: Option<ElasticData>,
    #[serde(default)]
    pub bremsstrahlung: Option<BremsstrahlungData>,
    #[serde(default)]
    pub ionization: Vec<IonizationSubshellData>,
    #[serde(default)]
    pub excitation: Option<ExcitationData>,
    #[serde(default)]
    pub photoatomic: Option<PhotoatomicData>,
}

impl AtomData {
    pub fn from_json_str(json: &str) -> CollisionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> CollisionResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        log::debug!("Reading atom tables from {}", path.as_ref().display());
        Self::from_json_str(&contents)
    }
}

impl TabulatedGridData {
    fn build(&self, policy: InterpolationPolicy) -> CollisionResult<TwoDDistribution> {
        let bins = self
            .bins
            .iter()
            .map(|bin| {
                let distribution = TabularDistribution::from_pdf(bin.outgoing.clone(), bin.pdf.clone(), self.scheme)?;
                Ok(GridBin::new(bin.energy, distribution))
            })
            .collect::<CollisionResult<Vec<_>>>()?;
        TwoDDistribution::new(TwoDGrid::new(bins)?, policy)
    }
}

impl CrossSectionData {
    fn build(&self, energies: &Arc<Vec<f64>>) -> CollisionResult<CrossSection> {
        CrossSection::new(
            Arc::clone(energies),
            self.values.clone(),
            self.threshold_index,
            InterpolationScheme::LinLin,
        )
    }
}

/// Assemble an atom from its tables, with reactions ordered elastic,
/// bremsstrahlung, electroionization by subshell, excitation, then photon
/// channels. A positron void channel is always appended.
pub fn build_atom(data: &AtomData, number_density: f64, config: &CollisionConfig) -> CollisionResult<Atom> {
    config.validate()?;
    let mut atom = Atom::new(data.name.clone(), data.atomic_number, number_density)?;
    let electron_grid = Arc::new(data.electron_energy_grid.clone());

    if let Some(elastic) = &data.elastic {
        atom.add_reaction(build_elastic(elastic, data.atomic_number, &electron_grid, config)?);
    }

    if let Some(bremsstrahlung) = &data.bremsstrahlung {
        let photon_energy = bremsstrahlung.photon_energy.build(config.energy_loss_policy())?;
        atom.add_reaction(Reaction::new(
            ReactionType::Bremsstrahlung,
            bremsstrahlung.cross_section.build(&electron_grid)?,
            ScatteringModel::Bremsstrahlung(BremsstrahlungDistribution::new(
                photon_energy,
                config.bremsstrahlung_angular,
            )?),
        ));
    }

    let mut subshells: Vec<&IonizationSubshellData> = data.ionization.iter().collect();
    subshells.sort_by_key(|shell| shell.subshell);
    for shell in subshells {
        let knock_on = shell.knock_on_energy.build(config.energy_loss_policy())?;
        atom.add_reaction(Reaction::new(
            ReactionType::Electroionization {
                subshell: shell.subshell,
            },
            shell.cross_section.build(&electron_grid)?,
            ScatteringModel::Electroionization(ElectroionizationSubshellDistribution::new(
                knock_on,
                shell.binding_energy,
            )?),
        ));
    }

    if let Some(excitation) = &data.excitation {
        let loss = TabulatedFunction::new(
            excitation.energy_loss_energies.clone(),
            excitation.energy_loss.clone(),
            InterpolationScheme::LinLin,
        )?;
        atom.add_reaction(Reaction::new(
            ReactionType::AtomicExcitation,
            excitation.cross_section.build(&electron_grid)?,
            ScatteringModel::AtomicExcitation(AtomicExcitationDistribution::new(loss)),
        ));
    }

    if let Some(photoatomic) = &data.photoatomic {
        let photon_grid = Arc::new(photoatomic.energy_grid.clone());
        if let Some(incoherent) = &photoatomic.incoherent_cross_section {
            atom.add_reaction(Reaction::new(
                ReactionType::IncoherentPhoton,
                incoherent.build(&photon_grid)?,
                ScatteringModel::Incoherent(IncoherentPhotonDistribution::new()),
            ));
        }
        if let Some(photoelectric) = &photoatomic.photoelectric_cross_section {
            atom.add_reaction(Reaction::new(
                ReactionType::PhotoelectricAbsorption,
                photoelectric.build(&photon_grid)?,
                ScatteringModel::Absorption(AbsorptionDistribution::new(photoatomic.photoelectron_binding_energy)),
            ));
        }
    }

    atom.add_reaction(Reaction::void(ParticleType::Positron));
    log::debug!(
        "Built atom {} (Z = {}) with {} reactions",
        atom.name(),
        atom.atomic_number(),
        atom.reactions().len()
    );
    Ok(atom)
}

fn build_elastic(
    data: &ElasticData,
    atomic_number: u32,
    grid: &Arc<Vec<f64>>,
    config: &CollisionConfig,
) -> CollisionResult<Reaction> {
    let cutoff = data.cutoff_distribution.build(config.elastic_policy())?;
    let cutoff_xs = data.cutoff_cross_section.build(grid)?;
    let total_xs = data.total_cross_section.build(grid)?;

    let (model, cross_section) = match config.elastic_mode {
        ElasticMode::Cutoff => (ElasticScattering::Cutoff(cutoff), cutoff_xs),
        ElasticMode::Coupled => {
            let discipline = ElasticDiscipline::Coupled {
                cutoff_ratios: cutoff_ratios(grid, &cutoff_xs, &total_xs)?,
                method: config.coupled_sampling,
            };
            let model = CompositeElasticModel::new(cutoff, data.cutoff_cosine, atomic_number, discipline)?;
            (ElasticScattering::Composite(model), total_xs)
        }
        ElasticMode::Decoupled => {
            let discipline = ElasticDiscipline::Decoupled {
                cutoff_ratios: cutoff_ratios(grid, &cutoff_xs, &total_xs)?,
            };
            let model = CompositeElasticModel::new(cutoff, data.cutoff_cosine, atomic_number, discipline)?;
            (ElasticScattering::Composite(model), total_xs)
        }
        ElasticMode::Hybrid => {
            let moment_preserving = data
                .moment_preserving_cross_section
                .as_ref()
                .ok_or_else(|| {
                    CollisionError::InvalidGrid(
                        "hybrid elastic scattering needs a moment-preserving cross section".to_string(),
                    )
                })?
                .build(grid)?;
            let discipline = ElasticDiscipline::Hybrid {
                cutoff_cross_section: on_grid(grid, &cutoff_xs)?,
                moment_preserving_cross_section: on_grid(grid, &moment_preserving)?,
            };
            let summed = summed_cross_section(grid, &cutoff_xs, &moment_preserving)?;
            let model = CompositeElasticModel::new(cutoff, data.cutoff_cosine, atomic_number, discipline)?;
            (ElasticScattering::Composite(model), summed)
        }
    };
    Ok(Reaction::new(
        ReactionType::ElectronElastic,
        cross_section,
        ScatteringModel::Elastic(model),
    ))
}

fn on_grid(grid: &[f64], xs: &CrossSection) -> CollisionResult<TabulatedFunction> {
    TabulatedFunction::new(
        grid.to_vec(),
        grid.iter().map(|&e| xs.evaluate(e)).collect(),
        InterpolationScheme::LinLin,
    )
}

/// σ_cutoff/σ_total on the grid; 1 where the total vanishes.
fn cutoff_ratios(grid: &[f64], cutoff: &CrossSection, total: &CrossSection) -> CollisionResult<TabulatedFunction> {
    let ratios = grid
        .iter()
        .map(|&e| {
            let total = total.evaluate(e);
            if total > 0.0 {
                (cutoff.evaluate(e) / total).clamp(0.0, 1.0)
            } else {
                1.0
            }
        })
        .collect();
    TabulatedFunction::new(grid.to_vec(), ratios, InterpolationScheme::LinLin)
}

fn summed_cross_section(grid: &Arc<Vec<f64>>, a: &CrossSection, b: &CrossSection) -> CollisionResult<CrossSection> {
    let threshold = a.threshold_index().min(b.threshold_index());
    let value_at = |xs: &CrossSection, i: usize| {
        if i < xs.threshold_index() {
            0.0
        } else {
            xs.values()[i - xs.threshold_index()]
        }
    };
    let values = (threshold..grid.len())
        .map(|i| value_at(a, i) + value_at(b, i))
        .collect();
    CrossSection::new(Arc::clone(grid), values, threshold, InterpolationScheme::LinLin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::GridSampling;
    use crate::random::FixedSequence;
    use crate::bank::ParticleBank;
    use crate::particle::Particle;
    use approx::assert_relative_eq;

    const MU_C: f64 = 0.999999;

    fn angular_bin(energy: f64, forward: f64) -> TabulatedBinData {
        TabulatedBinData {
            energy,
            outgoing: vec![-1.0, 0.0, 0.9, MU_C],
            pdf: vec![0.01, 0.1, 10.0, forward],
        }
    }

    fn loss_bin(energy: f64, max: f64) -> TabulatedBinData {
        TabulatedBinData {
            energy,
            outgoing: vec![1e-4, max],
            pdf: vec![2.0, 1.0],
        }
    }

    fn atom_data() -> AtomData {
        AtomData {
            name: "Au".to_string(),
            atomic_number: 79,
            electron_energy_grid: vec![1.0, 10.0, 100.0],
            elastic: Some(ElasticData {
                cutoff_cosine: MU_C,
                cutoff_cross_section: CrossSectionData {
                    values: vec![3.0, 2.0, 1.0],
                    threshold_index: 0,
                },
                total_cross_section: CrossSectionData {
                    values: vec![10.0, 10.0, 10.0],
                    threshold_index: 0,
                },
                moment_preserving_cross_section: Some(CrossSectionData {
                    values: vec![1.0, 1.0],
                    threshold_index: 1,
                }),
                cutoff_distribution: TabulatedGridData {
                    bins: vec![angular_bin(1.0, 1000.0), angular_bin(100.0, 5000.0)],
                    scheme: InterpolationScheme::LinLin,
                },
            }),
            bremsstrahlung: Some(BremsstrahlungData {
                cross_section: CrossSectionData {
                    values: vec![0.5, 0.5, 0.5],
                    threshold_index: 0,
                },
                photon_energy: TabulatedGridData {
                    bins: vec![loss_bin(1.0, 1.0), loss_bin(100.0, 100.0)],
                    scheme: InterpolationScheme::LinLin,
                },
            }),
            ionization: vec![
                IonizationSubshellData {
                    subshell: 2,
                    binding_energy: 0.01,
                    cross_section: CrossSectionData {
                        values: vec![0.2, 0.2],
                        threshold_index: 1,
                    },
                    knock_on_energy: TabulatedGridData {
                        bins: vec![loss_bin(1.0, 0.495), loss_bin(100.0, 49.995)],
                        scheme: InterpolationScheme::LinLin,
                    },
                },
                IonizationSubshellData {
                    subshell: 1,
                    binding_energy: 0.08,
                    cross_section: CrossSectionData {
                        values: vec![0.1, 0.1, 0.1],
                        threshold_index: 0,
                    },
                    knock_on_energy: TabulatedGridData {
                        bins: vec![loss_bin(1.0, 0.46), loss_bin(100.0, 49.96)],
                        scheme: InterpolationScheme::LinLin,
                    },
                },
            ],
            excitation: Some(ExcitationData {
                cross_section: CrossSectionData {
                    values: vec![1.0, 1.0, 1.0],
                    threshold_index: 0,
                },
                energy_loss_energies: vec![1.0, 100.0],
                energy_loss: vec![1e-5, 2e-5],
            }),
            photoatomic: Some(PhotoatomicData {
                energy_grid: vec![1e-3, 1.0, 10.0],
                incoherent_cross_section: Some(CrossSectionData {
                    values: vec![1.0, 2.0, 1.0],
                    threshold_index: 0,
                }),
                photoelectric_cross_section: Some(CrossSectionData {
                    values: vec![5.0, 0.1, 0.01],
                    threshold_index: 0,
                }),
                photoelectron_binding_energy: Some(0.08),
            }),
        }
    }

    fn config(mode: ElasticMode) -> CollisionConfig {
        CollisionConfig {
            elastic_mode: mode,
            ..CollisionConfig::default()
        }
    }

    #[test]
    fn test_build_atom_reaction_order() {
        let atom = build_atom(&atom_data(), 0.059, &CollisionConfig::default()).unwrap();
        let types: Vec<ReactionType> = atom.reactions().iter().map(|r| r.reaction_type()).collect();
        assert_eq!(
            types,
            vec![
                ReactionType::ElectronElastic,
                ReactionType::Bremsstrahlung,
                ReactionType::Electroionization { subshell: 1 },
                ReactionType::Electroionization { subshell: 2 },
                ReactionType::AtomicExcitation,
                ReactionType::IncoherentPhoton,
                ReactionType::PhotoelectricAbsorption,
                ReactionType::VoidAbsorption(ParticleType::Positron),
            ]
        );
        assert_eq!(atom.number_density(), 0.059);
        assert_eq!(atom.atomic_number(), 79);
    }

    #[test]
    fn test_elastic_cross_section_per_mode() {
        let xs_at = |mode: ElasticMode, energy: f64| {
            let atom = build_atom(&atom_data(), 1.0, &config(mode)).unwrap();
            atom.reactions()[0].cross_section_at(energy)
        };
        assert_relative_eq!(xs_at(ElasticMode::Coupled, 10.0), 10.0);
        assert_relative_eq!(xs_at(ElasticMode::Decoupled, 10.0), 10.0);
        assert_relative_eq!(xs_at(ElasticMode::Cutoff, 10.0), 2.0);
        assert_relative_eq!(xs_at(ElasticMode::Hybrid, 10.0), 3.0);
        // below the moment-preserving threshold only the cutoff part remains
        assert_relative_eq!(xs_at(ElasticMode::Hybrid, 1.0), 3.0);
        assert_relative_eq!(xs_at(ElasticMode::Hybrid, 100.0), 2.0);
    }

    #[test]
    fn test_coupled_cutoff_probability_from_ratio() {
        let atom = build_atom(&atom_data(), 1.0, &CollisionConfig::default()).unwrap();
        match atom.reactions()[0].distribution() {
            ScatteringModel::Elastic(ElasticScattering::Composite(model)) => {
                assert_relative_eq!(model.cutoff_probability(1.0).unwrap(), 0.3);
                assert_relative_eq!(model.cutoff_probability(100.0).unwrap(), 0.1);
            }
            other => panic!("unexpected elastic model {:?}", other),
        }
    }

    #[test]
    fn test_hybrid_needs_moment_preserving_table() {
        let mut data = atom_data();
        if let Some(elastic) = data.elastic.as_mut() {
            elastic.moment_preserving_cross_section = None;
        }
        assert!(matches!(
            build_atom(&data, 1.0, &config(ElasticMode::Hybrid)),
            Err(CollisionError::InvalidGrid(_))
        ));
        assert!(build_atom(&data, 1.0, &config(ElasticMode::Coupled)).is_ok());
    }

    #[test]
    fn test_malformed_tables_rejected() {
        let mut data = atom_data();
        data.electron_energy_grid = vec![1.0, 0.5, 100.0];
        assert!(matches!(
            build_atom(&data, 1.0, &CollisionConfig::default()),
            Err(CollisionError::InvalidGrid(_))
        ));

        let mut data = atom_data();
        if let Some(bremsstrahlung) = data.bremsstrahlung.as_mut() {
            bremsstrahlung.cross_section.values.pop();
        }
        assert!(build_atom(&data, 1.0, &CollisionConfig::default()).is_err());
    }

    #[test]
    fn test_policy_follows_config() {
        let mut config = CollisionConfig::default();
        config.grid_sampling = GridSampling::UnitBase;
        let atom = build_atom(&atom_data(), 1.0, &config).unwrap();
        match atom.reactions()[1].distribution() {
            ScatteringModel::Bremsstrahlung(model) => {
                assert_eq!(model.photon_energy_distribution().policy().sampling, GridSampling::UnitBase);
            }
            other => panic!("unexpected bremsstrahlung model {:?}", other),
        }
    }

    #[test]
    fn test_built_excitation_reacts() {
        let atom = build_atom(&atom_data(), 1.0, &CollisionConfig::default()).unwrap();
        let excitation = &atom.reactions()[4];
        let mut electron = Particle::new(ParticleType::Electron, [0.0; 3], [0.0, 0.0, 1.0], 1.0);
        let mut bank = ParticleBank::new();
        let mut rng = FixedSequence::new(vec![]);
        excitation.react(&mut electron, &mut bank, &mut rng).unwrap();
        assert_relative_eq!(electron.energy, 1.0 - 1e-5);
    }

    #[test]
    fn test_atom_data_json() {
        let json = serde_json::to_string(&atom_data()).unwrap();
        assert_eq!(AtomData::from_json_str(&json).unwrap(), atom_data());

        let minimal = AtomData::from_json_str(r#"{ "name": "H", "atomic_number": 1 }"#).unwrap();
        assert!(minimal.elastic.is_none());
        let atom = build_atom(&minimal, 1.0, &CollisionConfig::default()).unwrap();
        assert_eq!(atom.reactions().len(), 1);
        assert!(AtomData::from_json_str("{").is_err());
    }
}
